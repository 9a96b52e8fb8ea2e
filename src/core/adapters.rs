//! Value adapters
//!
//! Thin wrappers that let plain values — text, integers, floats, vectors,
//! colours — participate as objects in the containers and the diff
//! engine: they carry equality, a display name and field-level diff
//! printing. Field printing follows the report format
//! `label: old -> new` with a numeric delta where one is meaningful.

use approx::abs_diff_eq;
use nalgebra::Vector3;

use super::object::{Comparable, CoreObject, DiffPrintable, Displayable, ObjectRef};
use crate::diff::DiffOperation;

/// Comparison tolerance for floating-point adapter values.
pub const VALUE_EPSILON: f64 = 1e-9;

/// Prints one integer field of a diff step.
pub fn print_int_field(operation: DiffOperation, label: &str, left: i64, right: i64) {
    match operation {
        DiffOperation::Add | DiffOperation::Delete => println!("  {label}: {left}"),
        DiffOperation::Modified => {
            if left != right {
                println!("  {label}: {left} -> {right} delta: {}", right - left);
            }
        }
        DiffOperation::Equal => {}
    }
}

/// Prints one floating-point field of a diff step.
pub fn print_float_field(operation: DiffOperation, label: &str, left: f64, right: f64) {
    match operation {
        DiffOperation::Add | DiffOperation::Delete => println!("  {label}: {left}"),
        DiffOperation::Modified => {
            if !abs_diff_eq!(left, right, epsilon = VALUE_EPSILON) {
                println!("  {label}: {left} -> {right} delta: {}", right - left);
            }
        }
        DiffOperation::Equal => {}
    }
}

/// Prints one text field of a diff step.
pub fn print_text_field(operation: DiffOperation, label: &str, left: &str, right: &str) {
    match operation {
        DiffOperation::Add | DiffOperation::Delete => println!("  {label}: {left}"),
        DiffOperation::Modified => {
            if left != right {
                println!("  {label}: {left} -> {right}");
            }
        }
        DiffOperation::Equal => {}
    }
}

/// A text value wrapped as an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextValue {
    text: String,
}

impl TextValue {
    /// Creates a text value.
    pub fn new(text: impl Into<String>) -> Self {
        TextValue { text: text.into() }
    }

    /// Creates a counted handle directly.
    pub fn shared(text: impl Into<String>) -> ObjectRef {
        ObjectRef::new(Self::new(text))
    }

    /// The wrapped text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Comparable for TextValue {
    fn equals(&self, other: &dyn CoreObject) -> bool {
        other
            .as_any()
            .downcast_ref::<TextValue>()
            .map(|o| o.text == self.text)
            .unwrap_or(false)
    }
}

impl Displayable for TextValue {
    fn display_name(&self) -> String {
        self.text.clone()
    }
}

impl DiffPrintable for TextValue {
    fn print_diff_info(&self, operation: DiffOperation, other: Option<&dyn CoreObject>) {
        let right = other
            .and_then(|o| o.as_any().downcast_ref::<TextValue>())
            .map(|o| o.text.as_str())
            .unwrap_or("");
        print_text_field(operation, "text", &self.text, right);
    }
}

/// An integer value wrapped as an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntValue {
    value: i64,
}

impl IntValue {
    /// Creates an integer value.
    pub fn new(value: i64) -> Self {
        IntValue { value }
    }

    /// Creates a counted handle directly.
    pub fn shared(value: i64) -> ObjectRef {
        ObjectRef::new(Self::new(value))
    }

    /// The wrapped number.
    pub fn value(&self) -> i64 {
        self.value
    }
}

impl Comparable for IntValue {
    fn equals(&self, other: &dyn CoreObject) -> bool {
        other
            .as_any()
            .downcast_ref::<IntValue>()
            .map(|o| o.value == self.value)
            .unwrap_or(false)
    }
}

impl Displayable for IntValue {
    fn display_name(&self) -> String {
        self.value.to_string()
    }
}

impl DiffPrintable for IntValue {
    fn print_diff_info(&self, operation: DiffOperation, other: Option<&dyn CoreObject>) {
        let right = other
            .and_then(|o| o.as_any().downcast_ref::<IntValue>())
            .map(|o| o.value)
            .unwrap_or(0);
        print_int_field(operation, "value", self.value, right);
    }
}

/// A floating-point value wrapped as an object; compared with tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatValue {
    value: f64,
}

impl FloatValue {
    /// Creates a float value.
    pub fn new(value: f64) -> Self {
        FloatValue { value }
    }

    /// Creates a counted handle directly.
    pub fn shared(value: f64) -> ObjectRef {
        ObjectRef::new(Self::new(value))
    }

    /// The wrapped number.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Comparable for FloatValue {
    fn equals(&self, other: &dyn CoreObject) -> bool {
        other
            .as_any()
            .downcast_ref::<FloatValue>()
            .map(|o| abs_diff_eq!(o.value, self.value, epsilon = VALUE_EPSILON))
            .unwrap_or(false)
    }
}

impl Displayable for FloatValue {
    fn display_name(&self) -> String {
        self.value.to_string()
    }
}

impl DiffPrintable for FloatValue {
    fn print_diff_info(&self, operation: DiffOperation, other: Option<&dyn CoreObject>) {
        let right = other
            .and_then(|o| o.as_any().downcast_ref::<FloatValue>())
            .map(|o| o.value)
            .unwrap_or(0.0);
        print_float_field(operation, "value", self.value, right);
    }
}

/// A 3D vector wrapped as an object; compared component-wise with tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorValue {
    vector: Vector3<f64>,
}

impl VectorValue {
    /// Creates a vector value.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        VectorValue {
            vector: Vector3::new(x, y, z),
        }
    }

    /// Creates a counted handle directly.
    pub fn shared(x: f64, y: f64, z: f64) -> ObjectRef {
        ObjectRef::new(Self::new(x, y, z))
    }

    /// The wrapped vector.
    pub fn vector(&self) -> &Vector3<f64> {
        &self.vector
    }
}

impl Comparable for VectorValue {
    fn equals(&self, other: &dyn CoreObject) -> bool {
        other
            .as_any()
            .downcast_ref::<VectorValue>()
            .map(|o| abs_diff_eq!(o.vector, self.vector, epsilon = VALUE_EPSILON))
            .unwrap_or(false)
    }
}

impl Displayable for VectorValue {
    fn display_name(&self) -> String {
        format!(
            "({}, {}, {})",
            self.vector.x, self.vector.y, self.vector.z
        )
    }
}

impl DiffPrintable for VectorValue {
    fn print_diff_info(&self, operation: DiffOperation, other: Option<&dyn CoreObject>) {
        let right = other
            .and_then(|o| o.as_any().downcast_ref::<VectorValue>())
            .map(|o| o.vector)
            .unwrap_or_else(Vector3::zeros);
        print_float_field(operation, "x", self.vector.x, right.x);
        print_float_field(operation, "y", self.vector.y, right.y);
        print_float_field(operation, "z", self.vector.z, right.z);
    }
}

/// An RGBA colour wrapped as an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorValue {
    red: u8,
    green: u8,
    blue: u8,
    alpha: u8,
}

impl ColorValue {
    /// Creates an opaque colour.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::rgba(red, green, blue, 255)
    }

    /// Creates a colour with an explicit alpha component.
    pub fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        ColorValue {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates a counted handle directly.
    pub fn shared(red: u8, green: u8, blue: u8) -> ObjectRef {
        ObjectRef::new(Self::rgb(red, green, blue))
    }

    /// Components as an `(r, g, b, a)` tuple.
    pub fn components(&self) -> (u8, u8, u8, u8) {
        (self.red, self.green, self.blue, self.alpha)
    }
}

impl Comparable for ColorValue {
    fn equals(&self, other: &dyn CoreObject) -> bool {
        other
            .as_any()
            .downcast_ref::<ColorValue>()
            .map(|o| o == self)
            .unwrap_or(false)
    }
}

impl Displayable for ColorValue {
    fn display_name(&self) -> String {
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

impl DiffPrintable for ColorValue {
    fn print_diff_info(&self, operation: DiffOperation, other: Option<&dyn CoreObject>) {
        let right = other
            .and_then(|o| o.as_any().downcast_ref::<ColorValue>())
            .copied()
            .unwrap_or(ColorValue::rgba(0, 0, 0, 0));
        print_int_field(operation, "red", self.red as i64, right.red as i64);
        print_int_field(operation, "green", self.green as i64, right.green as i64);
        print_int_field(operation, "blue", self.blue as i64, right.blue as i64);
        print_int_field(operation, "alpha", self.alpha as i64, right.alpha as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_equality_is_type_aware() {
        let a = TextValue::shared("layer");
        let b = TextValue::shared("layer");
        let c = TextValue::shared("block");
        let n = IntValue::shared(4);
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
        assert!(!a.equals(&n));
    }

    #[test]
    fn float_equality_uses_tolerance() {
        let a = FloatValue::shared(1.0);
        let b = FloatValue::shared(1.0 + 1e-12);
        let c = FloatValue::shared(1.1);
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
    }

    #[test]
    fn vector_equality_is_component_wise() {
        let a = VectorValue::shared(1.0, 2.0, 3.0);
        let b = VectorValue::shared(1.0, 2.0, 3.0);
        let c = VectorValue::shared(1.0, 2.0, 3.5);
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
        assert_eq!(a.display_name(), "(1, 2, 3)");
    }

    #[test]
    fn color_display_name_is_hex() {
        let c = ColorValue::rgb(255, 128, 0);
        assert_eq!(c.display_name(), "#ff8000ff");
    }
}
