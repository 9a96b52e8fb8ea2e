//! Reference-counted object handles
//!
//! Most polymorphic values handed to the containers, the undo manager and
//! the diff engine travel as [`ObjectRef`], a shared handle with an atomic
//! reference count. The count's highest bit is reserved as a transient
//! "modified" flag for the editing core; the arithmetic here keeps that
//! bit out of the public count.

use std::any::Any;
use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{fence, AtomicU32, Ordering};

use crate::diff::DiffOperation;

/// Equality capability used by containers and the diff engine.
pub trait Comparable {
    /// Compares this object with another one.
    ///
    /// Implementations decide the granularity: the diff engine only ever
    /// sees the boolean, so an `equals` that ignores sub-structure will
    /// merge what a stricter one would report as modified.
    fn equals(&self, other: &dyn CoreObject) -> bool;
}

/// Display capability for diagnostics and diff headlines.
pub trait Displayable {
    /// Returns the name of the object intended to be presented to a user.
    fn display_name(&self) -> String;
}

/// Capability to print field-level detail for a diff result.
pub trait DiffPrintable {
    /// Writes the diff details of this object for the given operation.
    ///
    /// `other` is the counterpart object for `Modified` steps and absent
    /// for additions and deletions.
    fn print_diff_info(&self, operation: DiffOperation, other: Option<&dyn CoreObject>);
}

/// The combined object surface stored behind an [`ObjectRef`].
///
/// Implemented automatically for every type that provides the three
/// capability traits; do not implement it by hand.
pub trait CoreObject: Comparable + Displayable + DiffPrintable + Any {
    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Comparable + Displayable + DiffPrintable + Any> CoreObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// Highest bit of the count is the modified flag of the editing core.
const MODIFIED_FLAG: u32 = 0x8000_0000;
const COUNT_MASK: u32 = 0x7FFF_FFFF;

struct ObjBox {
    refs: AtomicU32,
    value: Box<dyn CoreObject>,
}

/// A shared, reference-counted handle to a polymorphic object.
///
/// Cloning retains, dropping releases; the object is destroyed when the
/// count reaches zero. [`ObjectRef::autorelease`] transfers one reference
/// into the calling thread's default [autorelease pool], deferring the
/// release until the next drain.
///
/// Retain and release are atomic with respect to concurrent invocations
/// on the same object; everything else on the handle is single-threaded
/// by confinement.
///
/// [autorelease pool]: crate::core::AutoreleasePool
pub struct ObjectRef {
    inner: NonNull<ObjBox>,
}

impl ObjectRef {
    /// Wraps `value` into a freshly counted handle (count = 1).
    pub fn new<T: CoreObject>(value: T) -> Self {
        let boxed = Box::new(ObjBox {
            refs: AtomicU32::new(1),
            value: Box::new(value),
        });
        ObjectRef {
            inner: NonNull::from(Box::leak(boxed)),
        }
    }

    fn shared(&self) -> &ObjBox {
        // Valid while at least one handle exists; this handle holds a count.
        unsafe { self.inner.as_ref() }
    }

    /// Increases the reference count by one and returns the new handle.
    ///
    /// Identical to [`Clone::clone`]; provided under the lifecycle name.
    pub fn retain(&self) -> ObjectRef {
        self.clone()
    }

    /// Transfers this reference into the calling thread's default pool.
    /// The next [`drain`](crate::core::AutoreleasePool::drain) releases it.
    pub fn autorelease(self) {
        super::autorelease::add_to_default_pool(self);
    }

    /// Current reference count, with the modified flag masked out.
    pub fn reference_count(&self) -> u32 {
        self.shared().refs.load(Ordering::Relaxed) & COUNT_MASK
    }

    /// Sets or clears the transient modified flag used by the editing core.
    pub fn set_modified(&self, modified: bool) {
        if modified {
            self.shared().refs.fetch_or(MODIFIED_FLAG, Ordering::Relaxed);
        } else {
            self.shared().refs.fetch_and(!MODIFIED_FLAG, Ordering::Relaxed);
        }
    }

    /// Reads the transient modified flag.
    pub fn is_modified(&self) -> bool {
        self.shared().refs.load(Ordering::Relaxed) & MODIFIED_FLAG != 0
    }

    /// Borrows the underlying object.
    pub fn value(&self) -> &dyn CoreObject {
        &*self.shared().value
    }

    /// Compares the underlying objects via their [`Comparable`] capability.
    pub fn equals(&self, other: &ObjectRef) -> bool {
        self.value().equals(other.value())
    }

    /// Display name of the underlying object.
    pub fn display_name(&self) -> String {
        self.value().display_name()
    }

    /// Prints diff details of the underlying object.
    pub fn print_diff_info(&self, operation: DiffOperation, other: Option<&ObjectRef>) {
        self.value()
            .print_diff_info(operation, other.map(|o| o.value()));
    }

    /// Attempts to borrow the underlying object as a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value().as_any().downcast_ref::<T>()
    }

    /// True if both handles refer to the same allocation.
    pub fn ptr_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
        a.inner == b.inner
    }
}

impl Clone for ObjectRef {
    fn clone(&self) -> Self {
        // The flag lives above bit 30; counts stay far below it, so a
        // plain increment cannot carry into the flag.
        let old = self.shared().refs.fetch_add(1, Ordering::Relaxed);
        debug_assert!(old & COUNT_MASK < COUNT_MASK, "reference count overflow");
        ObjectRef { inner: self.inner }
    }
}

impl Drop for ObjectRef {
    fn drop(&mut self) {
        let old = self.shared().refs.fetch_sub(1, Ordering::Release);
        debug_assert!(
            old & COUNT_MASK != 0,
            "release of an object whose reference count is already zero"
        );
        if old & COUNT_MASK == 1 {
            fence(Ordering::Acquire);
            // Last reference gone; the flag bit does not keep objects alive.
            unsafe { drop(Box::from_raw(self.inner.as_ptr())) }
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("name", &self.display_name())
            .field("refs", &self.reference_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Probe {
        tag: i64,
        dropped: Rc<Cell<bool>>,
    }

    impl Drop for Probe {
        fn drop(&mut self) {
            self.dropped.set(true);
        }
    }

    impl Comparable for Probe {
        fn equals(&self, other: &dyn CoreObject) -> bool {
            other
                .as_any()
                .downcast_ref::<Probe>()
                .map(|p| p.tag == self.tag)
                .unwrap_or(false)
        }
    }

    impl Displayable for Probe {
        fn display_name(&self) -> String {
            format!("probe {}", self.tag)
        }
    }

    impl DiffPrintable for Probe {
        fn print_diff_info(&self, _operation: DiffOperation, _other: Option<&dyn CoreObject>) {}
    }

    fn probe(tag: i64) -> (ObjectRef, Rc<Cell<bool>>) {
        let dropped = Rc::new(Cell::new(false));
        let obj = ObjectRef::new(Probe {
            tag,
            dropped: dropped.clone(),
        });
        (obj, dropped)
    }

    #[test]
    fn retain_release_lifecycle() {
        let (obj, dropped) = probe(7);
        assert_eq!(obj.reference_count(), 1);

        let a = obj.retain();
        let b = obj.retain();
        let c = obj.retain();
        assert_eq!(obj.reference_count(), 4);

        drop(a);
        drop(b);
        drop(c);
        assert_eq!(obj.reference_count(), 1);
        assert!(!dropped.get());

        drop(obj);
        assert!(dropped.get());
    }

    #[test]
    fn modified_flag_does_not_leak_into_count() {
        let (obj, _) = probe(1);
        obj.set_modified(true);
        assert!(obj.is_modified());
        assert_eq!(obj.reference_count(), 1);

        let extra = obj.retain();
        assert_eq!(obj.reference_count(), 2);
        assert!(extra.is_modified());

        obj.set_modified(false);
        assert!(!obj.is_modified());
        assert_eq!(obj.reference_count(), 2);
    }

    #[test]
    fn equals_and_downcast() {
        let (a, _) = probe(5);
        let (b, _) = probe(5);
        let (c, _) = probe(6);
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
        assert_eq!(a.downcast_ref::<Probe>().unwrap().tag, 5);
        assert!(ObjectRef::ptr_eq(&a, &a.retain()));
        assert!(!ObjectRef::ptr_eq(&a, &b));
    }
}
