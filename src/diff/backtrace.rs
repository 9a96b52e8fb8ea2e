//! Backtrace path
//!
//! The chain of edit operations reconstructed from the distance matrix,
//! ordered from the start of both sequences to their ends. Printing
//! walks the chain and reports only the non-equal steps.

use super::DiffOperation;
use crate::core::ObjectRef;

/// One step of the backtrace path.
#[derive(Debug, Clone)]
pub struct DiffStep {
    operation: DiffOperation,
    left: Option<ObjectRef>,
    right: Option<ObjectRef>,
}

impl DiffStep {
    pub(crate) fn new(
        operation: DiffOperation,
        left: Option<ObjectRef>,
        right: Option<ObjectRef>,
    ) -> Self {
        DiffStep {
            operation,
            left,
            right,
        }
    }

    /// The operation of this step.
    pub fn operation(&self) -> DiffOperation {
        self.operation
    }

    /// The left-hand object, absent for additions.
    pub fn left(&self) -> Option<&ObjectRef> {
        self.left.as_ref()
    }

    /// The right-hand object, absent for deletions.
    pub fn right(&self) -> Option<&ObjectRef> {
        self.right.as_ref()
    }
}

/// Tally of the non-equal steps a [`DiffBacktrace::print`] run emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffCounts {
    /// Number of `Add` steps.
    pub added: usize,
    /// Number of `Delete` steps.
    pub deleted: usize,
    /// Number of `Modified` steps.
    pub modified: usize,
}

impl DiffCounts {
    /// Total number of reported differences.
    pub fn total(&self) -> usize {
        self.added + self.deleted + self.modified
    }
}

/// The path of change between two sequences.
#[derive(Debug, Clone, Default)]
pub struct DiffBacktrace {
    steps: Vec<DiffStep>,
}

impl DiffBacktrace {
    pub(crate) fn new(steps: Vec<DiffStep>) -> Self {
        DiffBacktrace { steps }
    }

    /// All steps in order, equal ones included.
    pub fn steps(&self) -> &[DiffStep] {
        &self.steps
    }

    /// Number of steps, equal ones included.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when the path is empty (two empty sequences).
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Operation of the first step, `Equal` for an empty path.
    pub fn operation(&self) -> DiffOperation {
        self.steps
            .first()
            .map(DiffStep::operation)
            .unwrap_or(DiffOperation::Equal)
    }

    /// Number of non-equal steps; equals the Levenshtein distance.
    pub fn edit_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.operation() != DiffOperation::Equal)
            .count()
    }

    /// Prints every non-equal step to standard output and returns the
    /// tally. Additions and deletions get a headline; modifications also
    /// print their field-level details.
    pub fn print(&self) -> DiffCounts {
        let mut counts = DiffCounts::default();
        for step in &self.steps {
            match step.operation() {
                DiffOperation::Equal => {}
                DiffOperation::Add => {
                    counts.added += 1;
                    if let Some(object) = step.right() {
                        println!("A {}", object.display_name());
                    }
                }
                DiffOperation::Delete => {
                    counts.deleted += 1;
                    if let Some(object) = step.left() {
                        println!("D {}", object.display_name());
                    }
                }
                DiffOperation::Modified => {
                    counts.modified += 1;
                    let (Some(left), Some(right)) = (step.left(), step.right()) else {
                        continue;
                    };
                    // A replacement by an object of another kind has no
                    // field-level detail worth printing.
                    if left.value().as_any().type_id() != right.value().as_any().type_id() {
                        println!(
                            "R {} -> {}:",
                            left.display_name(),
                            right.display_name()
                        );
                        continue;
                    }
                    println!("M {}", left.display_name());
                    left.print_diff_info(DiffOperation::Modified, Some(right));
                }
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{IntValue, TextValue};
    use crate::diff::DiffDistance;

    #[test]
    fn print_counts_non_equal_steps() {
        let mut diff = DiffDistance::new();
        for name in ["a", "b", "c"] {
            diff.add_u(TextValue::shared(name));
        }
        for name in ["a", "c"] {
            diff.add_v(TextValue::shared(name));
        }
        let trace = diff.solve();
        let counts = trace.print();
        assert_eq!(counts.deleted, 1);
        assert_eq!(counts.added, 0);
        assert_eq!(counts.modified, 0);
        assert_eq!(counts.total(), 1);
    }

    #[test]
    fn type_change_counts_as_modification() {
        let mut diff = DiffDistance::new();
        diff.add_u(TextValue::shared("42"));
        diff.add_v(IntValue::shared(42));
        let trace = diff.solve();
        assert_eq!(trace.operation(), DiffOperation::Modified);
        let counts = trace.print();
        assert_eq!(counts.modified, 1);
    }

    #[test]
    fn empty_backtrace_reports_equal() {
        let trace = DiffBacktrace::default();
        assert!(trace.is_empty());
        assert_eq!(trace.operation(), DiffOperation::Equal);
        assert_eq!(trace.print(), DiffCounts::default());
    }
}
