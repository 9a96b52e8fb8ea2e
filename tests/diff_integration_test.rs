// Integration tests for the structural diff: distances, backtrace
// shapes and the printed report over mixed object kinds.

use draftcore::core::{ColorValue, IntValue, ObjectRef, TextValue, VectorValue};
use draftcore::diff::{DiffDistance, DiffOperation};

fn text_diff(u: &[&str], v: &[&str]) -> DiffDistance {
    let mut diff = DiffDistance::new();
    for name in u {
        diff.add_u(TextValue::shared(*name));
    }
    for name in v {
        diff.add_v(TextValue::shared(*name));
    }
    diff
}

#[test]
fn equal_sequences_yield_only_equal_steps() {
    let mut diff = text_diff(&["a", "b", "c", "d"], &["a", "b", "c", "d"]);
    let trace = diff.solve();
    assert_eq!(diff.distance(), Some(0));
    assert!(trace
        .steps()
        .iter()
        .all(|step| step.operation() == DiffOperation::Equal));
    assert_eq!(trace.print().total(), 0);
}

#[test]
fn add_delete_scenario() {
    let mut diff = text_diff(&["A", "B", "C"], &["A", "C"]);
    let trace = diff.solve();
    assert_eq!(diff.distance(), Some(1));

    let deleted: Vec<_> = trace
        .steps()
        .iter()
        .filter(|s| s.operation() == DiffOperation::Delete)
        .collect();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].left().unwrap().display_name(), "B");

    let counts = trace.print();
    assert_eq!(counts.deleted, 1);
    assert_eq!(counts.added, 0);
    assert_eq!(counts.modified, 0);
}

#[test]
fn minimality_over_scattered_edits() {
    let mut diff = text_diff(
        &["line1", "line2", "line3", "line4", "line5", "line6"],
        &["line1", "lineX", "line3", "line5", "line6", "line7"],
    );
    let trace = diff.solve();
    let distance = diff.distance().unwrap();
    // line2 -> lineX, line4 removed, line7 appended.
    assert_eq!(distance, 3);
    assert_eq!(trace.edit_count() as u32, distance);
}

#[test]
fn mixed_object_kinds_compare_by_capability() {
    let mut diff = DiffDistance::new();
    let left: Vec<ObjectRef> = vec![
        TextValue::shared("wall"),
        IntValue::shared(3),
        VectorValue::shared(0.0, 0.0, 1.0),
        ColorValue::shared(255, 0, 0),
    ];
    let right: Vec<ObjectRef> = vec![
        TextValue::shared("wall"),
        IntValue::shared(4),
        VectorValue::shared(0.0, 0.0, 1.0),
        ColorValue::shared(255, 0, 0),
    ];
    for object in left {
        diff.add_u(object);
    }
    for object in right {
        diff.add_v(object);
    }
    let trace = diff.solve();
    assert_eq!(diff.distance(), Some(1));

    let counts = trace.print();
    assert_eq!(counts.modified, 1);
    assert_eq!(counts.total(), 1);
}

#[test]
fn disjoint_sequences_replace_everything() {
    let mut diff = text_diff(&["a", "b"], &["x", "y", "z"]);
    let trace = diff.solve();
    assert_eq!(diff.distance(), Some(3));
    let counts = trace.print();
    assert_eq!(counts.total(), 3);
    // Two substitutions and one addition cover the length difference.
    assert_eq!(counts.added, 1);
    assert_eq!(counts.modified, 2);
}

#[test]
fn expanded_compound_items_diff_at_part_granularity() {
    // Callers expand a compound object into parts on both sides; the
    // engine then reports the single changed part instead of one
    // monolithic modification.
    let mut diff = DiffDistance::new();
    for part in [
        TextValue::shared("polyline"),
        VectorValue::shared(0.0, 0.0, 0.0),
        VectorValue::shared(10.0, 0.0, 0.0),
        VectorValue::shared(10.0, 5.0, 0.0),
    ] {
        diff.add_u(part);
    }
    for part in [
        TextValue::shared("polyline"),
        VectorValue::shared(0.0, 0.0, 0.0),
        VectorValue::shared(10.0, 0.0, 0.0),
        VectorValue::shared(10.0, 7.5, 0.0),
    ] {
        diff.add_v(part);
    }
    let trace = diff.solve();
    assert_eq!(diff.distance(), Some(1));
    let modified: Vec<_> = trace
        .steps()
        .iter()
        .filter(|s| s.operation() == DiffOperation::Modified)
        .collect();
    assert_eq!(modified.len(), 1);
    assert_eq!(
        modified[0].right().unwrap().display_name(),
        "(10, 7.5, 0)"
    );
}
