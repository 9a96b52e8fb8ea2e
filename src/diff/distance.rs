//! Levenshtein distance with lazy diagonals
//!
//! The edit-distance matrix is decomposed into diagonals: the diagonal
//! with offset `k` holds the cells `(i, i + k)`, offsets increase toward
//! the right-hand sequence and decrease toward the left-hand one. Each
//! diagonal materialises its values on demand, and the equality shortcut
//! of the recurrence keeps the evaluation inside the `[-d .. +d]` band
//! around the centre.

use std::collections::HashMap;

use log::debug;

use super::backtrace::{DiffBacktrace, DiffStep};
use super::DiffOperation;
use crate::core::ObjectRef;

/// Computes the Levenshtein distance between two object sequences.
///
/// The only decisive factor is whether two objects are equal under their
/// [`Comparable`](crate::core::Comparable) capability; callers that want
/// finer-grained results expand compound objects into their parts before
/// feeding them in.
#[derive(Default)]
pub struct DiffDistance {
    u: Vec<ObjectRef>,
    v: Vec<ObjectRef>,
    diagonals: HashMap<i64, Vec<u32>>,
    cells_computed: u64,
    distance: Option<u32>,
}

impl DiffDistance {
    /// Creates an empty computation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards all state so a new comparison can be made.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Appends an element to the left-hand sequence.
    pub fn add_u(&mut self, object: ObjectRef) {
        self.u.push(object);
    }

    /// Appends an element to the right-hand sequence.
    pub fn add_v(&mut self, object: ObjectRef) {
        self.v.push(object);
    }

    /// The distance, once [`solve`](Self::solve) has run.
    pub fn distance(&self) -> Option<u32> {
        self.distance
    }

    /// Number of matrix cells materialised; a statistic for evaluating
    /// the lazy evaluation on real inputs.
    pub fn cells_computed(&self) -> u64 {
        self.cells_computed
    }

    /// Cell `(i, j)` of the diagonal with `offset`, at `index` along it.
    fn cell(offset: i64, index: usize) -> (usize, usize) {
        if offset >= 0 {
            (index, index + offset as usize)
        } else {
            (index + offset.unsigned_abs() as usize, index)
        }
    }

    /// Lazily evaluated matrix entry on the diagonal with `offset`.
    ///
    /// `index` counts cells along the diagonal; index 0 is the boundary
    /// value `|offset|`.
    fn entry(&mut self, offset: i64, index: usize) -> u32 {
        let existing = self.diagonals.get(&offset).map_or(0, Vec::len);
        if existing > index {
            return self.diagonals[&offset][index];
        }
        if existing == 0 {
            self.diagonals
                .entry(offset)
                .or_default()
                .push(offset.unsigned_abs() as u32);
        }

        let mut next = self.diagonals[&offset].len();
        while next <= index {
            let (i, j) = Self::cell(offset, next);
            let diag = self.diagonals[&offset][next - 1];
            let value = if self.u[i - 1].equals(&self.v[j - 1]) {
                diag
            } else {
                let above = self.entry(offset + 1, (i - 1).min(j));
                let below = self.entry(offset - 1, i.min(j - 1));
                1 + diag.min(above).min(below)
            };
            self.diagonals
                .get_mut(&offset)
                .expect("diagonal exists")
                .push(value);
            self.cells_computed += 1;
            next = self.diagonals[&offset].len();
        }
        self.diagonals[&offset][index]
    }

    /// Matrix entry `D(i, j)` including the boundary row and column.
    fn matrix(&mut self, i: usize, j: usize) -> u32 {
        if i == 0 {
            return j as u32;
        }
        if j == 0 {
            return i as u32;
        }
        self.entry(j as i64 - i as i64, i.min(j))
    }

    /// Computes the distance and reconstructs the backtrace path.
    pub fn solve(&mut self) -> DiffBacktrace {
        let m = self.u.len();
        let n = self.v.len();
        let distance = self.matrix(m, n);
        self.distance = Some(distance);
        debug!(
            "diff distance {distance} over {}x{} elements, {} cells materialised",
            m, n, self.cells_computed
        );

        // Walk from (m, n) back to the origin, preferring equal steps
        // and otherwise the predecessor with the minimal value.
        let mut steps = Vec::new();
        let (mut i, mut j) = (m, n);
        while i > 0 || j > 0 {
            if i > 0 && j > 0 && self.u[i - 1].equals(&self.v[j - 1]) {
                steps.push(DiffStep::new(
                    DiffOperation::Equal,
                    Some(self.u[i - 1].clone()),
                    Some(self.v[j - 1].clone()),
                ));
                i -= 1;
                j -= 1;
                continue;
            }

            let diagonal = (i > 0 && j > 0).then(|| self.matrix(i - 1, j - 1));
            let above = (i > 0).then(|| self.matrix(i - 1, j));
            let left = (j > 0).then(|| self.matrix(i, j - 1));
            let best = [diagonal, above, left].iter().flatten().copied().min()
                .expect("at least one predecessor exists");

            if diagonal == Some(best) {
                steps.push(DiffStep::new(
                    DiffOperation::Modified,
                    Some(self.u[i - 1].clone()),
                    Some(self.v[j - 1].clone()),
                ));
                i -= 1;
                j -= 1;
            } else if above == Some(best) {
                steps.push(DiffStep::new(
                    DiffOperation::Delete,
                    Some(self.u[i - 1].clone()),
                    None,
                ));
                i -= 1;
            } else {
                steps.push(DiffStep::new(
                    DiffOperation::Add,
                    None,
                    Some(self.v[j - 1].clone()),
                ));
                j -= 1;
            }
        }
        steps.reverse();
        DiffBacktrace::new(steps)
    }
}
