//! Selection state shared by the frame and the reconciler.

use super::marks::{adjust_for_delete, adjust_for_insert};
use std::ops::Range;

/// Ordered pair of rune offsets; `p0 == p1` is a caret.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub p0: usize,
    pub p1: usize,
}

impl Selection {
    /// Build a selection clamped to `0..=total`, with `p1` never before `p0`.
    pub fn clamped(p0: usize, p1: usize, total: usize) -> Self {
        let p0 = p0.min(total);
        let p1 = p1.max(p0).min(total);
        Self { p0, p1 }
    }

    pub fn caret(pos: usize) -> Self {
        Self { p0: pos, p1: pos }
    }

    pub fn is_caret(&self) -> bool {
        self.p0 == self.p1
    }

    pub fn range(&self) -> Range<usize> {
        self.p0..self.p1
    }

    /// Map both endpoints through an insertion of `count` runes at `at`.
    pub fn map_insert(self, at: usize, count: usize) -> Self {
        Self {
            p0: adjust_for_insert(self.p0, at, count),
            p1: adjust_for_insert(self.p1, at, count),
        }
    }

    /// Map both endpoints through a deletion of `p0..p1`.
    pub fn map_delete(self, p0: usize, p1: usize) -> Self {
        Self {
            p0: adjust_for_delete(self.p0, p0, p1),
            p1: adjust_for_delete(self.p1, p0, p1),
        }
    }
}
