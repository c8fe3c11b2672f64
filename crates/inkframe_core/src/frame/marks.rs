//! Named logical positions that track edits.

/// Position of `pos` after inserting `count` runes at `at`.
///
/// Only positions strictly after `at` move.
pub fn adjust_for_insert(pos: usize, at: usize, count: usize) -> usize {
    if pos > at {
        pos + count
    } else {
        pos
    }
}

/// Position of `pos` after deleting the half-open range `p0..p1`.
///
/// Positions inside the range collapse onto `p0`.
pub fn adjust_for_delete(pos: usize, p0: usize, p1: usize) -> usize {
    if pos <= p0 {
        return pos;
    }
    pos - (pos.min(p1) - p0)
}

/// A named rune position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mark {
    pub name: String,
    pub position: usize,
}

/// Registry of marks kept valid across insertions and deletions.
#[derive(Clone, Debug, Default)]
pub struct MarkRegistry {
    marks: Vec<Mark>,
}

impl MarkRegistry {
    /// Create or move the mark `name`.
    pub fn set(&mut self, name: &str, position: usize) {
        match self.marks.iter_mut().find(|m| m.name == name) {
            Some(mark) => mark.position = position,
            None => self.marks.push(Mark {
                name: name.to_string(),
                position,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.marks
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.position)
    }

    /// Remove the mark `name`, returning whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.marks.len();
        self.marks.retain(|m| m.name != name);
        self.marks.len() != before
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.marks.iter()
    }

    /// Shift marks for an insertion of `count` runes at `at`.
    pub fn shift_for_insert(&mut self, at: usize, count: usize) {
        for mark in &mut self.marks {
            mark.position = adjust_for_insert(mark.position, at, count);
        }
    }

    /// Shift marks for a deletion of `p0..p1`.
    pub fn shift_for_delete(&mut self, p0: usize, p1: usize) {
        for mark in &mut self.marks {
            mark.position = adjust_for_delete(mark.position, p0, p1);
        }
    }
}
