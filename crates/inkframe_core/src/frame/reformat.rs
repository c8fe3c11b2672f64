//! Re-wrapping and renumbering of the line list after edits.

use super::line::{LineId, LineList};
use super::wrap::WrapFn;

/// What a [`LineList::reformat`] pass did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reformat {
    /// Line callers should re-anchor their viewport on.
    pub anchor: LineId,
    pub merged: usize,
    pub pruned: usize,
    pub split: usize,
}

impl Reformat {
    /// True when the pass changed no line structure.
    pub fn is_noop(&self) -> bool {
        self.merged == 0 && self.pruned == 0 && self.split == 0
    }
}

impl LineList {
    /// True when the soft break after `id` is still exactly where `wrap`
    /// would put it, so undoing it would only redo it.
    fn soft_break_holds(&self, id: LineId, wrap: &dyn WrapFn) -> bool {
        let line = self.line(id);
        let Some(next) = line.next() else {
            return false;
        };
        let Some(first) = self.line(next).text().chars().next() else {
            return false;
        };
        if line.text_len() == 0 || wrap.wrap_offset(line.text()) != line.text_len() {
            return false;
        }
        let mut probe = String::with_capacity(line.text().len() + first.len_utf8());
        probe.push_str(line.text());
        probe.push(first);
        wrap.wrap_offset(&probe) == line.text_len()
    }

    /// Restore wrapping, offsets and indices from `from` to the end.
    ///
    /// Soft-wrapped continuations are merged back into their logical line,
    /// empty interior lines are dropped, lines are re-split where `wrap`
    /// says, and an empty sentinel is kept after a final newline.
    pub fn reformat(&mut self, from: LineId, wrap: &dyn WrapFn) -> Reformat {
        let mut result = Reformat {
            anchor: from,
            merged: 0,
            pruned: 0,
            split: 0,
        };

        let mut cur = Some(from);
        while let Some(id) = cur {
            while !self.line(id).has_newline()
                && self.line(id).next().is_some()
                && !self.soft_break_holds(id, wrap)
            {
                self.join(id);
                result.merged += 1;
            }
            let next = self.line(id).next();
            if self.line(id).is_empty() {
                if let Some(next) = next {
                    if id == self.tail() {
                        tracing::warn!("reformat: empty tail line has a successor");
                    }
                    if result.anchor == id {
                        result.anchor = next;
                    }
                    self.remove(id);
                    result.pruned += 1;
                }
            }
            cur = next;
        }

        let mut cur = Some(result.anchor);
        while let Some(id) = cur {
            self.renumber_one(id);
            let text_len = self.line(id).text_len();
            if text_len > 0 {
                let at = wrap.wrap_offset(self.line(id).text()).max(1);
                if at < text_len {
                    self.split(id, at, false);
                    result.split += 1;
                }
            }
            cur = self.line(id).next();
        }

        if self.line(self.tail()).has_newline() {
            self.push_line("", false);
        }

        let anchor = self.line(result.anchor);
        if anchor.next().is_none() {
            if let Some(prev) = anchor.prev() {
                result.anchor = prev;
            }
        }
        result
    }
}
