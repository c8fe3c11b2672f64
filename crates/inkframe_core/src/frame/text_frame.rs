//! The editable text frame: lines, marks, selection and rune count.

use super::line::{LineId, LineList};
use super::locate::{CharClass, Located};
use super::marks::MarkRegistry;
use super::selection::Selection;
use super::wrap::{NoWrap, WrapFn};
use crate::config::FrameConfig;
use crate::error::FrameError;
use std::fmt;
use tracing::{debug, warn};

/// Local replica of a document's text, wrapped into physical lines.
pub struct TextFrame {
    lines: LineList,
    marks: MarkRegistry,
    selection: Selection,
    nrunes: usize,
    wrap: Box<dyn WrapFn>,
    trace: bool,
    edit_anchor: LineId,
}

impl fmt::Debug for TextFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextFrame")
            .field("nrunes", &self.nrunes)
            .field("selection", &self.selection)
            .field("lines", &self.lines.line_count())
            .field("marks", &self.marks)
            .finish()
    }
}

impl Default for TextFrame {
    fn default() -> Self {
        Self::new(Box::new(NoWrap))
    }
}

impl TextFrame {
    /// Create an empty frame wrapping lines with `wrap`.
    pub fn new(wrap: Box<dyn WrapFn>) -> Self {
        let lines = LineList::new();
        let head = lines.head();
        Self {
            lines,
            marks: MarkRegistry::default(),
            selection: Selection::default(),
            nrunes: 0,
            wrap,
            trace: false,
            edit_anchor: head,
        }
    }

    pub fn from_config(config: &FrameConfig) -> Self {
        let mut frame = Self::new(config.wrap_fn());
        frame.trace = config.trace_frame;
        frame
    }

    /// Build a frame holding `text`, lines split at newlines and wrapped.
    pub fn with_text(text: &str, wrap: Box<dyn WrapFn>) -> Self {
        let mut frame = Self::new(wrap);
        let mut pieces = text.split('\n').peekable();
        while let Some(piece) = pieces.next() {
            let newline = pieces.peek().is_some();
            if piece.is_empty() && !newline {
                break;
            }
            frame.push_line(piece, newline);
        }
        frame.reformat_all();
        frame
    }

    /// Forget all text, marks and selection.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.marks.clear();
        self.selection = Selection::default();
        self.nrunes = 0;
        self.edit_anchor = self.lines.head();
    }

    pub fn lines(&self) -> &LineList {
        &self.lines
    }

    pub fn marks(&self) -> &MarkRegistry {
        &self.marks
    }

    pub fn marks_mut(&mut self) -> &mut MarkRegistry {
        &mut self.marks
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Total rune count, newlines included.
    pub fn total_runes(&self) -> usize {
        self.nrunes
    }

    /// Line touched by the most recent edit, for viewport scrolling.
    pub fn edit_anchor(&self) -> LineId {
        self.edit_anchor
    }

    /// Ordinal of the first line shown by the renderer.
    pub fn top_line(&self) -> usize {
        self.lines.line(self.lines.top()).index()
    }

    /// Scroll so line `index` is first; out of range scrolls to the top.
    pub fn set_top_line(&mut self, index: usize) {
        let id = self.lines.seek_line(index);
        self.lines.set_top(id);
    }

    /// Set the selection, clamped to the document.
    pub fn set_selection(&mut self, p0: usize, p1: usize) {
        self.selection = Selection::clamped(p0, p1, self.nrunes);
    }

    /// Replace the wrap function and re-wrap the whole document.
    pub fn set_wrap(&mut self, wrap: Box<dyn WrapFn>) {
        self.wrap = wrap;
        self.reformat_all();
    }

    /// Append a line after the current last line.
    pub fn push_line(&mut self, text: &str, newline: bool) {
        let id = self.lines.push_line(text, newline);
        self.nrunes += self.lines.line(id).len();
    }

    /// Re-wrap from the first line, keeping the viewport anchor.
    pub fn reformat_all(&mut self) {
        let head = self.lines.head();
        self.reformat_from(head);
    }

    fn reformat_from(&mut self, from: LineId) -> LineId {
        let result = self.lines.reformat(from, self.wrap.as_ref());
        if self.trace {
            debug!(
                merged = result.merged,
                pruned = result.pruned,
                split = result.split,
                "reformat\n{}",
                self.dump()
            );
        }
        result.anchor
    }

    /// Insert `text` at the selection start, leaving a caret after it.
    ///
    /// Newlines split lines; everything else is spliced into the line that
    /// holds the caret.
    pub fn insert(&mut self, text: &str) -> Result<(), FrameError> {
        let mut pieces = text.split('\n').peekable();
        while let Some(piece) = pieces.next() {
            if !piece.is_empty() {
                self.insert_piece(piece)?;
            }
            if pieces.peek().is_some() {
                self.insert_piece("\n")?;
            }
        }
        Ok(())
    }

    /// Insert `text` at `pos`.
    pub fn insert_at(&mut self, text: &str, pos: usize) -> Result<(), FrameError> {
        self.set_selection(pos, pos);
        self.insert(text)
    }

    fn insert_piece(&mut self, piece: &str) -> Result<(), FrameError> {
        let p0 = self.selection.p0;
        let Some((id, line_offset)) = self.lines.seek(p0) else {
            warn!(pos = p0, "insert: no line for p0");
            return Err(FrameError::NoLineAt { pos: p0 });
        };
        let count = piece.chars().count();
        self.marks.shift_for_insert(p0, count);
        let is_newline = piece == "\n";
        if is_newline {
            self.lines.split(id, line_offset, true);
        } else {
            self.lines.line_mut(id).insert_text(piece, line_offset);
        }
        self.selection = Selection::caret(p0 + count);
        self.nrunes += count;

        if !is_newline {
            let line = self.lines.line(id);
            if self.wrap.wrap_offset(line.text()) >= line.text_len() {
                self.lines.renumber(id);
                self.edit_anchor = id;
                return Ok(());
            }
        }
        self.edit_anchor = self.reformat_from(id);
        Ok(())
    }

    /// Delete the selected range, leaving a caret at its start.
    ///
    /// # Returns
    /// `Ok(false)` when there was nothing to delete.
    pub fn delete(&mut self) -> Result<bool, FrameError> {
        let Selection { p0, p1 } = self.selection;
        if p0 >= self.nrunes || p1 <= p0 {
            return Ok(false);
        }
        let p1 = p1.min(self.nrunes);
        let Some((first, mut line_offset)) = self.lines.seek(p0) else {
            warn!(pos = p0, "delete: no line for p0");
            return Err(FrameError::NoLineAt { pos: p0 });
        };
        self.marks.shift_for_delete(p0, p1);

        let wanted = p1 - p0;
        let mut total = 0usize;
        let mut cur = Some(first);
        while let Some(id) = cur {
            if total >= wanted {
                break;
            }
            let line = self.lines.line_mut(id);
            let mut removed = line.delete_range(line_offset, wanted - total);
            if total + removed < wanted && line.has_newline() {
                line.set_newline(false);
                removed += 1;
            }
            if total == 0 && removed == wanted && line.has_newline() {
                // confined to one newline-terminated line
                self.nrunes -= removed;
                self.selection = Selection::caret(p0);
                self.lines.renumber(id);
                self.edit_anchor = id;
                return Ok(true);
            }
            total += removed;
            line_offset = 0;
            cur = line.next();
        }
        self.nrunes -= total;
        self.selection = Selection::caret(p0);
        let from = self.lines.line(first).prev().unwrap_or(first);
        self.edit_anchor = self.reformat_from(from);
        Ok(true)
    }

    /// Delete `p0..p1`.
    pub fn delete_range(&mut self, p0: usize, p1: usize) -> Result<bool, FrameError> {
        self.set_selection(p0, p1);
        self.delete()
    }

    /// Text in `p0..p1`, newlines included.
    pub fn get(&self, p0: usize, p1: usize) -> String {
        if p0 >= p1 || p0 >= self.nrunes {
            return String::new();
        }
        let Some((first, mut off)) = self.lines.seek(p0) else {
            return String::new();
        };
        let wanted = p1 - p0;
        let mut out = String::new();
        let mut got = 0usize;
        let mut cur = Some(first);
        while let Some(id) = cur {
            if got >= wanted {
                break;
            }
            let line = self.lines.line(id);
            let take = (wanted - got).min(line.text_len().saturating_sub(off));
            out.extend(line.text().chars().skip(off).take(take));
            got += take;
            if got < wanted && line.has_newline() {
                out.push('\n');
                got += 1;
            }
            off = 0;
            cur = line.next();
        }
        out
    }

    /// The whole document.
    pub fn text(&self) -> String {
        self.get(0, self.nrunes)
    }

    /// Word or bracketed span around `pos`; see [`LineList::locate`].
    pub fn locate(&self, pos: usize, class: &dyn CharClass) -> Located {
        self.lines.locate(pos, class)
    }

    /// One line per physical line in `off[index] =\t[text]` form; offset
    /// drift is flagged inline.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut expected = 0usize;
        for (_, line) in self.lines.iter() {
            if line.offset() != expected {
                out.push_str(&format!("BAD off {} (!={}) in:\n", line.offset(), expected));
            }
            expected = line.offset() + line.len();
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out
    }

    /// Check the offset invariant and the cached rune count.
    pub fn check_offsets(&self) -> bool {
        self.lines.offsets_consistent() && self.lines.total_runes() == self.nrunes
    }
}
