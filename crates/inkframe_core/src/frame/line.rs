//! Arena-backed doubly linked list of physical lines.
//!
//! Lines are addressed by stable [`LineId`] handles; `prev`/`next` links are
//! handles into the same arena. Freed slots are recycled.

use std::fmt;

/// Stable handle to a line slot in a [`LineList`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LineId(u32);

impl LineId {
    fn slot(self) -> usize {
        self.0 as usize
    }
}

/// Byte offset of rune `char_index` within `text`, clamped to its end.
pub(crate) fn char_to_byte(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// One physical row of text after wrapping.
#[derive(Clone, Debug, Default)]
pub struct Line {
    index: usize,
    offset: usize,
    text: String,
    chars: usize,
    newline: bool,
    prev: Option<LineId>,
    next: Option<LineId>,
}

impl Line {
    fn new(text: &str, newline: bool) -> Self {
        Self {
            text: text.to_string(),
            chars: text.chars().count(),
            newline,
            ..Self::default()
        }
    }

    /// Ordinal of this line among the current lines.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Rune offset of the first character within the document.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Line content, without the trailing newline.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Rune count of [`Line::text`].
    pub fn text_len(&self) -> usize {
        self.chars
    }

    /// True when a real document newline terminates this line.
    pub fn has_newline(&self) -> bool {
        self.newline
    }

    /// Rune length including the newline, if any.
    pub fn len(&self) -> usize {
        self.chars + usize::from(self.newline)
    }

    /// True when the line holds no runes at all, newline included.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn prev(&self) -> Option<LineId> {
        self.prev
    }

    pub fn next(&self) -> Option<LineId> {
        self.next
    }

    /// Splice `text` in at rune `line_offset` (clamped to the line end).
    pub fn insert_text(&mut self, text: &str, line_offset: usize) {
        let at = char_to_byte(&self.text, line_offset.min(self.chars));
        self.text.insert_str(at, text);
        self.chars += text.chars().count();
    }

    /// Remove up to `count` runes at `line_offset`; never touches the newline.
    ///
    /// # Returns
    /// The number of runes actually removed.
    pub fn delete_range(&mut self, line_offset: usize, count: usize) -> usize {
        if line_offset >= self.chars {
            return 0;
        }
        let count = count.min(self.chars - line_offset);
        if count > 0 {
            let start = char_to_byte(&self.text, line_offset);
            let end = char_to_byte(&self.text, line_offset + count);
            self.text.replace_range(start..end, "");
            self.chars -= count;
        }
        count
    }

    pub(crate) fn set_newline(&mut self, newline: bool) {
        self.newline = newline;
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nl = if self.newline { "\\n" } else { "" };
        write!(f, "{}[{}] =\t[{}{}]", self.offset, self.index, self.text, nl)
    }
}

/// The document as a doubly linked sequence of lines.
///
/// Always holds at least one line. Besides the head and tail it tracks a
/// viewport anchor (`top`), the first line a renderer shows.
#[derive(Clone, Debug)]
pub struct LineList {
    slots: Vec<Line>,
    free: Vec<LineId>,
    head: LineId,
    tail: LineId,
    top: LineId,
}

impl Default for LineList {
    fn default() -> Self {
        Self::new()
    }
}

impl LineList {
    /// Create a list holding a single empty sentinel line.
    pub fn new() -> Self {
        let id = LineId(0);
        Self {
            slots: vec![Line::new("", false)],
            free: Vec::new(),
            head: id,
            tail: id,
            top: id,
        }
    }

    /// Drop every line and start over with a single empty line.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn line(&self, id: LineId) -> &Line {
        &self.slots[id.slot()]
    }

    pub(crate) fn line_mut(&mut self, id: LineId) -> &mut Line {
        &mut self.slots[id.slot()]
    }

    pub fn head(&self) -> LineId {
        self.head
    }

    pub fn tail(&self) -> LineId {
        self.tail
    }

    /// First line shown by the renderer.
    pub fn top(&self) -> LineId {
        self.top
    }

    pub fn set_top(&mut self, id: LineId) {
        self.top = id;
    }

    /// Iterate lines front to back.
    pub fn iter(&self) -> impl Iterator<Item = (LineId, &Line)> + '_ {
        std::iter::successors(Some(self.head), move |&id| self.line(id).next)
            .map(move |id| (id, self.line(id)))
    }

    pub fn line_count(&self) -> usize {
        self.iter().count()
    }

    fn alloc(&mut self, line: Line) -> LineId {
        if let Some(id) = self.free.pop() {
            self.slots[id.slot()] = line;
            id
        } else {
            let id = LineId(self.slots.len() as u32);
            self.slots.push(line);
            id
        }
    }

    fn release(&mut self, id: LineId) {
        self.slots[id.slot()] = Line::default();
        self.free.push(id);
    }

    /// Line at ordinal `n`; out of range falls back to the first line.
    pub fn seek_line(&self, n: usize) -> LineId {
        self.iter()
            .nth(n)
            .map(|(id, _)| id)
            .unwrap_or(self.head)
    }

    /// Locate rune position `pos`.
    ///
    /// A position exactly at a line's text end resolves to that line, not
    /// to offset 0 of the following one.
    pub fn seek(&self, pos: usize) -> Option<(LineId, usize)> {
        self.iter()
            .find(|(_, line)| pos >= line.offset && pos <= line.offset + line.chars)
            .map(|(id, line)| (id, pos - line.offset))
    }

    /// Inverse of [`LineList::seek`]; offsets past the text clamp to the
    /// line end, newline included.
    pub fn seek_position(&self, id: Option<LineId>, line_offset: usize) -> usize {
        let Some(id) = id else {
            return 0;
        };
        let line = self.line(id);
        if line_offset > line.chars {
            line.offset + line.len()
        } else {
            line.offset + line_offset
        }
    }

    /// Split `id` at `line_offset`. The new line takes the tail text and the
    /// newline flag of `id`, which then gets `add_newline`.
    pub fn split(&mut self, id: LineId, line_offset: usize, add_newline: bool) -> LineId {
        let (tail_text, newline, index, offset, next, full_len) = {
            let line = self.line_mut(id);
            let full_len = line.chars;
            let at = char_to_byte(&line.text, line_offset.min(line.chars));
            let tail_text = line.text.split_off(at);
            line.chars = line.text.chars().count();
            let newline = line.newline;
            line.newline = add_newline;
            (tail_text, newline, line.index, line.offset, line.next, full_len)
        };
        let mut new_line = Line::new(&tail_text, newline);
        new_line.index = index + 1;
        new_line.offset = offset + line_offset.min(full_len) + usize::from(add_newline);
        new_line.prev = Some(id);
        new_line.next = next;
        let new_id = self.alloc(new_line);
        if let Some(next) = next {
            self.line_mut(next).prev = Some(new_id);
        }
        self.line_mut(id).next = Some(new_id);
        if self.tail == id {
            self.tail = new_id;
        }
        new_id
    }

    /// Merge the successor of `id` into it; no-op without a successor.
    ///
    /// # Returns
    /// `true` when a line was merged.
    pub fn join(&mut self, id: LineId) -> bool {
        let Some(next_id) = self.line(id).next else {
            return false;
        };
        let next = std::mem::take(self.line_mut(next_id));
        {
            let line = self.line_mut(id);
            line.text.push_str(&next.text);
            line.chars += next.chars;
            line.newline = next.newline;
            line.next = next.next;
        }
        if let Some(after) = next.next {
            self.line_mut(after).prev = Some(id);
        }
        if self.tail == next_id {
            self.tail = id;
        }
        if self.top == next_id {
            self.top = id;
        }
        self.release(next_id);
        true
    }

    /// Unlink and free `id`, keeping head/tail/top valid. The only line of
    /// the list is never removed.
    pub fn remove(&mut self, id: LineId) -> bool {
        let (prev, next) = {
            let line = self.line(id);
            (line.prev, line.next)
        };
        if prev.is_none() && next.is_none() {
            return false;
        }
        if let Some(prev) = prev {
            self.line_mut(prev).next = next;
        }
        if let Some(next) = next {
            self.line_mut(next).prev = prev;
        }
        let fallback = next.or(prev).unwrap_or(self.head);
        if self.head == id {
            self.head = fallback;
        }
        if self.top == id {
            self.top = fallback;
        }
        if self.tail == id {
            self.tail = prev.unwrap_or(fallback);
        }
        self.release(id);
        true
    }

    /// Append a line after the tail, numbering it from its predecessor.
    ///
    /// A list holding only the empty sentinel has it replaced instead.
    pub fn push_line(&mut self, text: &str, newline: bool) -> LineId {
        if self.head == self.tail && self.line(self.head).is_empty() {
            let id = self.head;
            let line = self.line_mut(id);
            line.text = text.to_string();
            line.chars = text.chars().count();
            line.newline = newline;
            return id;
        }
        let prev = self.tail;
        let mut line = Line::new(text, newline);
        line.prev = Some(prev);
        line.index = self.line(prev).index + 1;
        line.offset = self.line(prev).offset + self.line(prev).len();
        let id = self.alloc(line);
        self.line_mut(prev).next = Some(id);
        self.tail = id;
        id
    }

    /// Recompute `offset` and `index` from `from` to the end.
    pub fn renumber(&mut self, from: LineId) {
        let mut cur = Some(from);
        while let Some(id) = cur {
            self.renumber_one(id);
            cur = self.line(id).next;
        }
    }

    pub(crate) fn renumber_one(&mut self, id: LineId) {
        let (index, offset) = match self.line(id).prev {
            Some(prev) => {
                let prev = self.line(prev);
                (prev.index + 1, prev.offset + prev.len())
            }
            None => (0, 0),
        };
        let line = self.line_mut(id);
        line.index = index;
        line.offset = offset;
    }

    /// Sum of all line lengths.
    pub fn total_runes(&self) -> usize {
        let tail = self.line(self.tail);
        tail.offset + tail.len()
    }

    /// Check that every line's offset and index follow from its predecessors.
    pub fn offsets_consistent(&self) -> bool {
        let mut offset = 0;
        for (index, (_, line)) in self.iter().enumerate() {
            if line.offset != offset || line.index != index {
                return false;
            }
            offset += line.len();
        }
        true
    }
}
