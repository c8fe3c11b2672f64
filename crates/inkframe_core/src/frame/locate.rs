//! Word and bracket span location for click selection.

use super::line::{LineId, LineList};
use crate::constants::{CLOSE_BRACKETS, OPEN_BRACKETS};

/// Classifies runes as word characters.
pub trait CharClass {
    fn is_word(&self, c: char) -> bool;
}

impl<F> CharClass for F
where
    F: Fn(char) -> bool,
{
    fn is_word(&self, c: char) -> bool {
        self(c)
    }
}

/// Built-in word charsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WordCharset {
    /// Alphanumerics and `_`.
    #[default]
    Plain,
    /// Plain plus `-(){}/.:#,`, so paths and addresses select whole.
    Extended,
}

impl WordCharset {
    pub fn from_flag(extended: bool) -> Self {
        if extended {
            Self::Extended
        } else {
            Self::Plain
        }
    }
}

impl CharClass for WordCharset {
    fn is_word(&self, c: char) -> bool {
        let plain = c.is_alphanumeric() || c == '_';
        match self {
            Self::Plain => plain,
            Self::Extended => plain || "-(){}/.:#,".contains(c),
        }
    }
}

pub fn is_open(c: char) -> bool {
    OPEN_BRACKETS.contains(c)
}

pub fn is_close(c: char) -> bool {
    CLOSE_BRACKETS.contains(c)
}

/// Closer matching `open`; quotes close themselves.
pub fn closing_for(open: char) -> char {
    OPEN_BRACKETS
        .chars()
        .position(|c| c == open)
        .and_then(|i| CLOSE_BRACKETS.chars().nth(i))
        .unwrap_or(open)
}

/// Opener matching `close`; quotes open themselves.
pub fn opening_for(close: char) -> char {
    CLOSE_BRACKETS
        .chars()
        .position(|c| c == close)
        .and_then(|i| OPEN_BRACKETS.chars().nth(i))
        .unwrap_or(close)
}

/// A located span: its text and rune bounds `start..end`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Located {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Located {
    fn empty(at: usize) -> Self {
        Self {
            text: String::new(),
            start: at,
            end: at,
        }
    }
}

impl LineList {
    fn lines_from(&self, id: LineId) -> impl Iterator<Item = LineId> + '_ {
        std::iter::successors(Some(id), move |&id| self.line(id).next())
    }

    /// Runes from `pos` to the end of the document, newlines included.
    pub(crate) fn runes_from(&self, pos: usize) -> impl Iterator<Item = char> + '_ {
        let start = self.seek(pos);
        start.into_iter().flat_map(move |(first, off)| {
            self.lines_from(first).enumerate().flat_map(move |(n, id)| {
                let line = self.line(id);
                let skip = if n == 0 { off } else { 0 };
                line.text()
                    .chars()
                    .skip(skip)
                    .chain(line.has_newline().then_some('\n'))
            })
        })
    }

    /// Runes before `pos`, nearest first.
    pub(crate) fn runes_before(&self, pos: usize) -> impl Iterator<Item = char> + '_ {
        let start = self.seek(pos);
        start.into_iter().flat_map(move |(first, off)| {
            let line = self.line(first);
            let own = line.text().chars().rev().skip(line.text_len() - off);
            let earlier = std::iter::successors(line.prev(), move |&id| self.line(id).prev())
                .flat_map(move |id| {
                    let line = self.line(id);
                    line.has_newline()
                        .then_some('\n')
                        .into_iter()
                        .chain(line.text().chars().rev())
                });
            own.chain(earlier)
        })
    }

    /// Extend `pos` into the enclosing word or bracketed span.
    ///
    /// A click just right of an opening bracket selects the bracketed group.
    /// Bracket spans exclude the brackets themselves and may cross lines;
    /// an unbalanced span runs to the document edge.
    pub fn locate(&self, pos: usize, class: &dyn CharClass) -> Located {
        let total = self.total_runes();
        if pos >= total {
            return Located::empty(total);
        }
        let Some((id, mut off)) = self.seek(pos) else {
            return Located::empty(total);
        };
        let line = self.line(id);
        let chars: Vec<char> = line.text().chars().collect();
        if off >= chars.len() {
            let mut text = line.text().to_string();
            if line.has_newline() {
                text.push('\n');
            }
            return Located {
                text,
                start: line.offset(),
                end: line.offset() + line.len(),
            };
        }
        if off > 0 && !is_close(chars[off]) && is_open(chars[off - 1]) {
            off -= 1;
        }
        let at = line.offset() + off;
        let c = chars[off];

        if is_open(c) {
            return self.scan_forward(at, c);
        }
        if is_close(c) {
            return self.scan_backward(at, c);
        }
        if !class.is_word(c) {
            return Located::empty(at);
        }
        let mut p0 = off;
        while p0 > 0 && class.is_word(chars[p0 - 1]) {
            p0 -= 1;
        }
        let mut p1 = off;
        while p1 < chars.len() && class.is_word(chars[p1]) {
            p1 += 1;
        }
        Located {
            text: chars[p0..p1].iter().collect(),
            start: line.offset() + p0,
            end: line.offset() + p1,
        }
    }

    fn scan_forward(&self, at: usize, open: char) -> Located {
        let close = closing_for(open);
        let start = at + 1;
        let mut depth = 1usize;
        let mut text = String::new();
        for (i, x) in self.runes_from(start).enumerate() {
            if x == close {
                depth -= 1;
            } else if x == open {
                depth += 1;
            }
            if depth == 0 {
                return Located {
                    text,
                    start,
                    end: start + i,
                };
            }
            text.push(x);
        }
        let end = start + text.chars().count();
        Located { text, start, end }
    }

    fn scan_backward(&self, at: usize, close: char) -> Located {
        let open = opening_for(close);
        let mut depth = 1usize;
        let mut rev = Vec::new();
        for x in self.runes_before(at) {
            if x == open {
                depth -= 1;
            } else if x == close {
                depth += 1;
            }
            if depth == 0 {
                break;
            }
            rev.push(x);
        }
        Located {
            start: at - rev.len(),
            text: rev.into_iter().rev().collect(),
            end: at,
        }
    }
}
