//! Width collaborators deciding where physical lines break.

use unicode_width::UnicodeWidthChar;

/// Decides the soft-wrap boundary of a line of text.
///
/// Implementations must be greedy: if a prefix of a text overflows, every
/// longer text sharing that prefix overflows at the same rune.
pub trait WrapFn: Send {
    /// Rune index at which `text` must break, or its rune length if it fits.
    fn wrap_offset(&self, text: &str) -> usize;
}

impl<F> WrapFn for F
where
    F: Fn(&str) -> usize + Send,
{
    fn wrap_offset(&self, text: &str) -> usize {
        self(text)
    }
}

/// Never wraps.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoWrap;

impl WrapFn for NoWrap {
    fn wrap_offset(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// Monospace column wrapping with tab expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnWrap {
    columns: usize,
    tabstop: usize,
}

impl ColumnWrap {
    pub fn new(columns: usize, tabstop: usize) -> Self {
        Self {
            columns: columns.max(1),
            tabstop: tabstop.max(1),
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }
}

impl WrapFn for ColumnWrap {
    fn wrap_offset(&self, text: &str) -> usize {
        let mut column = 0usize;
        let mut count = 0usize;
        for (i, c) in text.chars().enumerate() {
            column = advance_column(column, c, self.tabstop);
            if column > self.columns {
                // keep at least one rune per row
                return i.max(1);
            }
            count = i + 1;
        }
        count
    }
}

fn advance_column(column: usize, c: char, tabstop: usize) -> usize {
    if c == '\t' {
        (column / tabstop + 1) * tabstop
    } else {
        column + c.width().unwrap_or(0)
    }
}

/// Expand tabs to spaces, starting at display column `start_column`.
pub fn expand_tabs(text: &str, start_column: usize, tabstop: usize) -> String {
    if !text.contains('\t') {
        return text.to_string();
    }
    let tabstop = tabstop.max(1);
    let mut out = String::with_capacity(text.len());
    let mut column = start_column;
    for c in text.chars() {
        if c == '\t' {
            let next = advance_column(column, c, tabstop);
            out.extend(std::iter::repeat(' ').take(next - column));
            column = next;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}
