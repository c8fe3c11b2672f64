//! The rune-addressed text frame and its building blocks.
//!
//! [`TextFrame`] is the public surface; the line arena, reformatter, marks
//! and locator are exposed for renderers and tests that need to look inside.

mod line;
mod locate;
mod marks;
mod reformat;
mod selection;
mod text_frame;
mod wrap;

pub use line::{Line, LineId, LineList};
pub use locate::{closing_for, is_close, is_open, opening_for, CharClass, Located, WordCharset};
pub use marks::{adjust_for_delete, adjust_for_insert, Mark, MarkRegistry};
pub use reformat::Reformat;
pub use selection::Selection;
pub use text_frame::TextFrame;
pub use wrap::{expand_tabs, ColumnWrap, NoWrap, WrapFn};
