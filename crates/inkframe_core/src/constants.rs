//! Shared constants used across inkframe crates.

/// Default wrap width, in monospace columns.
pub const DEFAULT_WRAP_COLUMNS: usize = 80;

/// Default tab stop used for tab expansion while measuring and rendering.
pub const DEFAULT_TABSTOP: usize = 4;

/// Environment variable overriding the wrap width (`0` disables wrapping).
pub const ENV_WRAP_COLUMNS: &str = "INKFRAME_WRAP_COLUMNS";
/// Environment variable overriding the tab stop.
pub const ENV_TABSTOP: &str = "INKFRAME_TABSTOP";
/// Environment flag selecting the extended word charset for word clicks.
pub const ENV_EXTENDED_WORDS: &str = "INKFRAME_EXTENDED_WORDS";
/// Environment flag enabling line-list dumps after each reformat.
pub const ENV_TRACE_FRAME: &str = "INKFRAME_TRACE_FRAME";

/// Mark names the authority uses to publish its view of the selection.
pub const SELECTION_MARK_P0: &str = "p0";
/// See [`SELECTION_MARK_P0`].
pub const SELECTION_MARK_P1: &str = "p1";

/// Opening bracket runes recognized by the word/bracket locator.
pub const OPEN_BRACKETS: &str = "([{<'`\"";
/// Closing bracket runes recognized by the word/bracket locator.
pub const CLOSE_BRACKETS: &str = ")]}>'`\"";
