//! Buffer core for inkframe (line list, reformatter, marks, locator).

/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Frame error types.
pub mod error;
/// Line list, reformatter, marks, selection and word/bracket locator.
pub mod frame;

pub use config::FrameConfig;
pub use error::FrameError;
pub use frame::{Located, Selection, TextFrame, WordCharset};
