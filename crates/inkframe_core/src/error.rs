//! Error taxonomy for the buffer core and the sync protocol.
use thiserror::Error;

/// Top-level error type for frame and protocol failures.
///
/// None of these are fatal: callers log them and degrade to a no-op or a
/// reload request.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("short command '{command}': expected {expected} arguments, got {got}")]
    ShortCommand {
        command: String,
        expected: usize,
        got: usize,
    },

    #[error("command '{command}': bad number '{value}'")]
    BadNumber { command: String, value: String },

    #[error("version conflict: local {local}, remote {remote}")]
    VersionConflict { local: u64, remote: u64 },

    #[error("unknown command '{command}'")]
    UnknownCommand { command: String },

    #[error("no line contains position {pos}")]
    NoLineAt { pos: usize },

    #[error("no mark named '{name}'")]
    UnknownMark { name: String },

    #[error("wire error: {0}")]
    Wire(#[from] serde_json::Error),
}
