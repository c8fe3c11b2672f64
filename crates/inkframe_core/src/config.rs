//! Frame settings read from `INKFRAME_*` environment variables.

use crate::constants::{
    DEFAULT_TABSTOP, DEFAULT_WRAP_COLUMNS, ENV_EXTENDED_WORDS, ENV_TABSTOP, ENV_TRACE_FRAME,
    ENV_WRAP_COLUMNS,
};
use crate::frame::{ColumnWrap, NoWrap, WordCharset, WrapFn};
use serde::Deserialize;
use std::env;

/// Runtime configuration for a text frame replica.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FrameConfig {
    /// Wrap width in monospace columns; `0` disables soft wrapping.
    pub wrap_columns: usize,
    pub tabstop: usize,
    /// Use the extended word charset when selecting words.
    pub extended_words: bool,
    /// Dump the line list at `debug` level after every reformat.
    pub trace_frame: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            wrap_columns: DEFAULT_WRAP_COLUMNS,
            tabstop: DEFAULT_TABSTOP,
            extended_words: false,
            trace_frame: false,
        }
    }
}

/// Interpret a flag value; `None` when it is neither truthy nor falsy.
///
/// Accepts `1/true/yes/on` and `0/false/no/off` in any case, and treats an
/// empty value as off.
pub fn parse_flag(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.is_empty() {
        return Some(false);
    }
    let is = |words: [&str; 4]| words.iter().any(|w| value.eq_ignore_ascii_case(w));
    if is(["1", "true", "yes", "on"]) {
        Some(true)
    } else if is(["0", "false", "no", "off"]) {
        Some(false)
    } else {
        None
    }
}

impl FrameConfig {
    /// Read the `INKFRAME_*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str| {
            lookup(name)
                .and_then(|value| parse_flag(&value))
                .unwrap_or(false)
        };
        Self {
            wrap_columns: lookup(ENV_WRAP_COLUMNS)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_WRAP_COLUMNS),
            tabstop: lookup(ENV_TABSTOP)
                .and_then(|v| v.trim().parse().ok())
                .filter(|&t: &usize| t > 0)
                .unwrap_or(DEFAULT_TABSTOP),
            extended_words: flag(ENV_EXTENDED_WORDS),
            trace_frame: flag(ENV_TRACE_FRAME),
        }
    }

    /// Build the wrap function described by this configuration.
    pub fn wrap_fn(&self) -> Box<dyn WrapFn> {
        if self.wrap_columns == 0 {
            Box::new(NoWrap)
        } else {
            Box::new(ColumnWrap::new(self.wrap_columns, self.tabstop))
        }
    }

    pub fn word_charset(&self) -> WordCharset {
        WordCharset::from_flag(self.extended_words)
    }
}
