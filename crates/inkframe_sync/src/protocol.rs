//! Wire records exchanged with the remote authority and their typed commands.

use inkframe_core::FrameError;
use serde::{Deserialize, Serialize};

/// One message on the channel, in either direction.
///
/// The first argument is the command name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    /// Document (session) identifier.
    #[serde(default)]
    pub id: String,
    /// Endpoint that produced the message.
    #[serde(default)]
    pub src: String,
    /// Sender's document version; `0` means unversioned.
    #[serde(default)]
    pub vers: u64,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Message {
    pub fn new(id: impl Into<String>, src: impl Into<String>, vers: u64, args: Vec<String>) -> Self {
        Self {
            id: id.into(),
            src: src.into(),
            vers,
            args,
        }
    }

    /// Command name, if any arguments are present.
    pub fn command(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn encode(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Argument accessor that reports short or malformed commands.
struct Args<'a> {
    args: &'a [String],
}

impl<'a> Args<'a> {
    fn new(args: &'a [String]) -> Result<Self, FrameError> {
        if args.is_empty() {
            return Err(FrameError::ShortCommand {
                command: String::new(),
                expected: 1,
                got: 0,
            });
        }
        Ok(Self { args })
    }

    fn name(&self) -> &'a str {
        &self.args[0]
    }

    /// Require `n` arguments after the command name.
    fn require(&self, n: usize) -> Result<(), FrameError> {
        let got = self.args.len() - 1;
        if got < n {
            return Err(FrameError::ShortCommand {
                command: self.name().to_string(),
                expected: n,
                got,
            });
        }
        Ok(())
    }

    fn text(&self, i: usize) -> String {
        self.args[i].clone()
    }

    fn number<T: std::str::FromStr>(&self, i: usize) -> Result<T, FrameError> {
        self.args[i]
            .trim()
            .parse()
            .map_err(|_| FrameError::BadNumber {
                command: self.name().to_string(),
                value: self.args[i].clone(),
            })
    }
}

/// Commands the authority sends to a replica.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Lock granted.
    Held,
    /// Lock revoked.
    Rlse,
    NoEdits,
    Edits,
    Insert { text: String, pos: usize },
    /// One fragment of a batched insert.
    Inserting { fragment: String },
    InsertDone { pos: usize },
    Delete { p0: usize, p1: usize },
    Cut { p0: usize, p1: usize },
    /// One fragment of a batched insert anchored at a mark.
    MarkInserting { mark: String, fragment: String },
    MarkInsertDone { mark: String },
    Mark { name: String, pos: usize },
    DelMark { name: String },
    Sel { p0: usize, p1: usize },
    Reload,
    Reloading { line: String },
    Reloaded { version: u64 },
    Close,
    /// Renderer chrome the buffer does not model (`clean`, `dirty`, `tag`, ...).
    Other(String),
}

impl RemoteCommand {
    pub fn parse(args: &[String]) -> Result<Self, FrameError> {
        let a = Args::new(args)?;
        let cmd = match a.name() {
            "held" => Self::Held,
            "rlse" => Self::Rlse,
            "noedits" => Self::NoEdits,
            "edits" => Self::Edits,
            "eins" => {
                a.require(2)?;
                Self::Insert {
                    text: a.text(1),
                    pos: a.number(2)?,
                }
            }
            "einsing" => {
                a.require(1)?;
                Self::Inserting {
                    fragment: a.text(1),
                }
            }
            "einsdone" => {
                a.require(1)?;
                Self::InsertDone { pos: a.number(1)? }
            }
            "edel" => {
                a.require(2)?;
                Self::Delete {
                    p0: a.number(1)?,
                    p1: a.number(2)?,
                }
            }
            "ecut" => {
                a.require(2)?;
                Self::Cut {
                    p0: a.number(1)?,
                    p1: a.number(2)?,
                }
            }
            "markinsing" => {
                a.require(2)?;
                Self::MarkInserting {
                    mark: a.text(1),
                    fragment: a.text(2),
                }
            }
            "markinsdone" => {
                a.require(1)?;
                Self::MarkInsertDone { mark: a.text(1) }
            }
            "mark" => {
                a.require(2)?;
                Self::Mark {
                    name: a.text(1),
                    pos: a.number(2)?,
                }
            }
            "delmark" => {
                a.require(1)?;
                Self::DelMark { name: a.text(1) }
            }
            "sel" => {
                a.require(2)?;
                Self::Sel {
                    p0: a.number(1)?,
                    p1: a.number(2)?,
                }
            }
            "reload" => Self::Reload,
            "reloading" => {
                a.require(1)?;
                Self::Reloading { line: a.text(1) }
            }
            "reloaded" => {
                a.require(1)?;
                Self::Reloaded {
                    version: a.number(1)?,
                }
            }
            "close" => Self::Close,
            other => Self::Other(other.to_string()),
        };
        Ok(cmd)
    }

    /// Commands that change document content; suppressed while a reload
    /// is pending.
    pub fn is_content_edit(&self) -> bool {
        matches!(
            self,
            Self::Insert { .. }
                | Self::InsertDone { .. }
                | Self::Delete { .. }
                | Self::Cut { .. }
                | Self::MarkInsertDone { .. }
        )
    }
}

/// Commands a replica sends to the authority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocalCommand {
    /// Announce the replica once the channel opens.
    Id,
    /// Request the edit lock.
    Hold,
    /// Publish the current selection.
    Tick { p0: usize, p1: usize },
    /// Acknowledge a lock release.
    Rlsed,
    Insert { text: String, pos: usize },
    Delete { p0: usize, p1: usize },
    Cut { p0: usize, p1: usize },
    Paste { p0: usize, p1: usize },
    Copy { p0: usize, p1: usize },
    Undo,
    Redo,
    /// Word or bracket span picked by a click.
    Click1 { word: String, p0: usize, p1: usize },
    Intr { reason: String },
    NeedReload,
}

impl LocalCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Hold => "hold",
            Self::Tick { .. } => "tick",
            Self::Rlsed => "rlsed",
            Self::Insert { .. } => "eins",
            Self::Delete { .. } => "edel",
            Self::Cut { .. } => "ecut",
            Self::Paste { .. } => "epaste",
            Self::Copy { .. } => "ecopy",
            Self::Undo => "eundo",
            Self::Redo => "eredo",
            Self::Click1 { .. } => "click1",
            Self::Intr { .. } => "intr",
            Self::NeedReload => "needreload",
        }
    }

    /// Commands that advance the sender's version before they are sent.
    pub fn advances_version(&self) -> bool {
        matches!(self, Self::Insert { .. } | Self::Delete { .. })
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![self.name().to_string()];
        match self {
            Self::Insert { text, pos } => {
                args.push(text.clone());
                args.push(pos.to_string());
            }
            Self::Tick { p0, p1 }
            | Self::Delete { p0, p1 }
            | Self::Cut { p0, p1 }
            | Self::Paste { p0, p1 }
            | Self::Copy { p0, p1 } => {
                args.push(p0.to_string());
                args.push(p1.to_string());
            }
            Self::Click1 { word, p0, p1 } => {
                args.push(word.clone());
                args.push(p0.to_string());
                args.push(p1.to_string());
            }
            Self::Intr { reason } => args.push(reason.clone()),
            Self::Id | Self::Hold | Self::Rlsed | Self::Undo | Self::Redo | Self::NeedReload => {}
        }
        args
    }

    /// Parse a replica-produced command, as an authority would.
    pub fn parse(args: &[String]) -> Result<Self, FrameError> {
        let a = Args::new(args)?;
        let pair = |a: &Args<'_>| -> Result<(usize, usize), FrameError> {
            a.require(2)?;
            Ok((a.number(1)?, a.number(2)?))
        };
        let cmd = match a.name() {
            "id" => Self::Id,
            "hold" => Self::Hold,
            "rlsed" => Self::Rlsed,
            "eundo" => Self::Undo,
            "eredo" => Self::Redo,
            "needreload" => Self::NeedReload,
            "tick" => {
                let (p0, p1) = pair(&a)?;
                Self::Tick { p0, p1 }
            }
            "edel" => {
                let (p0, p1) = pair(&a)?;
                Self::Delete { p0, p1 }
            }
            "ecut" => {
                let (p0, p1) = pair(&a)?;
                Self::Cut { p0, p1 }
            }
            "epaste" => {
                let (p0, p1) = pair(&a)?;
                Self::Paste { p0, p1 }
            }
            "ecopy" => {
                let (p0, p1) = pair(&a)?;
                Self::Copy { p0, p1 }
            }
            "eins" => {
                a.require(2)?;
                Self::Insert {
                    text: a.text(1),
                    pos: a.number(2)?,
                }
            }
            "click1" => {
                a.require(3)?;
                Self::Click1 {
                    word: a.text(1),
                    p0: a.number(2)?,
                    p1: a.number(3)?,
                }
            }
            "intr" => {
                a.require(1)?;
                Self::Intr { reason: a.text(1) }
            }
            other => {
                return Err(FrameError::UnknownCommand {
                    command: other.to_string(),
                })
            }
        };
        Ok(cmd)
    }
}
