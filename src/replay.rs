//! Replaying authority transcripts through a replica.
//!
//! A transcript holds one JSON [`Message`] per line. Blank lines and lines
//! starting with `#` are skipped.

use anyhow::{Context, Result};
use inkframe_sync::{ApplyOutcome, Message, Notice, Reconciler, SyncState};
use std::path::Path;
use tracing::debug;

/// What a replica did while consuming a transcript.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    /// Messages the replica addressed to the authority, in order.
    pub sent: Vec<Message>,
    /// Transcript index and outcome of every message that did not simply apply.
    pub outcomes: Vec<(usize, ApplyOutcome)>,
    pub notices: Vec<Notice>,
    pub text: String,
    pub version: u64,
    pub state: SyncState,
}

/// Parse transcript text into messages.
///
/// # Errors
/// Returns an error naming the line of the first undecodable message.
pub fn parse_transcript(text: &str) -> Result<Vec<Message>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| {
            Message::decode(line.trim()).with_context(|| format!("transcript line {}", n + 1))
        })
        .collect()
}

/// Read and parse a transcript file.
pub fn load_transcript(path: &Path) -> Result<Vec<Message>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read transcript {}", path.display()))?;
    parse_transcript(&text)
}

/// Apply `messages` in order, collecting everything the replica emits.
///
/// Output already queued on the replica (such as the `id` sent by
/// [`Reconciler::connect`]) is included at the front of the report.
pub fn replay(reconciler: &mut Reconciler, messages: &[Message]) -> ReplayReport {
    let mut sent = reconciler.drain_outbox();
    let mut notices = reconciler.drain_notices();
    let mut outcomes = Vec::new();
    for (index, msg) in messages.iter().enumerate() {
        let outcome = reconciler.apply(msg);
        if outcome != ApplyOutcome::Applied {
            debug!(index, ?outcome, "transcript message not applied");
            outcomes.push((index, outcome));
        }
        sent.extend(reconciler.drain_outbox());
        for notice in reconciler.drain_notices() {
            if !notices.contains(&notice) {
                notices.push(notice);
            }
        }
    }
    ReplayReport {
        sent,
        outcomes,
        notices,
        text: reconciler.frame().text(),
        version: reconciler.version(),
        state: reconciler.state(),
    }
}
