//! Replica reconciler: lock gating, optimistic local edits and versioned
//! application of authority commands.
//!
//! The reconciler never blocks on the authority. Local edits apply at once
//! and are sent with the advanced version; remote edits apply only when they
//! carry exactly the next version, otherwise the replica asks for a reload.

use crate::protocol::{LocalCommand, Message, RemoteCommand};
use inkframe_core::constants::{SELECTION_MARK_P0, SELECTION_MARK_P1};
use inkframe_core::frame::{Selection, TextFrame, WordCharset};
use inkframe_core::{FrameConfig, FrameError};
use tracing::{debug, warn};

/// Editing state as seen by the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// Lock requested; intents are queued.
    AwaitingLock,
    Locked,
    /// Replica known stale; content edits are dropped until reloaded.
    ///
    /// Overlays the lock: once reloaded, the replica reports whatever lock
    /// state it kept (`Locked` if it still holds the lock).
    ReloadPending,
}

/// What happened to a remote command or user intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Held until a lock grant or a batch terminator arrives.
    Buffered,
    /// Dropped: malformed, suppressed or not modelled.
    Ignored,
    /// Version conflict; a reload was requested.
    ReloadRequested,
}

/// User-originated actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Replace the selection with typed text.
    Type(String),
    /// Delete the selection, or the rune before the caret.
    Backspace,
    Cut,
    Copy,
    Paste,
    Undo,
    Redo,
    Select { p0: usize, p1: usize },
    /// Select the word or bracketed span around `pos`.
    SelectWord { pos: usize, extended: bool },
    /// Interrupt the authority (`esc`, `del`); needs no lock.
    Interrupt(String),
}

impl Intent {
    pub fn is_content_edit(&self) -> bool {
        matches!(
            self,
            Self::Type(_) | Self::Backspace | Self::Cut | Self::Paste | Self::Undo | Self::Redo
        )
    }

    fn needs_lock(&self) -> bool {
        !matches!(self, Self::Interrupt(_))
    }
}

/// Advisory notices for the rendering collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    Redraw,
    /// Recompute the display size; only sent until the user resizes.
    AutoResize,
    ShowSelection,
    ConnectionClosed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LockState {
    Unlocked,
    Requested,
    Held,
}

/// One replica of a shared document.
#[derive(Debug)]
pub struct Reconciler {
    doc_id: String,
    replica_id: String,
    frame: TextFrame,
    charset: WordCharset,
    version: u64,
    lock: LockState,
    reload_pending: bool,
    queue: Vec<Intent>,
    insert_batch: Vec<String>,
    mark_batch: Vec<String>,
    editable: bool,
    user_resized: bool,
    selecting: bool,
    must_unlock: bool,
    drag_start: Selection,
    reload_top: Option<usize>,
    outbox: Vec<Message>,
    notices: Vec<Notice>,
}

impl Reconciler {
    pub fn new(doc_id: impl Into<String>, replica_id: impl Into<String>, frame: TextFrame) -> Self {
        Self {
            doc_id: doc_id.into(),
            replica_id: replica_id.into(),
            frame,
            charset: WordCharset::Plain,
            version: 0,
            lock: LockState::Unlocked,
            reload_pending: false,
            queue: Vec::new(),
            insert_batch: Vec::new(),
            mark_batch: Vec::new(),
            editable: true,
            user_resized: false,
            selecting: false,
            must_unlock: false,
            drag_start: Selection::default(),
            reload_top: None,
            outbox: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn from_config(
        doc_id: impl Into<String>,
        replica_id: impl Into<String>,
        config: &FrameConfig,
    ) -> Self {
        let mut reconciler = Self::new(doc_id, replica_id, TextFrame::from_config(config));
        reconciler.charset = config.word_charset();
        reconciler
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn replica_id(&self) -> &str {
        &self.replica_id
    }

    pub fn frame(&self) -> &TextFrame {
        &self.frame
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn state(&self) -> SyncState {
        if self.reload_pending {
            return SyncState::ReloadPending;
        }
        match self.lock {
            LockState::Unlocked => SyncState::Idle,
            LockState::Requested => SyncState::AwaitingLock,
            LockState::Held => SyncState::Locked,
        }
    }

    /// Number of intents waiting for the lock.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Messages produced since the last drain, in send order.
    pub fn drain_outbox(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.outbox)
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Announce this replica on a freshly opened channel.
    pub fn connect(&mut self) {
        self.post(LocalCommand::Id);
    }

    /// The user sized the view by hand; stop auto-resizing.
    pub fn user_resized(&mut self) {
        self.user_resized = true;
    }

    fn post(&mut self, cmd: LocalCommand) {
        if cmd.advances_version() {
            self.version += 1;
        }
        let msg = Message::new(
            self.doc_id.clone(),
            self.replica_id.clone(),
            self.version,
            cmd.to_args(),
        );
        debug!(doc = %self.doc_id, vers = msg.vers, args = ?msg.args, "post");
        self.outbox.push(msg);
    }

    fn notify(&mut self, notice: Notice) {
        if !self.notices.contains(&notice) {
            self.notices.push(notice);
        }
    }

    fn auto_resize(&mut self) {
        if !self.user_resized {
            self.notify(Notice::AutoResize);
        }
    }

    fn edit_block(&self) -> Option<&'static str> {
        if self.reload_pending {
            Some("reload pending")
        } else if !self.editable {
            Some("not editable")
        } else {
            None
        }
    }

    /// Handle a user intent, requesting the lock first when needed.
    pub fn intent(&mut self, intent: Intent) -> ApplyOutcome {
        if intent.is_content_edit() {
            if let Some(reason) = self.edit_block() {
                debug!(?intent, reason, "dropping edit");
                return ApplyOutcome::Ignored;
            }
        }
        if !intent.needs_lock() {
            return self.perform(intent);
        }
        match self.lock {
            LockState::Held => self.perform(intent),
            LockState::Requested => {
                self.queue.push(intent);
                ApplyOutcome::Buffered
            }
            LockState::Unlocked => {
                self.post(LocalCommand::Hold);
                self.lock = LockState::Requested;
                self.queue.push(intent);
                ApplyOutcome::Buffered
            }
        }
    }

    fn perform(&mut self, intent: Intent) -> ApplyOutcome {
        if intent.is_content_edit() {
            if let Some(reason) = self.edit_block() {
                debug!(?intent, reason, "dropping queued edit");
                return ApplyOutcome::Ignored;
            }
        }
        let result = match intent {
            Intent::Type(text) => self.type_text(text),
            Intent::Backspace => self.backspace(),
            Intent::Cut => self.cut(),
            Intent::Copy => {
                let sel = self.frame.selection();
                self.post(LocalCommand::Copy {
                    p0: sel.p0,
                    p1: sel.p1,
                });
                Ok(ApplyOutcome::Applied)
            }
            Intent::Paste => self.paste(),
            Intent::Undo => {
                self.post(LocalCommand::Undo);
                Ok(ApplyOutcome::Applied)
            }
            Intent::Redo => {
                self.post(LocalCommand::Redo);
                Ok(ApplyOutcome::Applied)
            }
            Intent::Select { p0, p1 } => {
                self.select(p0, p1);
                Ok(ApplyOutcome::Applied)
            }
            Intent::SelectWord { pos, extended } => {
                self.select_word(pos, extended);
                Ok(ApplyOutcome::Applied)
            }
            Intent::Interrupt(reason) => {
                self.post(LocalCommand::Intr { reason });
                Ok(ApplyOutcome::Applied)
            }
        };
        result.unwrap_or_else(|err| {
            warn!(doc = %self.doc_id, error = %err, "local edit abandoned");
            ApplyOutcome::Ignored
        })
    }

    fn type_text(&mut self, text: String) -> Result<ApplyOutcome, FrameError> {
        if text.is_empty() {
            return Ok(ApplyOutcome::Ignored);
        }
        let sel = self.frame.selection();
        if !sel.is_caret() {
            self.post(LocalCommand::Delete {
                p0: sel.p0,
                p1: sel.p1,
            });
            self.frame.delete_range(sel.p0, sel.p1)?;
        }
        self.post(LocalCommand::Insert {
            text: text.clone(),
            pos: sel.p0,
        });
        self.frame.insert_at(&text, sel.p0)?;
        self.notify(Notice::Redraw);
        if text.contains('\n') {
            self.auto_resize();
        }
        Ok(ApplyOutcome::Applied)
    }

    fn backspace(&mut self) -> Result<ApplyOutcome, FrameError> {
        let sel = self.frame.selection();
        let (p0, p1) = if !sel.is_caret() {
            (sel.p0, sel.p1)
        } else if sel.p0 > 0 {
            (sel.p0 - 1, sel.p0)
        } else {
            return Ok(ApplyOutcome::Ignored);
        };
        self.post(LocalCommand::Delete { p0, p1 });
        self.frame.delete_range(p0, p1)?;
        self.notify(Notice::Redraw);
        Ok(ApplyOutcome::Applied)
    }

    fn cut(&mut self) -> Result<ApplyOutcome, FrameError> {
        let sel = self.frame.selection();
        self.post(LocalCommand::Cut {
            p0: sel.p0,
            p1: sel.p1,
        });
        // the authority counts a cut as a delete, even an empty one
        self.version += 1;
        if !sel.is_caret() {
            self.frame.delete_range(sel.p0, sel.p1)?;
            self.notify(Notice::Redraw);
        }
        Ok(ApplyOutcome::Applied)
    }

    /// Replace the selection with the authority's snarf buffer.
    ///
    /// The selection is deleted here; the pasted text arrives as an `eins`.
    fn paste(&mut self) -> Result<ApplyOutcome, FrameError> {
        let sel = self.frame.selection();
        if !sel.is_caret() {
            self.post(LocalCommand::Delete {
                p0: sel.p0,
                p1: sel.p1,
            });
            self.frame.delete_range(sel.p0, sel.p1)?;
            self.notify(Notice::Redraw);
        }
        self.post(LocalCommand::Paste {
            p0: sel.p0,
            p1: sel.p1,
        });
        Ok(ApplyOutcome::Applied)
    }

    fn select(&mut self, p0: usize, p1: usize) {
        let before = self.frame.selection();
        self.frame.set_selection(p0, p1);
        let after = self.frame.selection();
        if after != before {
            self.notify(Notice::Redraw);
            if !self.selecting {
                self.post(LocalCommand::Tick {
                    p0: after.p0,
                    p1: after.p1,
                });
            }
        }
    }

    fn select_word(&mut self, pos: usize, extended: bool) {
        let charset = if extended {
            WordCharset::Extended
        } else {
            self.charset
        };
        let found = self.frame.locate(pos, &charset);
        self.frame.set_selection(found.start, found.end);
        self.notify(Notice::Redraw);
        self.post(LocalCommand::Click1 {
            word: found.text,
            p0: found.start,
            p1: found.end,
        });
    }

    /// Start a pointer drag; ticks and lock releases wait for its end.
    pub fn begin_selection(&mut self) {
        self.selecting = true;
        self.drag_start = self.frame.selection();
    }

    /// Finish a pointer drag, publishing the selection if it moved.
    pub fn end_selection(&mut self) {
        if self.selecting {
            self.selecting = false;
            let sel = self.frame.selection();
            if sel != self.drag_start {
                self.post(LocalCommand::Tick {
                    p0: sel.p0,
                    p1: sel.p1,
                });
                if !sel.is_caret() {
                    self.post(LocalCommand::Click1 {
                        word: self.frame.get(sel.p0, sel.p1),
                        p0: sel.p0,
                        p1: sel.p1,
                    });
                }
                self.drag_start = sel;
            }
        }
        if self.must_unlock {
            self.unlock();
        }
    }

    fn unlock(&mut self) {
        self.lock = LockState::Unlocked;
        self.must_unlock = false;
        if !self.queue.is_empty() {
            debug!(dropped = self.queue.len(), "lock released with queued intents");
            self.queue.clear();
        }
        let sel = self.frame.selection();
        self.post(LocalCommand::Tick {
            p0: sel.p0,
            p1: sel.p1,
        });
        self.post(LocalCommand::Rlsed);
        // a remote insert must not land inside a stale selection
        if !sel.is_caret() {
            self.frame.set_selection(sel.p0, sel.p0);
            self.notify(Notice::Redraw);
        }
    }

    /// Apply one authority message.
    ///
    /// Malformed or inconsistent commands are logged and dropped; nothing
    /// here fails past this call.
    pub fn apply(&mut self, msg: &Message) -> ApplyOutcome {
        match self.apply_remote(msg) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(doc = %self.doc_id, src = %msg.src, error = %err, "dropping remote command");
                ApplyOutcome::Ignored
            }
        }
    }

    fn apply_remote(&mut self, msg: &Message) -> Result<ApplyOutcome, FrameError> {
        let cmd = RemoteCommand::parse(&msg.args)?;
        if !matches!(cmd, RemoteCommand::Reloading { .. }) {
            debug!(doc = %self.doc_id, args = ?msg.args, vers = msg.vers, local = self.version, "apply");
        }
        if cmd.is_content_edit() && self.reload_pending {
            debug!(doc = %self.doc_id, "content edit while reload pending");
            if matches!(cmd, RemoteCommand::InsertDone { .. }) {
                self.insert_batch.clear();
            }
            return Ok(ApplyOutcome::Ignored);
        }

        match cmd {
            RemoteCommand::Held => {
                if self.lock != LockState::Requested {
                    debug!(doc = %self.doc_id, "unsolicited lock grant");
                    return Ok(ApplyOutcome::Ignored);
                }
                self.lock = LockState::Held;
                for intent in std::mem::take(&mut self.queue) {
                    self.perform(intent);
                }
            }
            RemoteCommand::Rlse => {
                if self.selecting {
                    self.must_unlock = true;
                    return Ok(ApplyOutcome::Buffered);
                }
                self.unlock();
            }
            RemoteCommand::NoEdits => self.editable = false,
            RemoteCommand::Edits => self.editable = true,
            RemoteCommand::Insert { text, pos } => {
                if let Some(outcome) = self.check_version(msg.vers) {
                    return Ok(outcome);
                }
                self.remote_insert(std::slice::from_ref(&text), pos)?;
                self.adopt_version(msg.vers);
                if text.contains('\n') {
                    self.auto_resize();
                }
            }
            RemoteCommand::Inserting { fragment } => {
                self.insert_batch.push(fragment);
                return Ok(ApplyOutcome::Buffered);
            }
            RemoteCommand::InsertDone { pos } => {
                let batch = std::mem::take(&mut self.insert_batch);
                if let Some(outcome) = self.check_version(msg.vers) {
                    return Ok(outcome);
                }
                self.remote_insert(&batch, pos)?;
                self.adopt_version(msg.vers);
                self.auto_resize();
            }
            RemoteCommand::Delete { p0, p1 } => {
                if let Some(outcome) = self.check_version(msg.vers) {
                    return Ok(outcome);
                }
                self.remote_delete(p0, p1)?;
                self.adopt_version(msg.vers);
            }
            RemoteCommand::Cut { p0, p1 } => {
                self.remote_delete(p0, p1)?;
                self.adopt_version(msg.vers);
            }
            RemoteCommand::MarkInserting { fragment, .. } => {
                self.mark_batch.push(fragment);
                return Ok(ApplyOutcome::Buffered);
            }
            RemoteCommand::MarkInsertDone { mark } => {
                let batch = std::mem::take(&mut self.mark_batch);
                self.mark_insert(&mark, &batch)?;
                self.adopt_version(msg.vers);
                self.auto_resize();
            }
            RemoteCommand::Mark { name, pos } => self.frame.marks_mut().set(&name, pos),
            RemoteCommand::DelMark { name } => {
                if !self.frame.marks_mut().remove(&name) {
                    debug!(doc = %self.doc_id, mark = %name, "delmark: no such mark");
                }
            }
            RemoteCommand::Sel { p0, p1 } => {
                let marks = self.frame.marks_mut();
                marks.set(SELECTION_MARK_P0, p0);
                marks.set(SELECTION_MARK_P1, p1);
                self.frame.set_selection(p0, p1);
                self.notify(Notice::ShowSelection);
                self.notify(Notice::Redraw);
            }
            RemoteCommand::Reload => {
                self.reload_top = Some(self.frame.top_line());
                self.frame.clear();
                self.insert_batch.clear();
                self.mark_batch.clear();
                self.reload_pending = true;
            }
            RemoteCommand::Reloading { line } => {
                if !self.reload_pending {
                    debug!(doc = %self.doc_id, "reloading outside a reload");
                    return Ok(ApplyOutcome::Ignored);
                }
                self.frame.push_line(&line, true);
            }
            RemoteCommand::Reloaded { version } => {
                if version < self.version {
                    warn!(
                        doc = %self.doc_id,
                        local = self.version,
                        remote = version,
                        "reload moves version backwards"
                    );
                }
                self.version = version;
                self.frame.reformat_all();
                if let Some(top) = self.reload_top.take() {
                    self.frame.set_top_line(top);
                }
                // any held lock survives the reload
                self.reload_pending = false;
                self.notify(Notice::Redraw);
                self.auto_resize();
            }
            RemoteCommand::Close => self.notify(Notice::ConnectionClosed),
            RemoteCommand::Other(name) => {
                debug!(doc = %self.doc_id, command = %name, "not handled");
                return Ok(ApplyOutcome::Ignored);
            }
        }
        Ok(ApplyOutcome::Applied)
    }

    /// `Some` when `vers` does not follow the local version; a reload has
    /// then been requested.
    fn check_version(&mut self, vers: u64) -> Option<ApplyOutcome> {
        if vers == 0 || vers == self.version + 1 {
            return None;
        }
        let err = FrameError::VersionConflict {
            local: self.version,
            remote: vers,
        };
        warn!(
            doc = %self.doc_id,
            local = self.version,
            remote = vers,
            "{}; requesting reload",
            err
        );
        self.post(LocalCommand::NeedReload);
        self.reload_pending = true;
        Some(ApplyOutcome::ReloadRequested)
    }

    fn adopt_version(&mut self, vers: u64) {
        if vers != 0 {
            self.version = vers;
        }
    }

    fn remote_insert(&mut self, fragments: &[String], pos: usize) -> Result<(), FrameError> {
        let before = self.frame.selection();
        let mut sel = before;
        let mut at = pos.min(self.frame.total_runes());
        for fragment in fragments.iter().filter(|f| !f.is_empty()) {
            let count = fragment.chars().count();
            self.frame.insert_at(fragment, at)?;
            sel = sel.map_insert(at, count);
            at += count;
        }
        self.frame.set_selection(sel.p0, sel.p1);
        self.notify(Notice::Redraw);
        self.resend_selection(before);
        Ok(())
    }

    fn remote_delete(&mut self, p0: usize, p1: usize) -> Result<(), FrameError> {
        let before = self.frame.selection();
        let p1 = p1.min(self.frame.total_runes());
        self.frame.delete_range(p0, p1)?;
        let sel = if p0 < p1 {
            before.map_delete(p0, p1)
        } else {
            before
        };
        self.frame.set_selection(sel.p0, sel.p1);
        self.notify(Notice::Redraw);
        self.resend_selection(before);
        Ok(())
    }

    fn mark_insert(&mut self, mark: &str, batch: &[String]) -> Result<(), FrameError> {
        let Some(mut at) = self.frame.marks().get(mark) else {
            return Err(FrameError::UnknownMark {
                name: mark.to_string(),
            });
        };
        let before = self.frame.selection();
        let mut sel = before;
        for fragment in batch.iter().filter(|f| !f.is_empty()) {
            let count = fragment.chars().count();
            self.frame.insert_at(fragment, at)?;
            sel = sel.map_insert(at, count);
            at += count;
            self.frame.marks_mut().set(mark, at);
        }
        self.frame.set_selection(sel.p0, sel.p1);
        self.notify(Notice::Redraw);
        self.resend_selection(before);
        Ok(())
    }

    /// Re-announce our selection after a remote edit moved it, but only
    /// while we hold the lock.
    fn resend_selection(&mut self, before: Selection) {
        let after = self.frame.selection();
        if self.lock == LockState::Held && after != before {
            self.post(LocalCommand::Tick {
                p0: after.p0,
                p1: after.p1,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkframe_core::frame::NoWrap;

    fn msg(vers: u64, args: &[&str]) -> Message {
        Message::new(
            "doc",
            "",
            vers,
            args.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn commands(out: &[Message]) -> Vec<Vec<String>> {
        out.iter().map(|m| m.args.clone()).collect()
    }

    /// A replica holding `lines` at `version`, unlocked.
    fn loaded(lines: &[&str], version: u64) -> Reconciler {
        let mut r = Reconciler::new("doc", "v1", TextFrame::new(Box::new(NoWrap)));
        r.apply(&msg(0, &["reload"]));
        for line in lines {
            r.apply(&msg(0, &["reloading", line]));
        }
        let vers = version.to_string();
        r.apply(&msg(0, &["reloaded", vers.as_str()]));
        r.drain_outbox();
        r.drain_notices();
        r
    }

    fn locked(lines: &[&str], version: u64) -> Reconciler {
        let mut r = loaded(lines, version);
        r.intent(Intent::Select { p0: 0, p1: 0 });
        r.apply(&msg(0, &["held"]));
        r.drain_outbox();
        r.drain_notices();
        r
    }

    #[test]
    fn reload_sequence_loads_document() {
        let r = loaded(&["hello", "world"], 4);
        assert_eq!(r.frame().text(), "hello\nworld\n");
        assert_eq!(r.version(), 4);
        assert_eq!(r.state(), SyncState::Idle);
        assert!(r.frame().check_offsets());
    }

    #[test]
    fn connect_announces_replica() {
        let mut r = Reconciler::new("doc", "v1", TextFrame::default());
        r.connect();
        let out = r.drain_outbox();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].args, vec!["id"]);
        assert_eq!((out[0].id.as_str(), out[0].src.as_str()), ("doc", "v1"));
    }

    #[test]
    fn intents_wait_for_lock_and_replay_in_order() {
        let mut r = loaded(&["ab"], 2);
        assert_eq!(r.intent(Intent::Type("x".into())), ApplyOutcome::Buffered);
        assert_eq!(r.intent(Intent::Type("y".into())), ApplyOutcome::Buffered);
        assert_eq!(r.state(), SyncState::AwaitingLock);
        assert_eq!(r.queued(), 2);
        assert_eq!(commands(&r.drain_outbox()), vec![vec!["hold"]]);
        assert_eq!(r.frame().text(), "ab\n");

        assert_eq!(r.apply(&msg(0, &["held"])), ApplyOutcome::Applied);
        assert_eq!(r.state(), SyncState::Locked);
        assert_eq!(r.frame().text(), "xyab\n");
        let out = r.drain_outbox();
        assert_eq!(
            commands(&out),
            vec![vec!["eins", "x", "0"], vec!["eins", "y", "1"]]
        );
        assert_eq!(out[0].vers, 3);
        assert_eq!(out[1].vers, 4);
        assert_eq!(r.version(), 4);
    }

    #[test]
    fn unsolicited_grant_is_ignored() {
        let mut r = loaded(&["ab"], 1);
        assert_eq!(r.apply(&msg(0, &["held"])), ApplyOutcome::Ignored);
        assert_eq!(r.state(), SyncState::Idle);
    }

    #[test]
    fn typing_over_selection_deletes_first() {
        let mut r = locked(&["hello"], 1);
        r.intent(Intent::Select { p0: 1, p1: 4 });
        r.drain_outbox();
        r.intent(Intent::Type("E".into()));
        assert_eq!(r.frame().text(), "hEo\n");
        let out = r.drain_outbox();
        assert_eq!(
            commands(&out),
            vec![vec!["edel", "1", "4"], vec!["eins", "E", "1"]]
        );
        assert_eq!((out[0].vers, out[1].vers), (2, 3));
    }

    #[test]
    fn backspace_deletes_previous_rune() {
        let mut r = locked(&["abc"], 1);
        r.intent(Intent::Select { p0: 2, p1: 2 });
        r.drain_outbox();
        assert_eq!(r.intent(Intent::Backspace), ApplyOutcome::Applied);
        assert_eq!(r.frame().text(), "ac\n");
        assert_eq!(commands(&r.drain_outbox()), vec![vec!["edel", "1", "2"]]);
        r.intent(Intent::Select { p0: 0, p1: 0 });
        assert_eq!(r.intent(Intent::Backspace), ApplyOutcome::Ignored);
    }

    #[test]
    fn cut_advances_version_after_send() {
        let mut r = locked(&["abcdef"], 5);
        r.intent(Intent::Select { p0: 1, p1: 3 });
        r.drain_outbox();
        r.intent(Intent::Cut);
        let out = r.drain_outbox();
        assert_eq!(commands(&out), vec![vec!["ecut", "1", "3"]]);
        assert_eq!(out[0].vers, 5);
        assert_eq!(r.version(), 6);
        assert_eq!(r.frame().text(), "adef\n");
    }

    #[test]
    fn paste_over_selection_deletes_it_first() {
        let mut r = locked(&["hello world"], 2);
        r.intent(Intent::Select { p0: 6, p1: 11 });
        r.drain_outbox();
        assert_eq!(r.intent(Intent::Paste), ApplyOutcome::Applied);
        let out = r.drain_outbox();
        assert_eq!(
            commands(&out),
            vec![vec!["edel", "6", "11"], vec!["epaste", "6", "11"]]
        );
        assert_eq!(out[0].vers, 3);
        assert_eq!(out[1].vers, 3);
        assert_eq!(r.frame().text(), "hello \n");
        assert_eq!(r.frame().selection(), Selection::caret(6));
        assert_eq!(r.apply(&msg(4, &["eins", "hello", "6"])), ApplyOutcome::Applied);
        assert_eq!(r.frame().text(), "hello hello\n");
    }

    #[test]
    fn stray_reloading_line_is_dropped() {
        let mut r = loaded(&["ab"], 2);
        assert_eq!(
            r.apply(&msg(0, &["reloading", "junk"])),
            ApplyOutcome::Ignored
        );
        assert_eq!(r.frame().text(), "ab\n");
        assert!(r.frame().check_offsets());
    }

    #[test]
    fn lock_survives_reload() {
        let mut r = locked(&["ab"], 2);
        r.apply(&msg(5, &["eins", "x", "0"]));
        assert_eq!(r.state(), SyncState::ReloadPending);
        r.apply(&msg(0, &["reload"]));
        r.apply(&msg(0, &["reloading", "xab"]));
        r.apply(&msg(0, &["reloaded", "5"]));
        assert_eq!(r.state(), SyncState::Locked);
        assert_eq!(r.intent(Intent::Type("y".into())), ApplyOutcome::Applied);
    }

    #[test]
    fn paste_waits_for_authority_insert() {
        let mut r = locked(&["ab"], 5);
        r.intent(Intent::Paste);
        let out = r.drain_outbox();
        assert_eq!(commands(&out), vec![vec!["epaste", "0", "0"]]);
        assert_eq!(out[0].vers, 5);
        assert_eq!(r.version(), 5);
        assert_eq!(r.frame().text(), "ab\n");
        assert_eq!(r.apply(&msg(6, &["eins", "zz", "0"])), ApplyOutcome::Applied);
        assert_eq!(r.frame().text(), "zzab\n");
        assert_eq!(r.version(), 6);
    }

    #[test]
    fn version_gap_requests_reload() {
        let mut r = loaded(&["0123456789"], 7);
        assert_eq!(
            r.apply(&msg(9, &["eins", "x", "0"])),
            ApplyOutcome::ReloadRequested
        );
        assert_eq!(r.frame().text(), "0123456789\n");
        assert_eq!(r.state(), SyncState::ReloadPending);
        assert_eq!(commands(&r.drain_outbox()), vec![vec!["needreload"]]);
        assert_eq!(r.version(), 7);

        // content stays frozen until the snapshot lands
        assert_eq!(r.apply(&msg(8, &["edel", "0", "1"])), ApplyOutcome::Ignored);
        assert_eq!(r.intent(Intent::Type("q".into())), ApplyOutcome::Ignored);

        r.apply(&msg(0, &["reload"]));
        r.apply(&msg(0, &["reloading", "fresh"]));
        r.apply(&msg(0, &["reloaded", "9"]));
        assert_eq!(r.state(), SyncState::Idle);
        assert_eq!(r.version(), 9);
        assert_eq!(r.frame().text(), "fresh\n");
    }

    #[test]
    fn unversioned_edits_skip_the_check() {
        let mut r = loaded(&["ab"], 7);
        assert_eq!(r.apply(&msg(0, &["eins", "x", "1"])), ApplyOutcome::Applied);
        assert_eq!(r.frame().text(), "axb\n");
        assert_eq!(r.version(), 7);
    }

    #[test]
    fn remote_delete_maps_selection() {
        let mut r = loaded(&["012345678"], 1);
        r.apply(&msg(0, &["sel", "2", "5"]));
        assert_eq!(r.apply(&msg(2, &["edel", "3", "4"])), ApplyOutcome::Applied);
        assert_eq!(r.frame().selection(), Selection { p0: 2, p1: 4 });
        assert_eq!(r.version(), 2);
        // not locked: no tick for someone else's edit
        assert!(r.drain_outbox().is_empty());
    }

    #[test]
    fn remote_edit_under_lock_resends_moved_selection() {
        let mut r = locked(&["abcdef"], 1);
        r.intent(Intent::Select { p0: 3, p1: 4 });
        r.drain_outbox();
        r.apply(&msg(2, &["eins", "XY", "0"]));
        assert_eq!(r.frame().selection(), Selection { p0: 5, p1: 6 });
        assert_eq!(commands(&r.drain_outbox()), vec![vec!["tick", "5", "6"]]);
        r.apply(&msg(3, &["eins", "Z", "9"]));
        assert!(r.drain_outbox().is_empty());
    }

    #[test]
    fn batched_insert_applies_on_terminator() {
        let mut r = loaded(&["ab"], 3);
        r.apply(&msg(0, &["sel", "2", "2"]));
        assert_eq!(r.apply(&msg(0, &["einsing", "one\n"])), ApplyOutcome::Buffered);
        assert_eq!(r.apply(&msg(0, &["einsing", "two"])), ApplyOutcome::Buffered);
        assert_eq!(r.frame().text(), "ab\n");
        r.drain_notices();
        assert_eq!(r.apply(&msg(4, &["einsdone", "1"])), ApplyOutcome::Applied);
        assert_eq!(r.frame().text(), "aone\ntwob\n");
        assert_eq!(r.frame().selection(), Selection::caret(9));
        assert_eq!(r.version(), 4);
        assert!(r.drain_notices().contains(&Notice::AutoResize));
        assert!(r.frame().check_offsets());
    }

    #[test]
    fn batched_insert_with_bad_version_is_discarded() {
        let mut r = loaded(&["ab"], 3);
        r.apply(&msg(0, &["einsing", "zzz"]));
        assert_eq!(
            r.apply(&msg(6, &["einsdone", "0"])),
            ApplyOutcome::ReloadRequested
        );
        assert_eq!(r.frame().text(), "ab\n");
        r.apply(&msg(0, &["reload"]));
        r.apply(&msg(0, &["reloading", "ab"]));
        r.apply(&msg(0, &["reloaded", "6"]));
        assert_eq!(r.apply(&msg(7, &["einsdone", "0"])), ApplyOutcome::Applied);
        assert_eq!(r.frame().text(), "ab\n");
    }

    #[test]
    fn mark_insert_streams_at_mark() {
        let mut r = loaded(&["hello world"], 1);
        r.apply(&msg(0, &["mark", "out", "5"]));
        r.apply(&msg(0, &["sel", "8", "8"]));
        r.apply(&msg(0, &["markinsing", "out", ", big"]));
        r.apply(&msg(0, &["markinsing", "out", " wide"]));
        assert_eq!(r.apply(&msg(0, &["markinsdone", "out"])), ApplyOutcome::Applied);
        assert_eq!(r.frame().text(), "hello, big wide world\n");
        assert_eq!(r.frame().marks().get("out"), Some(15));
        assert_eq!(r.frame().selection(), Selection::caret(18));
    }

    #[test]
    fn mark_insert_without_mark_is_dropped() {
        let mut r = loaded(&["abc"], 1);
        r.apply(&msg(0, &["markinsing", "gone", "x"]));
        assert_eq!(r.apply(&msg(0, &["markinsdone", "gone"])), ApplyOutcome::Ignored);
        assert_eq!(r.frame().text(), "abc\n");
        r.apply(&msg(0, &["mark", "gone", "0"]));
        r.apply(&msg(0, &["markinsdone", "gone"]));
        assert_eq!(r.frame().text(), "abc\n");
    }

    #[test]
    fn release_collapses_selection_and_acknowledges() {
        let mut r = locked(&["abcdef"], 1);
        r.intent(Intent::Select { p0: 1, p1: 4 });
        r.drain_outbox();
        assert_eq!(r.apply(&msg(0, &["rlse"])), ApplyOutcome::Applied);
        assert_eq!(r.state(), SyncState::Idle);
        assert_eq!(
            commands(&r.drain_outbox()),
            vec![vec!["tick", "1", "4"], vec!["rlsed"]]
        );
        assert_eq!(r.frame().selection(), Selection::caret(1));
    }

    #[test]
    fn release_waits_for_drag_to_end() {
        let mut r = locked(&["abcdef"], 1);
        r.begin_selection();
        r.intent(Intent::Select { p0: 1, p1: 3 });
        assert_eq!(r.apply(&msg(0, &["rlse"])), ApplyOutcome::Buffered);
        assert_eq!(r.state(), SyncState::Locked);
        assert!(r.drain_outbox().is_empty());
        r.end_selection();
        assert_eq!(
            commands(&r.drain_outbox()),
            vec![
                vec!["tick", "1", "3"],
                vec!["click1", "bc", "1", "3"],
                vec!["tick", "1", "3"],
                vec!["rlsed"]
            ]
        );
        assert_eq!(r.state(), SyncState::Idle);
    }

    #[test]
    fn drag_to_caret_reports_no_click() {
        let mut r = locked(&["abcdef"], 1);
        r.begin_selection();
        r.intent(Intent::Select { p0: 4, p1: 4 });
        r.end_selection();
        assert_eq!(commands(&r.drain_outbox()), vec![vec!["tick", "4", "4"]]);
    }

    #[test]
    fn noedits_drops_content_intents() {
        let mut r = locked(&["ab"], 1);
        r.apply(&msg(0, &["noedits"]));
        assert!(!r.is_editable());
        assert_eq!(r.intent(Intent::Type("x".into())), ApplyOutcome::Ignored);
        assert_eq!(r.intent(Intent::Copy), ApplyOutcome::Applied);
        r.apply(&msg(0, &["edits"]));
        assert_eq!(r.intent(Intent::Type("x".into())), ApplyOutcome::Applied);
    }

    #[test]
    fn word_click_selects_and_reports() {
        let mut r = locked(&["(abc) def"], 1);
        assert_eq!(
            r.intent(Intent::SelectWord {
                pos: 1,
                extended: false
            }),
            ApplyOutcome::Applied
        );
        assert_eq!(r.frame().selection(), Selection { p0: 1, p1: 4 });
        assert_eq!(
            commands(&r.drain_outbox()),
            vec![vec!["click1", "abc", "1", "4"]]
        );
    }

    #[test]
    fn interrupt_needs_no_lock() {
        let mut r = loaded(&["ab"], 1);
        assert_eq!(
            r.intent(Intent::Interrupt("esc".into())),
            ApplyOutcome::Applied
        );
        assert_eq!(commands(&r.drain_outbox()), vec![vec!["intr", "esc"]]);
        assert_eq!(r.state(), SyncState::Idle);
    }

    #[test]
    fn user_resize_stops_auto_resize() {
        let mut r = locked(&["ab"], 1);
        r.intent(Intent::Type("\n".into()));
        assert!(r.drain_notices().contains(&Notice::AutoResize));
        r.user_resized();
        r.intent(Intent::Type("\n".into()));
        assert!(!r.drain_notices().contains(&Notice::AutoResize));
    }

    #[test]
    fn malformed_and_unknown_commands_are_ignored() {
        let mut r = loaded(&["ab"], 1);
        assert_eq!(r.apply(&msg(2, &["eins", "x"])), ApplyOutcome::Ignored);
        assert_eq!(r.apply(&msg(2, &["edel", "a", "b"])), ApplyOutcome::Ignored);
        assert_eq!(r.apply(&msg(0, &["dirty"])), ApplyOutcome::Ignored);
        assert_eq!(r.apply(&msg(0, &[])), ApplyOutcome::Ignored);
        assert_eq!(r.version(), 1);
        assert_eq!(r.frame().text(), "ab\n");
    }

    #[test]
    fn close_notifies_renderer() {
        let mut r = loaded(&["ab"], 1);
        r.apply(&msg(0, &["close"]));
        assert_eq!(r.drain_notices(), vec![Notice::ConnectionClosed]);
    }
}
