//! Background replica thread fed by channels.

use crate::protocol::Message;
use crate::reconciler::{ApplyOutcome, Intent, Notice, Reconciler, SyncState};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread;
use tracing::{debug, error};

/// Inputs for the replica thread.
#[derive(Debug)]
pub enum ReplicaInput {
    /// A message from the authority.
    Remote(Message),
    User(Intent),
    UserResized,
    BeginSelection,
    EndSelection,
    /// Ask for a [`ReplicaOutput::Snapshot`].
    Snapshot,
    Shutdown,
}

/// Outputs of the replica thread, in production order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaOutput {
    /// Forward to the authority.
    Send(Message),
    Notice(Notice),
    /// Result of a remote apply that did not simply apply.
    Outcome(ApplyOutcome),
    Snapshot {
        text: String,
        version: u64,
        state: SyncState,
    },
}

/// Handle for feeding, and reading from, a replica thread.
pub struct ReplicaHandle {
    pub input_tx: Sender<ReplicaInput>,
    pub output_rx: Receiver<ReplicaOutput>,
}

fn flush(reconciler: &mut Reconciler, output_tx: &Sender<ReplicaOutput>) -> bool {
    let messages = reconciler.drain_outbox().into_iter().map(ReplicaOutput::Send);
    let notices = reconciler.drain_notices().into_iter().map(ReplicaOutput::Notice);
    messages
        .chain(notices)
        .all(|out| output_tx.send(out).is_ok())
}

/// Spawn the thread that owns `reconciler` and serializes all its input.
///
/// The replica announces itself (`id`) before reading any input. Dropping
/// every sender, or sending [`ReplicaInput::Shutdown`], ends the thread.
///
/// # Returns
/// A [`ReplicaHandle`] containing the input sender and output receiver.
///
/// # Panics
/// Panics if the worker thread cannot be spawned.
pub fn spawn_replica(mut reconciler: Reconciler) -> ReplicaHandle {
    let (input_tx, input_rx) = unbounded();
    let (output_tx, output_rx) = unbounded();

    thread::Builder::new()
        .name(format!("inkframe-replica-{}", reconciler.replica_id()))
        .spawn(move || {
            reconciler.connect();
            if !flush(&mut reconciler, &output_tx) {
                return;
            }
            run(&mut reconciler, &input_rx, &output_tx);
            debug!(replica = %reconciler.replica_id(), "replica worker exiting");
        })
        .expect("failed to spawn replica worker");

    ReplicaHandle {
        input_tx,
        output_rx,
    }
}

fn run(
    reconciler: &mut Reconciler,
    input_rx: &Receiver<ReplicaInput>,
    output_tx: &Sender<ReplicaOutput>,
) {
    for input in input_rx.iter() {
        match input {
            ReplicaInput::Remote(msg) => {
                let outcome = reconciler.apply(&msg);
                if outcome != ApplyOutcome::Applied
                    && output_tx.send(ReplicaOutput::Outcome(outcome)).is_err()
                {
                    break;
                }
            }
            ReplicaInput::User(intent) => {
                reconciler.intent(intent);
            }
            ReplicaInput::UserResized => reconciler.user_resized(),
            ReplicaInput::BeginSelection => reconciler.begin_selection(),
            ReplicaInput::EndSelection => reconciler.end_selection(),
            ReplicaInput::Snapshot => {
                let snapshot = ReplicaOutput::Snapshot {
                    text: reconciler.frame().text(),
                    version: reconciler.version(),
                    state: reconciler.state(),
                };
                if output_tx.send(snapshot).is_err() {
                    break;
                }
            }
            ReplicaInput::Shutdown => break,
        }
        if !flush(reconciler, output_tx) {
            error!(replica = %reconciler.replica_id(), "output channel closed");
            break;
        }
    }
}
