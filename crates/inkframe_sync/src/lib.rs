//! Sync protocol for inkframe replicas (wire records, reconciler, worker).

/// Wire records and typed commands.
pub mod protocol;
/// Replica reconciler state machine.
pub mod reconciler;
/// Background replica thread.
pub mod worker;

pub use protocol::{LocalCommand, Message, RemoteCommand};
pub use reconciler::{ApplyOutcome, Intent, Notice, Reconciler, SyncState};
pub use worker::{spawn_replica, ReplicaHandle, ReplicaInput, ReplicaOutput};
