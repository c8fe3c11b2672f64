//! Root crate facade for the inkframe text frame and its sync protocol.

/// Transcript loading and replay through a replica.
pub mod replay;

pub use inkframe_core::{
    config, constants, error, frame, FrameConfig, FrameError, Located, Selection, TextFrame,
    WordCharset,
};
pub use inkframe_sync::{
    protocol, reconciler, spawn_replica, worker, ApplyOutcome, Intent, LocalCommand, Message,
    Notice, Reconciler, RemoteCommand, ReplicaHandle, ReplicaInput, ReplicaOutput, SyncState,
};
