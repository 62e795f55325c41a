//! Errors raised by the primitives.
use std::time::Duration;

use thiserror::Error;

/// A specialized [`Result`](std::result::Result) for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong when operating on a primitive.
///
/// Primitive-level errors are returned by the call that failed. Failures of
/// tasks run by a [`WorkerPool`](crate::WorkerPool) are never raised; they are
/// carried in the result slot of the task as [`Error::TaskFailure`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A lock could not be acquired within the given bound.
    #[error("lock was not acquired within {0:?}")]
    LockTimeout(Duration),

    /// A sequence was accessed outside of `[0, len)`.
    #[error("index {index} is out of range for a sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The peer of a channel endpoint terminated without sending end-of-stream.
    #[error("channel peer terminated without sending end-of-stream")]
    ChannelBroken,

    /// The queue, or the pool that owns it, no longer accepts items.
    #[error("queue is closed")]
    QueueClosed,

    /// A task panicked while being executed by a pool worker.
    #[error("task {index} failed: {message}")]
    TaskFailure { index: usize, message: String },

    /// An execution unit panicked before producing its result.
    #[error("execution unit `{name}` panicked: {message}")]
    UnitPanicked { name: String, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A channel message could not be encoded or decoded.
    #[error("failed to encode or decode a channel message")]
    Codec(#[from] serde_json::Error),
}
