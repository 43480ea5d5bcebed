//! Error and outcome types.

use nexus_pool::PoolError;
use thiserror::Error;

/// Failure of a queue operation. The queue is unchanged when one is returned.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// A payload copy could not be allocated.
    #[error("payload allocation of {bytes} bytes failed")]
    AllocationFailed {
        /// Payload size.
        bytes: usize,
    },
    /// Node storage could not be provided or configured.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// What a successful enqueue did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Enqueued {
    /// A new node was linked at the tail.
    Inserted,
    /// The key was already queued; its payload was replaced in place and it
    /// kept its FIFO position.
    Overwritten,
}
