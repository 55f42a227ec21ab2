//! Error types surfaced by the queue, the reorder trigger and the coordinator.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors returned by [`DeadlineQueue`](crate::DeadlineQueue) reads.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("pending queue is empty")]
    Empty,
}

pub type QueueResult<T> = Result<T, QueueError>;

/// Errors raised while managing the background reorder thread.
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("repair interval must be non-zero, got {0:?}")]
    InvalidInterval(Duration),
    #[error("failed to spawn reorder thread: {0}")]
    Spawn(#[from] io::Error),
}

pub type TriggerResult<T> = Result<T, TriggerError>;

/// Errors raised by the [`Coordinator`](crate::Coordinator).
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("reorder trigger error: {0}")]
    Trigger(#[from] TriggerError),
}
