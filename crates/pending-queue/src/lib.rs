//! # pending-queue
//!
//! An in-process, deduplicating, earliest-deadline-first queue of pending
//! events. Each topic has at most one outstanding entry; repeated
//! notifications for a pending topic keep the earliest deadline.
//!
//! ## Module Overview
//! - [`node`]        – Topic and node primitives.
//! - [`queue`]       – The locked min-heap with its topic index.
//! - [`trigger`]     – Background thread running the periodic repair pass.
//! - [`coordinator`] – Owner wiring one queue to one trigger.
//! - [`config`]      – Coordinator configuration and builder.
//! - [`error`]       – Error types.
//!
//! ```
//! use std::time::{Duration, SystemTime};
//! use pending_queue::Coordinator;
//!
//! let coordinator = Coordinator::with_defaults().unwrap();
//! let now = SystemTime::now();
//!
//! coordinator.insert_or_update("bar.baz", now);
//! coordinator.insert_or_update("foo.bar", now - Duration::from_secs(2));
//!
//! assert_eq!(coordinator.pop().unwrap().topic, "foo.bar");
//! assert_eq!(coordinator.pop().unwrap().topic, "bar.baz");
//! assert!(coordinator.pop().is_err());
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod node;
pub mod queue;
mod sync;
pub mod trigger;

pub use config::{CoordinatorConfig, CoordinatorConfigBuilder};
pub use coordinator::Coordinator;
pub use error::{CoordinatorError, QueueError, QueueResult, TriggerError, TriggerResult};
pub use node::{Node, Topic};
pub use queue::DeadlineQueue;
pub use trigger::{ReorderTrigger, TriggerState};

#[cfg(test)]
mod tests;
