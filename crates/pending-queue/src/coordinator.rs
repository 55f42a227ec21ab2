//! Entry point owning one queue and its reorder trigger.

use std::time::{Duration, SystemTime};

use log::info;

use crate::config::CoordinatorConfig;
use crate::error::{CoordinatorError, QueueResult};
use crate::node::{Node, Topic};
use crate::queue::DeadlineQueue;
use crate::sync::Arc;
use crate::trigger::ReorderTrigger;

/// Owns a [`DeadlineQueue`] and the single [`ReorderTrigger`] bound to it.
///
/// The trigger is built from a clone of the same `Arc` returned by
/// [`queue`](Self::queue), so callers and the maintenance thread operate on
/// one collection. Dropping the coordinator stops the trigger.
pub struct Coordinator {
    config: CoordinatorConfig,
    queue: Arc<DeadlineQueue>,
    trigger: ReorderTrigger,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Result<Self, CoordinatorError> {
        let queue = Arc::new(DeadlineQueue::with_capacity(config.initial_capacity));
        let trigger =
            ReorderTrigger::with_thread_name(Arc::clone(&queue), config.thread_name.clone());
        let coordinator = Self {
            config,
            queue,
            trigger,
        };

        if coordinator.config.autostart {
            coordinator.start()?;
        }
        info!(
            "coordinator ready, repair interval {:?}",
            coordinator.config.repair_interval
        );
        Ok(coordinator)
    }

    pub fn with_defaults() -> Result<Self, CoordinatorError> {
        Self::new(CoordinatorConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Shared handle to the queue repaired by this coordinator's trigger.
    pub fn queue(&self) -> Arc<DeadlineQueue> {
        Arc::clone(&self.queue)
    }

    pub fn trigger(&self) -> &ReorderTrigger {
        &self.trigger
    }

    /// Starts the trigger at the configured interval.
    pub fn start(&self) -> Result<bool, CoordinatorError> {
        self.start_with(self.config.repair_interval)
    }

    /// Starts the trigger at `interval`. A no-op if it is already running.
    pub fn start_with(&self, interval: Duration) -> Result<bool, CoordinatorError> {
        Ok(self.trigger.start(interval)?)
    }

    pub fn stop(&self) -> bool {
        self.trigger.stop()
    }

    pub fn is_running(&self) -> bool {
        self.trigger.is_running()
    }

    pub fn insert_or_update(&self, topic: impl Into<Topic>, deadline: SystemTime) -> bool {
        self.queue.insert_or_update(topic, deadline)
    }

    pub fn insert_now(&self, topic: impl Into<Topic>) -> bool {
        self.queue.insert_now(topic)
    }

    pub fn pop(&self) -> QueueResult<Node> {
        self.queue.pop()
    }

    pub fn peek(&self) -> QueueResult<Node> {
        self.queue.peek()
    }

    pub fn pop_due(&self, now: SystemTime) -> Vec<Node> {
        self.queue.pop_due(now)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
