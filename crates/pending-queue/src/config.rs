//! Coordinator configuration.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::trigger::{DEFAULT_REPAIR_INTERVAL, DEFAULT_THREAD_NAME};

/// Default number of nodes preallocated by the queue.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Configuration for a [`Coordinator`](crate::Coordinator).
///
/// Controls the queue's initial sizing and how the reorder trigger is run.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Cadence of the background repair pass.
    pub repair_interval: Duration,
    pub initial_capacity: usize,
    /// Name given to the maintenance thread.
    pub thread_name: String,
    /// Start the reorder trigger as soon as the coordinator is built.
    pub autostart: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            repair_interval: DEFAULT_REPAIR_INTERVAL,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            autostart: false,
        }
    }
}

impl CoordinatorConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CoordinatorConfigBuilder {
        CoordinatorConfigBuilder::default()
    }
}

/// Builder for ergonomic coordinator configuration construction.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfigBuilder {
    config: CoordinatorConfig,
}

impl CoordinatorConfigBuilder {
    /// Sets the cadence of the background repair pass.
    pub fn repair_interval(mut self, interval: Duration) -> Self {
        self.config.repair_interval = interval;
        self
    }

    /// Sets the number of nodes preallocated by the queue.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Sets the maintenance thread name.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Starts the trigger when the coordinator is built.
    pub fn autostart(mut self, autostart: bool) -> Self {
        self.config.autostart = autostart;
        self
    }

    /// Builds the coordinator configuration.
    pub fn build(self) -> CoordinatorConfig {
        self.config
    }
}
