//! Topic and node primitives.
//!
//! A [`Node`] is the unit stored by the queue: a topic naming a class of
//! pending event plus the deadline by which it must be handled. Nodes are
//! plain values; the queue hands out owned copies and never a reference into
//! its own storage.

use core::fmt;
use std::borrow::Borrow;
use std::time::SystemTime;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque identifier of a pending event class, e.g. `"foo.bar"`.
///
/// The queue keeps at most one node per topic.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Topic(String);

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for Topic {
    #[inline]
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Topic {
    #[inline]
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for Topic {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Topic {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Topic {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pending entry: one topic and its deadline.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub topic: Topic,
    pub deadline: SystemTime,
}

impl Node {
    pub fn new(topic: impl Into<Topic>, deadline: SystemTime) -> Self {
        Self {
            topic: topic.into(),
            deadline,
        }
    }

    /// Returns `true` if this node must be handled before `other`.
    #[inline]
    pub fn is_more_urgent(&self, other: &Node) -> bool {
        self.deadline < other.deadline
    }

    /// Returns `true` once `now` has reached the deadline.
    #[inline]
    pub fn is_due(&self, now: SystemTime) -> bool {
        self.deadline <= now
    }
}
