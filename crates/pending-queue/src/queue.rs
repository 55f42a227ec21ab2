//! Deduplicating earliest-deadline-first queue.
//!
//! [`DeadlineQueue`] stores at most one [`Node`] per [`Topic`] in a binary
//! min-heap ordered by deadline. A side index maps each topic to its heap slot
//! so that a repeated notification for a topic already pending can be
//! coalesced in place.
//!
//! Coalescing keeps the *earliest* deadline: a notification that is more
//! urgent than the pending one tightens its deadline, a less urgent one is
//! dropped. It never replaces a deadline by a later one.
//!
//! Every public operation runs under one lock and leaves the heap ordered
//! before releasing it. The periodic [`ReorderTrigger`] re-runs a full heapify
//! on the same storage as a backstop.
//!
//! [`ReorderTrigger`]: crate::trigger::ReorderTrigger

use core::fmt;
use std::collections::HashMap;
use std::time::SystemTime;

use log::{debug, trace};

use crate::error::{QueueError, QueueResult};
use crate::node::{Node, Topic};
use crate::sync::Mutex;

/// Result of a single upsert against the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upsert {
    Inserted,
    Tightened,
    Unchanged,
}

impl Upsert {
    fn changed(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Unsynchronized heap plus topic index. Only reachable through the lock in
/// [`DeadlineQueue`].
#[derive(Default)]
struct Heap {
    nodes: Vec<Node>,
    slots: HashMap<Topic, usize>,
}

impl Heap {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
        }
    }

    fn upsert(&mut self, topic: Topic, deadline: SystemTime) -> Upsert {
        if let Some(&slot) = self.slots.get(topic.as_str()) {
            if deadline < self.nodes[slot].deadline {
                // Heap order is broken at `slot` until the sift below.
                self.nodes[slot].deadline = deadline;
                self.sift_up(slot);
                Upsert::Tightened
            } else {
                Upsert::Unchanged
            }
        } else {
            let slot = self.nodes.len();
            self.slots.insert(topic.clone(), slot);
            self.nodes.push(Node { topic, deadline });
            self.sift_up(slot);
            Upsert::Inserted
        }
    }

    fn peek(&self) -> Option<&Node> {
        self.nodes.first()
    }

    fn pop(&mut self) -> Option<Node> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(self.remove_at(0))
        }
    }

    fn remove(&mut self, topic: &str) -> Option<Node> {
        let slot = *self.slots.get(topic)?;
        Some(self.remove_at(slot))
    }

    fn remove_at(&mut self, slot: usize) -> Node {
        let node = self.nodes.swap_remove(slot);
        self.slots.remove(node.topic.as_str());
        if slot < self.nodes.len() {
            if let Some(moved) = self.slots.get_mut(self.nodes[slot].topic.as_str()) {
                *moved = slot;
            }
            if !self.sift_up(slot) {
                self.sift_down(slot);
            }
        }
        node
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.slots.clear();
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Rebuilds the topic index and heapifies bottom-up. Returns the number of
    /// nodes that had to move.
    fn repair(&mut self) -> usize {
        for (slot, node) in self.nodes.iter().enumerate() {
            if let Some(entry) = self.slots.get_mut(node.topic.as_str()) {
                *entry = slot;
            }
        }

        let mut moved = 0;
        for slot in (0..self.nodes.len() / 2).rev() {
            if self.sift_down(slot) {
                moved += 1;
            }
        }
        debug_assert!(self.is_heap());
        moved
    }

    fn sift_up(&mut self, mut slot: usize) -> bool {
        let start = slot;
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.nodes[slot].deadline < self.nodes[parent].deadline {
                self.swap(slot, parent);
                slot = parent;
            } else {
                break;
            }
        }
        slot != start
    }

    fn sift_down(&mut self, mut slot: usize) -> bool {
        let start = slot;
        let len = self.nodes.len();
        loop {
            let left = 2 * slot + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.nodes[right].deadline < self.nodes[left].deadline {
                right
            } else {
                left
            };
            if self.nodes[child].deadline < self.nodes[slot].deadline {
                self.swap(slot, child);
                slot = child;
            } else {
                break;
            }
        }
        slot != start
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.nodes.swap(a, b);
        if let Some(entry) = self.slots.get_mut(self.nodes[a].topic.as_str()) {
            *entry = a;
        }
        if let Some(entry) = self.slots.get_mut(self.nodes[b].topic.as_str()) {
            *entry = b;
        }
    }

    fn is_heap(&self) -> bool {
        (1..self.nodes.len())
            .all(|slot| self.nodes[(slot - 1) / 2].deadline <= self.nodes[slot].deadline)
    }
}

/// Thread-safe pending-event queue keyed by topic.
///
/// The queue is deliberately not `Clone`: it is shared through
/// [`Arc`](std::sync::Arc) so that callers and the maintenance thread always
/// see the same storage. Reads return owned [`Node`] copies.
pub struct DeadlineQueue {
    heap: Mutex<Heap>,
}

impl DeadlineQueue {
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(Heap::default()),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Mutex::new(Heap::with_capacity(capacity)),
        }
    }

    /// Inserts a node for `topic`, or tightens the pending one.
    ///
    /// Returns `true` when a node was inserted or its deadline moved earlier,
    /// and `false` when `deadline` is not strictly earlier than the pending
    /// deadline for the same topic. In the latter case nothing changes.
    ///
    /// # Examples
    /// ```
    /// # use pending_queue::DeadlineQueue;
    /// # use std::time::{Duration, SystemTime};
    /// let queue = DeadlineQueue::new();
    /// let now = SystemTime::now();
    ///
    /// assert!(queue.insert_or_update("foo.bar", now));
    /// assert!(!queue.insert_or_update("foo.bar", now + Duration::from_secs(1)));
    /// assert!(queue.insert_or_update("foo.bar", now - Duration::from_secs(1)));
    /// assert_eq!(queue.len(), 1);
    /// ```
    pub fn insert_or_update(&self, topic: impl Into<Topic>, deadline: SystemTime) -> bool {
        let topic = topic.into();
        let outcome = {
            let mut heap = self.heap.lock();
            heap.upsert(topic.clone(), deadline)
        };

        match outcome {
            Upsert::Inserted => debug!("queued topic {topic} due {deadline:?}"),
            Upsert::Tightened => debug!("tightened topic {topic} to {deadline:?}"),
            Upsert::Unchanged => trace!("kept earlier deadline for topic {topic}"),
        }
        outcome.changed()
    }

    /// Same as [`insert_or_update`](Self::insert_or_update) with the deadline
    /// set to the current wall-clock time.
    pub fn insert_now(&self, topic: impl Into<Topic>) -> bool {
        self.insert_or_update(topic, SystemTime::now())
    }

    /// Removes and returns the most urgent node.
    pub fn pop(&self) -> QueueResult<Node> {
        let node = self.heap.lock().pop().ok_or(QueueError::Empty)?;
        debug!("popped topic {} due {:?}", node.topic, node.deadline);
        Ok(node)
    }

    /// Returns a copy of the most urgent node without removing it.
    pub fn peek(&self) -> QueueResult<Node> {
        self.heap.lock().peek().cloned().ok_or(QueueError::Empty)
    }

    /// Pops every node whose deadline is at or before `now`, most urgent first.
    pub fn pop_due(&self, now: SystemTime) -> Vec<Node> {
        let mut due = Vec::new();
        let mut heap = self.heap.lock();
        while heap.peek().map_or(false, |node| node.is_due(now)) {
            if let Some(node) = heap.pop() {
                due.push(node);
            }
        }
        drop(heap);

        if !due.is_empty() {
            debug!("popped {} due topics", due.len());
        }
        due
    }

    /// Removes the node for `topic`, if one is pending.
    pub fn remove(&self, topic: &str) -> Option<Node> {
        let removed = self.heap.lock().remove(topic);
        if removed.is_some() {
            debug!("removed topic {topic}");
        }
        removed
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.heap.lock().slots.contains_key(topic)
    }

    /// Returns the pending deadline for `topic`.
    pub fn deadline_of(&self, topic: &str) -> Option<SystemTime> {
        let heap = self.heap.lock();
        heap.slots.get(topic).map(|&slot| heap.nodes[slot].deadline)
    }

    pub fn clear(&self) {
        self.heap.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Restores heap order over the whole collection in O(n).
    ///
    /// Idempotent. Callers never need this because every mutation repairs
    /// eagerly; it is the hook driven by the reorder trigger.
    pub(crate) fn repair_ordering(&self) -> usize {
        let moved = self.heap.lock().repair();
        trace!("repair pass moved {moved} nodes");
        moved
    }

    #[cfg(test)]
    pub(crate) fn scramble(&self) {
        // Leaves both the heap order and the slot index stale.
        self.heap.lock().nodes.reverse();
    }

    #[cfg(test)]
    pub(crate) fn is_ordered(&self) -> bool {
        let heap = self.heap.lock();
        heap.is_heap()
            && heap.slots.len() == heap.nodes.len()
            && heap
                .nodes
                .iter()
                .enumerate()
                .all(|(slot, node)| heap.slots.get(node.topic.as_str()) == Some(&slot))
    }
}

impl Default for DeadlineQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DeadlineQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadlineQueue")
            .field("len", &self.len())
            .finish()
    }
}
