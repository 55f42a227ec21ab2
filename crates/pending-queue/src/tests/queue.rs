use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use crate::error::QueueError;
use crate::queue::DeadlineQueue;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Deterministic pseudo-random stream for shuffling inputs.
fn lcg(seed: &mut u64) -> u64 {
    *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    *seed >> 33
}

fn drain(queue: &DeadlineQueue) -> Vec<(String, SystemTime)> {
    let mut out = Vec::new();
    while let Ok(node) = queue.pop() {
        out.push((node.topic.into_string(), node.deadline));
    }
    out
}

#[test]
fn reference_scenario() {
    let queue = DeadlineQueue::new();
    let t0 = SystemTime::now();

    assert!(queue.insert_or_update("bar.baz", t0));
    assert!(queue.insert_or_update("foo.bar", t0 + ms(1000)));
    assert!(!queue.insert_or_update("foo.bar", t0 + ms(2000)));
    assert!(queue.insert_or_update("foo.bar", t0 - ms(2000)));

    assert_eq!(queue.len(), 2);

    let first = queue.pop().unwrap();
    assert_eq!(first.topic, "foo.bar");
    assert_eq!(first.deadline, t0 - ms(2000));

    let second = queue.pop().unwrap();
    assert_eq!(second.topic, "bar.baz");
    assert_eq!(second.deadline, t0);

    assert!(queue.is_empty());
    assert_eq!(queue.pop(), Err(QueueError::Empty));
}

#[test]
fn earliest_deadline_wins() {
    let queue = DeadlineQueue::new();
    let t0 = SystemTime::now();

    assert!(queue.insert_or_update("topic", t0));
    assert!(!queue.insert_or_update("topic", t0));
    assert!(!queue.insert_or_update("topic", t0 + ms(1)));
    assert_eq!(queue.deadline_of("topic"), Some(t0));

    assert!(queue.insert_or_update("topic", t0 - ms(1)));
    assert_eq!(queue.deadline_of("topic"), Some(t0 - ms(1)));
    assert_eq!(queue.len(), 1);
}

#[test]
fn tightening_moves_node_to_front() {
    let queue = DeadlineQueue::new();
    let t0 = SystemTime::now();

    for i in 0..32u64 {
        queue.insert_or_update(format!("topic.{i}"), t0 + ms(10 * i));
    }
    assert_eq!(queue.peek().unwrap().topic, "topic.0");

    assert!(queue.insert_or_update("topic.31", t0 - ms(5)));
    assert!(queue.is_ordered());
    assert_eq!(queue.peek().unwrap().topic, "topic.31");
}

#[test]
fn one_node_per_topic() {
    let queue = DeadlineQueue::new();
    let t0 = SystemTime::now();
    let mut seed = 7;
    let mut topics = HashSet::new();

    for _ in 0..2_000 {
        let topic = format!("t{}", lcg(&mut seed) % 150);
        let offset = ms(lcg(&mut seed) % 10_000);
        queue.insert_or_update(topic.as_str(), t0 + offset);
        topics.insert(topic);
        assert_eq!(queue.len(), topics.len());
    }
    assert!(queue.is_ordered());
}

#[test]
fn pops_in_deadline_order() {
    let queue = DeadlineQueue::new();
    let t0 = SystemTime::now();
    let mut seed = 42;

    for i in 0..500 {
        queue.insert_or_update(format!("t{i}"), t0 + ms(lcg(&mut seed) % 1_000));
    }
    for i in 0..500 {
        queue.insert_or_update(format!("t{i}"), t0 + ms(lcg(&mut seed) % 1_000));
    }

    let popped = drain(&queue);
    assert_eq!(popped.len(), 500);
    assert!(popped.windows(2).all(|pair| pair[0].1 <= pair[1].1));
    assert_eq!(queue.pop(), Err(QueueError::Empty));
}

#[test]
fn peek_returns_copy() {
    let queue = DeadlineQueue::new();
    let t0 = SystemTime::now();
    assert_eq!(queue.peek(), Err(QueueError::Empty));

    queue.insert_or_update("a", t0 + ms(5));
    queue.insert_or_update("b", t0);

    let mut head = queue.peek().unwrap();
    head.deadline = t0 + ms(100);
    assert_eq!(queue.peek().unwrap().deadline, t0);
    assert_eq!(queue.len(), 2);
}

#[test]
fn repair_is_idempotent() {
    let repaired = DeadlineQueue::new();
    let untouched = DeadlineQueue::new();
    let t0 = SystemTime::now();
    let mut seed = 3;

    for i in 0..200 {
        let deadline = t0 + ms(lcg(&mut seed) % 5_000);
        repaired.insert_or_update(format!("t{i}"), deadline);
        untouched.insert_or_update(format!("t{i}"), deadline);
    }

    assert_eq!(repaired.repair_ordering(), 0);
    assert_eq!(repaired.repair_ordering(), 0);
    assert!(repaired.is_ordered());

    let lhs: Vec<_> = drain(&repaired).into_iter().map(|(_, d)| d).collect();
    let rhs: Vec<_> = drain(&untouched).into_iter().map(|(_, d)| d).collect();
    assert_eq!(lhs, rhs);
}

#[test]
fn repair_restores_scrambled_storage() {
    let queue = DeadlineQueue::new();
    let t0 = SystemTime::now();

    for i in 0..64u64 {
        queue.insert_or_update(format!("t{i}"), t0 + ms(i));
    }
    queue.scramble();
    assert!(!queue.is_ordered());

    assert!(queue.repair_ordering() > 0);
    assert!(queue.is_ordered());

    // The rebuilt index must still find every topic.
    assert!(queue.insert_or_update("t63", t0 - ms(1)));
    assert_eq!(queue.pop().unwrap().topic, "t63");

    let popped = drain(&queue);
    assert_eq!(popped.len(), 63);
    assert!(popped.windows(2).all(|pair| pair[0].1 <= pair[1].1));
}

#[test]
fn remove_by_topic() {
    let queue = DeadlineQueue::new();
    let t0 = SystemTime::now();

    for i in 0..20u64 {
        queue.insert_or_update(format!("t{i}"), t0 + ms(i));
    }

    let removed = queue.remove("t7").unwrap();
    assert_eq!(removed.deadline, t0 + ms(7));
    assert!(queue.remove("t7").is_none());
    assert!(!queue.contains("t7"));
    assert!(queue.contains("t8"));
    assert_eq!(queue.len(), 19);
    assert!(queue.is_ordered());

    // A removed topic can be queued again.
    assert!(queue.insert_or_update("t7", t0 + ms(100)));
    assert_eq!(queue.len(), 20);
}

#[test]
fn pop_due_stops_at_now() {
    let queue = DeadlineQueue::new();
    let t0 = SystemTime::now();

    queue.insert_or_update("late", t0 + ms(50));
    queue.insert_or_update("early", t0 - ms(50));
    queue.insert_or_update("exact", t0);

    let due = queue.pop_due(t0);
    let topics: Vec<_> = due.iter().map(|node| node.topic.as_str()).collect();
    assert_eq!(topics, ["early", "exact"]);
    assert_eq!(queue.len(), 1);
    assert!(queue.pop_due(t0).is_empty());
}

#[test]
fn clear_empties_queue() {
    let queue = DeadlineQueue::with_capacity(4);
    queue.insert_now("a");
    queue.insert_now("b");
    queue.clear();

    assert!(queue.is_empty());
    assert!(!queue.contains("a"));
    assert!(queue.insert_now("a"));
}

#[test]
fn concurrent_distinct_inserts() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 250;

    let queue = Arc::new(DeadlineQueue::new());
    let t0 = SystemTime::now();

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let offset = ms(((i * 31 + worker * 17) % 1_000) as u64);
                    assert!(queue.insert_or_update(format!("w{worker}.{i}"), t0 + offset));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(queue.len(), THREADS * PER_THREAD);
    assert!(queue.is_ordered());
}

#[test]
fn concurrent_updates_keep_minimum() {
    const THREADS: u64 = 8;

    let queue = Arc::new(DeadlineQueue::new());
    let t0 = SystemTime::now();

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..100u64 {
                    queue.insert_or_update("shared", t0 + ms(1_000 + worker * 100 + i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(queue.len(), 1);
    assert_eq!(queue.deadline_of("shared"), Some(t0 + ms(1_000)));
}
