//! Periodic reorder backstop.
//!
//! A [`ReorderTrigger`] owns one background thread that wakes on a fixed
//! cadence, takes the queue lock, re-heapifies, releases the lock and goes
//! back to sleep. The queue never depends on it: every mutation already
//! repairs heap order before releasing the lock.
//!
//! Cadence is drift-free. The thread sleeps until absolute tick instants
//! rather than for a relative duration, and parks so that [`stop`] can wake
//! it immediately.
//!
//! [`stop`]: ReorderTrigger::stop

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::error::{TriggerError, TriggerResult};
use crate::queue::DeadlineQueue;
use crate::sync::{Arc, Mutex};

/// Default cadence of the maintenance pass.
pub const DEFAULT_REPAIR_INTERVAL: Duration = Duration::from_millis(1000);

/// Default name given to the maintenance thread.
pub const DEFAULT_THREAD_NAME: &str = "pending-queue-repair";

/// Lifecycle of a [`ReorderTrigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Stopped,
    Running,
}

struct Worker {
    handle: JoinHandle<()>,
    stop: Arc<AtomicBool>,
    interval: Duration,
}

/// Background thread that periodically calls the queue's repair pass.
///
/// The trigger holds the queue through the same `Arc` that callers use, so
/// the storage it repairs is the storage they mutate. At most one thread runs
/// per trigger; [`start`](Self::start) is idempotent.
pub struct ReorderTrigger {
    queue: Arc<DeadlineQueue>,
    thread_name: String,
    ticks: Arc<AtomicU64>,
    live: Arc<AtomicUsize>,
    worker: Mutex<Option<Worker>>,
}

/// Counts a maintenance thread as alive until it unwinds or returns.
struct LiveWorker(Arc<AtomicUsize>);

impl LiveWorker {
    fn enter(live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::AcqRel);
        Self(live)
    }
}

impl Drop for LiveWorker {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ReorderTrigger {
    pub fn new(queue: Arc<DeadlineQueue>) -> Self {
        Self::with_thread_name(queue, DEFAULT_THREAD_NAME)
    }

    pub fn with_thread_name(queue: Arc<DeadlineQueue>, thread_name: impl Into<String>) -> Self {
        Self {
            queue,
            thread_name: thread_name.into(),
            ticks: Arc::new(AtomicU64::new(0)),
            live: Arc::new(AtomicUsize::new(0)),
            worker: Mutex::new(None),
        }
    }

    /// Spawns the maintenance thread.
    ///
    /// Returns `Ok(true)` if a thread was started and `Ok(false)` if one was
    /// already running, in which case `interval` is ignored.
    pub fn start(&self, interval: Duration) -> TriggerResult<bool> {
        if interval.is_zero() {
            return Err(TriggerError::InvalidInterval(interval));
        }

        let mut worker = self.worker.lock();
        if let Some(running) = worker.as_ref() {
            warn!(
                "reorder trigger already running every {:?}, ignoring start",
                running.interval
            );
            return Ok(false);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let queue = Arc::clone(&self.queue);
            let ticks = Arc::clone(&self.ticks);
            let live = Arc::clone(&self.live);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name(self.thread_name.clone())
                .spawn(move || {
                    let _live = LiveWorker::enter(live);
                    run(&queue, interval, &stop, &ticks);
                })?
        };

        *worker = Some(Worker {
            handle,
            stop,
            interval,
        });
        info!("reorder trigger started, interval {interval:?}");
        Ok(true)
    }

    /// Stops and joins the maintenance thread.
    ///
    /// Returns `false` if the trigger was not running.
    pub fn stop(&self) -> bool {
        // Hold the slot until the old thread is joined so that a concurrent
        // `start` cannot overlap it. The thread never takes this lock.
        let mut slot = self.worker.lock();
        let Some(worker) = slot.take() else {
            return false;
        };

        worker.stop.store(true, Ordering::Release);
        worker.handle.thread().unpark();
        if worker.handle.join().is_err() {
            error!("reorder thread terminated abnormally");
        }
        drop(slot);

        info!("reorder trigger stopped");
        true
    }

    pub fn state(&self) -> TriggerState {
        if self.worker.lock().is_some() {
            TriggerState::Running
        } else {
            TriggerState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == TriggerState::Running
    }

    /// Interval of the running thread, if any.
    pub fn interval(&self) -> Option<Duration> {
        self.worker.lock().as_ref().map(|worker| worker.interval)
    }

    /// Number of completed repair passes since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn queue(&self) -> &Arc<DeadlineQueue> {
        &self.queue
    }

    /// Number of maintenance threads currently alive. Never more than one.
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

impl Drop for ReorderTrigger {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(queue: &DeadlineQueue, interval: Duration, stop: &AtomicBool, ticks: &AtomicU64) {
    let mut next_tick = Instant::now();

    loop {
        let Some(tick) = next_tick.checked_add(interval) else {
            warn!("repair interval {interval:?} exceeds the clock range, idling until stopped");
            park_until_stopped(stop);
            return;
        };
        next_tick = tick;
        if !sleep_until(next_tick, stop) {
            return;
        }

        if run_cycle(|| queue.repair_ordering()) {
            ticks.fetch_add(1, Ordering::AcqRel);
        }

        // Skip missed ticks instead of firing them back to back.
        let now = Instant::now();
        if next_tick.checked_add(interval).map_or(false, |limit| now > limit) {
            next_tick = now;
        }
    }
}

fn park_until_stopped(stop: &AtomicBool) {
    while !stop.load(Ordering::Acquire) {
        thread::park();
    }
}

/// Parks until `deadline`. Returns `false` if a stop was requested first.
fn sleep_until(deadline: Instant, stop: &AtomicBool) -> bool {
    loop {
        if stop.load(Ordering::Acquire) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::park_timeout(deadline - now);
    }
}

/// Runs one repair pass, containing any panic to this cycle.
fn run_cycle<F>(repair: F) -> bool
where
    F: FnOnce() -> usize,
{
    match panic::catch_unwind(AssertUnwindSafe(repair)) {
        Ok(moved) => {
            if moved > 0 {
                debug!("reorder pass restored order, {moved} nodes moved");
            }
            true
        }
        Err(_) => {
            error!("reorder pass panicked, retrying on next tick");
            false
        }
    }
}
