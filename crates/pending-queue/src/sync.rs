//! Lock abstraction shared by the queue and its maintenance thread.
//!
//! With the default `std` feature the queue is guarded by a
//! `parking_lot::Mutex`. The `lock-free` feature swaps in `spin::Mutex`,
//! which never parks the calling thread. Neither backend poisons on panic, so
//! a panicking holder leaves the protected heap exactly as it found it.

pub use std::sync::Arc;

#[cfg(not(any(feature = "std", feature = "lock-free")))]
compile_error!("pending-queue needs either the `std` or the `lock-free` feature");

#[cfg(not(feature = "lock-free"))]
pub type MutexGuard<'a, T> = parking_lot::MutexGuard<'a, T>;
#[cfg(feature = "lock-free")]
pub type MutexGuard<'a, T> = spin::MutexGuard<'a, T>;

/// Mutex wrapper used for every critical section in the crate.
pub struct Mutex<T> {
    #[cfg(not(feature = "lock-free"))]
    inner: parking_lot::Mutex<T>,
    #[cfg(feature = "lock-free")]
    inner: spin::Mutex<T>,
}

impl<T> Mutex<T> {
    /// Creates a new mutex protecting the given value.
    pub fn new(value: T) -> Self {
        Self {
            #[cfg(not(feature = "lock-free"))]
            inner: parking_lot::Mutex::new(value),
            #[cfg(feature = "lock-free")]
            inner: spin::Mutex::new(value),
        }
    }

    /// Acquires the mutex, blocking until it becomes available.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }
}
