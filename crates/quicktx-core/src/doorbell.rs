//! Data-available signal between the producer and the sleeping consumer.
//!
//! The flag can be read lock-free from the hot path; the mutex only guards
//! the sleep/wake handshake so that a ring between the sleeper's last check
//! and its wait is never lost.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct Doorbell {
    flag: AtomicBool,
    lock: Mutex<()>,
    cond: Condvar,
}

impl Doorbell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag and wakes every sleeper.
    pub fn ring(&self) {
        self.flag.store(true, Ordering::Release);
        let _guard = self.guard();
        self.cond.notify_all();
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_rung(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Blocks until the flag is raised or `ready` returns true.
    pub fn wait_until<F>(&self, mut ready: F)
    where
        F: FnMut() -> bool,
    {
        let mut guard = self.guard();
        while !self.is_rung() && !ready() {
            guard = self.cond.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`Doorbell::wait_until`] but gives up after `timeout`.
    /// Returns false on timeout.
    pub fn wait_until_timeout<F>(&self, timeout: Duration, mut ready: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut guard = self.guard();
        loop {
            if self.is_rung() || ready() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = self
                .cond
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The mutex protects no data, a poisoned lock is still usable.
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
