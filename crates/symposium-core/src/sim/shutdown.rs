//! Cooperative shutdown signalling
//!
//! One token is shared by every thread in a run. The flag is an atomic so
//! it can be polled without taking any lock; the condvar lets bounded
//! sleeps end early the moment the flag flips, which keeps shutdown
//! latency bounded even while every philosopher is mid-think.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Run-wide stop signal
#[derive(Clone)]
pub struct ShutdownToken {
    inner: Arc<Inner>,
}

struct Inner {
    triggered: AtomicBool,
    lock: Mutex<()>,
    cond: Condvar,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                triggered: AtomicBool::new(false),
                lock: Mutex::new(()),
                cond: Condvar::new(),
            }),
        }
    }

    /// Flip the stop flag and wake every interruptible sleeper.
    ///
    /// Idempotent; any thread may call it.
    pub fn trigger(&self) {
        self.inner.triggered.store(true, Ordering::SeqCst);
        // Taking the lock orders the store before the wake-up, so a
        // sleeper cannot check the flag and then miss the notify
        let _guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.cond.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, ending early if the token fires.
    ///
    /// Returns true if the full duration elapsed, false if the sleep was
    /// cut short (or the token had already fired).
    pub fn sleep_for(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if self.is_triggered() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let (g, _) = self
                .inner
                .cond
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            guard = g;
        }
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}
