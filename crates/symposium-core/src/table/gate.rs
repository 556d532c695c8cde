//! Per-seat grant gate
//!
//! A single-slot wake-up signal used to park a philosopher whose request
//! could not be granted immediately. The arbiter deposits at most one
//! signal per outstanding request; the first deposit wins so a grant that
//! was already issued is never swallowed by a later shutdown broadcast.

use std::sync::{Condvar, Mutex, PoisonError};

/// Outcome delivered through a [`Gate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateSignal {
    /// The arbiter granted the seat's request; the seat is now eating
    Granted,
    /// The run is shutting down; the waiter must abandon its loop
    Cancelled,
}

/// Single-slot wake-up signal owned by one seat
///
/// Only the thread holding the arbiter lock deposits into the slot, and
/// only the owning seat's thread waits on it.
pub struct Gate {
    slot: Mutex<Option<GateSignal>>,
    cond: Condvar,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            cond: Condvar::new(),
        }
    }

    /// Deposit a signal and wake the waiter.
    ///
    /// An occupied slot keeps its existing signal: a pending grant means
    /// the seat already transitioned to eating and must consume that grant
    /// before it can observe anything else.
    pub fn signal(&self, signal: GateSignal) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(signal);
        }
        self.cond.notify_one();
    }

    /// Block until a signal arrives, consuming it.
    pub fn wait(&self) -> GateSignal {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(signal) = slot.take() {
                return signal;
            }
            slot = self
                .cond
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_signal_before_wait_returns_immediately() {
        let gate = Gate::new();
        gate.signal(GateSignal::Granted);
        assert_eq!(gate.wait(), GateSignal::Granted);
    }

    #[test]
    fn test_wait_blocks_until_signalled() {
        let gate = Arc::new(Gate::new());
        let (tx, rx) = mpsc::channel();

        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let signal = gate.wait();
                tx.send(signal).unwrap();
            })
        };

        // The waiter should still be parked
        assert!(
            rx.recv_timeout(Duration::from_millis(50)).is_err(),
            "waiter returned before any signal"
        );

        gate.signal(GateSignal::Granted);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            GateSignal::Granted
        );
        waiter.join().unwrap();
    }

    #[test]
    fn test_first_signal_wins() {
        let gate = Gate::new();
        gate.signal(GateSignal::Granted);
        gate.signal(GateSignal::Cancelled);
        assert_eq!(gate.wait(), GateSignal::Granted);
    }

    #[test]
    fn test_slot_is_consumed_by_wait() {
        let gate = Gate::new();
        gate.signal(GateSignal::Cancelled);
        assert_eq!(gate.wait(), GateSignal::Cancelled);

        // The slot is empty again and accepts the next signal
        gate.signal(GateSignal::Granted);
        assert_eq!(gate.wait(), GateSignal::Granted);
    }
}
