//! Ring arbiter - the three-state grant protocol
//!
//! One mutex guards the ring of seat states. Every read-modify-write of
//! the ring (request, release, and the evaluation they trigger) runs
//! inside that critical section, which stays O(1): a grant decision only
//! ever inspects a seat and its two neighbors. The lock is never held
//! across a sleep or a gate wait.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::events::{EventSink, TableEvent};

use super::gate::{Gate, GateSignal};
use super::{SeatId, SeatState, SeatView};

/// Adjacency violation observed by [`Arbiter::audit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub seat: SeatId,
    pub left: SeatView,
    pub right: SeatView,
}

struct RingState {
    seats: Vec<SeatState>,
    /// Set once during shutdown; no request is admitted and no grant is
    /// issued afterwards, so a gate never sees a grant race a cancel
    closed: bool,
}

impl RingState {
    fn left(&self, seat: SeatId) -> SeatId {
        (seat + self.seats.len() - 1) % self.seats.len()
    }

    fn right(&self, seat: SeatId) -> SeatId {
        (seat + 1) % self.seats.len()
    }

    fn neighbors(&self, seat: SeatId) -> (SeatView, SeatView) {
        let left = self.left(seat);
        let right = self.right(seat);
        (
            SeatView::new(left, self.seats[left]),
            SeatView::new(right, self.seats[right]),
        )
    }
}

/// Mediator for the ring: decides, on every state change, which seats may
/// enter their critical phase.
///
/// A seat may eat iff it is hungry and neither neighbor is eating. The
/// predicate is re-evaluated at the three positions a transition can
/// affect: the seat itself on `request`, both neighbors on `release`.
/// That re-evaluation is what makes the protocol deadlock-free; checking
/// both neighbors inside the critical section is what makes it safe.
pub struct Arbiter {
    ring: Mutex<RingState>,
    gates: Vec<Gate>,
    sink: Arc<dyn EventSink>,
    grants: AtomicU64,
    grant_budget: Option<u64>,
}

impl Arbiter {
    /// Create an arbiter for a ring of `seats` seats, all thinking.
    pub fn new(seats: usize, sink: Arc<dyn EventSink>) -> Self {
        assert!(seats >= 2, "a ring needs at least two seats");
        Self {
            ring: Mutex::new(RingState {
                seats: vec![SeatState::Thinking; seats],
                closed: false,
            }),
            gates: (0..seats).map(|_| Gate::new()).collect(),
            sink,
            grants: AtomicU64::new(0),
            grant_budget: None,
        }
    }

    /// Stop granting once `budget` grants have been issued.
    ///
    /// Used to end a run after an exact number of meals: the budget is
    /// checked under the ring lock, so the final grant count equals the
    /// budget even under full contention.
    pub fn with_grant_budget(mut self, budget: u64) -> Self {
        self.grant_budget = Some(budget);
        self
    }

    /// Number of seats in the ring
    pub fn seats(&self) -> usize {
        self.gates.len()
    }

    /// Ask for both shared edges; blocks until granted or cancelled.
    ///
    /// Marks the seat hungry and evaluates it immediately; if the grant
    /// cannot be issued yet the caller parks on its gate until a
    /// neighbor's release (or shutdown) wakes it. On `Granted` the seat is
    /// eating; on `Cancelled` the caller must abandon its loop.
    pub fn request(&self, seat: SeatId) -> GateSignal {
        {
            let mut ring = self.lock_ring();
            if ring.closed {
                return GateSignal::Cancelled;
            }
            ring.seats[seat] = SeatState::Hungry;
            self.emit_transition(&ring, seat);
            self.evaluate(&mut ring, seat);
        }
        self.gates[seat].wait()
    }

    /// Return both shared edges and wake any neighbor this unblocks.
    pub fn release(&self, seat: SeatId) {
        let mut ring = self.lock_ring();
        ring.seats[seat] = SeatState::Thinking;
        self.emit_transition(&ring, seat);
        let left = ring.left(seat);
        let right = ring.right(seat);
        self.evaluate(&mut ring, left);
        self.evaluate(&mut ring, right);
    }

    /// Grant `seat` iff it is hungry and neither neighbor is eating.
    ///
    /// Called with the ring lock held. Signals the seat's gate exactly
    /// once per grant.
    fn evaluate(&self, ring: &mut RingState, seat: SeatId) {
        if ring.closed {
            return;
        }
        if ring.seats[seat] != SeatState::Hungry {
            return;
        }
        if ring.seats[ring.left(seat)].is_eating() || ring.seats[ring.right(seat)].is_eating() {
            return;
        }
        if let Some(budget) = self.grant_budget {
            if self.grants.load(Ordering::Relaxed) >= budget {
                return;
            }
        }

        ring.seats[seat] = SeatState::Eating;
        self.grants.fetch_add(1, Ordering::Relaxed);
        self.emit_transition(ring, seat);
        self.gates[seat].signal(GateSignal::Granted);
    }

    /// Diagnostic integrity check run by a seat before it starts eating.
    ///
    /// Reads both neighbors under the ring lock and flags a violation if
    /// either is recorded as eating. Correctness never depends on this;
    /// it exists to surface a protocol defect to the diagnostics sink.
    pub fn audit(&self, seat: SeatId) -> Option<Violation> {
        let ring = self.lock_ring();
        let (left, right) = ring.neighbors(seat);
        if left.state.is_eating() || right.state.is_eating() {
            self.sink
                .record(&TableEvent::Violation { seat, left, right });
            Some(Violation { seat, left, right })
        } else {
            None
        }
    }

    /// Close the ring and wake every parked waiter with `Cancelled`.
    ///
    /// Grants issued before closure stay pending in their gates and are
    /// still consumed by their owners, so an already-granted meal always
    /// completes.
    pub fn cancel_all(&self) {
        {
            let mut ring = self.lock_ring();
            ring.closed = true;
        }
        for gate in &self.gates {
            gate.signal(GateSignal::Cancelled);
        }
    }

    /// Race-free copy of the ring states
    pub fn snapshot(&self) -> Vec<SeatState> {
        self.lock_ring().seats.clone()
    }

    /// Total grants issued so far
    pub fn total_grants(&self) -> u64 {
        self.grants.load(Ordering::Relaxed)
    }

    /// Whether the grant budget, if any, has been used up
    pub fn budget_exhausted(&self) -> bool {
        self.grant_budget
            .is_some_and(|budget| self.total_grants() >= budget)
    }

    fn lock_ring(&self) -> MutexGuard<'_, RingState> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit_transition(&self, ring: &RingState, seat: SeatId) {
        let (left, right) = ring.neighbors(seat);
        self.sink.record(&TableEvent::Transition {
            seat,
            state: ring.seats[seat],
            left,
            right,
        });
    }
}
