//! Philosopher lifecycle
//!
//! Each philosopher alternates between thinking and eating, asking the
//! arbiter for its shared edges before every meal and returning them
//! afterwards. The stop token is honored between phases: the think sleep
//! is interruptible, a parked request wakes with `Cancelled`, and a meal
//! that was already granted always finishes and releases cleanly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crate::delay::DelaySource;
use crate::sim::ShutdownToken;

use super::arbiter::Arbiter;
use super::gate::GateSignal;
use super::SeatId;

/// One concurrent agent of the ring
pub struct Philosopher {
    seat: SeatId,
    arbiter: Arc<Arbiter>,
    delays: Arc<dyn DelaySource>,
    shutdown: ShutdownToken,
    /// Written only by this philosopher; read by reporting after shutdown
    meals: Arc<AtomicU64>,
    /// Shared tally of audit findings across the run
    violations: Arc<AtomicU64>,
}

impl Philosopher {
    pub fn new(
        seat: SeatId,
        arbiter: Arc<Arbiter>,
        delays: Arc<dyn DelaySource>,
        shutdown: ShutdownToken,
        meals: Arc<AtomicU64>,
        violations: Arc<AtomicU64>,
    ) -> Self {
        Self {
            seat,
            arbiter,
            delays,
            shutdown,
            meals,
            violations,
        }
    }

    /// Think/eat until the stop token fires.
    pub fn run(self) {
        loop {
            // think
            if !self.shutdown.sleep_for(self.delays.next_delay()) {
                break;
            }

            match self.arbiter.request(self.seat) {
                GateSignal::Granted => {}
                GateSignal::Cancelled => break,
            }

            if self.arbiter.audit(self.seat).is_some() {
                self.violations.fetch_add(1, Ordering::Relaxed);
            }

            // eat; a granted meal is never cut short
            thread::sleep(self.delays.next_delay());
            self.meals.fetch_add(1, Ordering::Relaxed);
            self.arbiter.release(self.seat);

            if self.arbiter.budget_exhausted() {
                self.shutdown.trigger();
                break;
            }
            if self.shutdown.is_triggered() {
                break;
            }
        }
        tracing::trace!(seat = self.seat, "philosopher left the table");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::FixedDelay;
    use crate::events::NullSink;
    use std::time::Duration;

    fn spawn_philosopher(
        seat: SeatId,
        arbiter: &Arc<Arbiter>,
        shutdown: &ShutdownToken,
        meals: &Arc<AtomicU64>,
    ) -> thread::JoinHandle<()> {
        let philosopher = Philosopher::new(
            seat,
            Arc::clone(arbiter),
            Arc::new(FixedDelay::zero()),
            shutdown.clone(),
            Arc::clone(meals),
            Arc::new(AtomicU64::new(0)),
        );
        thread::spawn(move || philosopher.run())
    }

    #[test]
    fn test_philosopher_eats_until_budget_and_triggers_shutdown() {
        let arbiter = Arc::new(
            Arbiter::new(2, Arc::new(NullSink)).with_grant_budget(10),
        );
        let shutdown = ShutdownToken::new();
        let meals_a = Arc::new(AtomicU64::new(0));
        let meals_b = Arc::new(AtomicU64::new(0));

        let a = spawn_philosopher(0, &arbiter, &shutdown, &meals_a);
        let b = spawn_philosopher(1, &arbiter, &shutdown, &meals_b);

        // The budget-exhausting philosopher trips the token; the parked
        // one still needs the cancel broadcast
        while !shutdown.is_triggered() {
            thread::sleep(Duration::from_millis(5));
        }
        arbiter.cancel_all();
        a.join().unwrap();
        b.join().unwrap();

        let total = meals_a.load(Ordering::SeqCst) + meals_b.load(Ordering::SeqCst);
        assert_eq!(total, 10);
        assert_eq!(arbiter.total_grants(), 10);
    }

    #[test]
    fn test_philosopher_exits_from_the_think_phase() {
        let arbiter = Arc::new(Arbiter::new(2, Arc::new(NullSink)));
        let shutdown = ShutdownToken::new();
        let meals = Arc::new(AtomicU64::new(0));

        let philosopher = Philosopher::new(
            0,
            Arc::clone(&arbiter),
            Arc::new(FixedDelay::new(Duration::from_secs(30))),
            shutdown.clone(),
            Arc::clone(&meals),
            Arc::new(AtomicU64::new(0)),
        );
        let handle = thread::spawn(move || philosopher.run());

        thread::sleep(Duration::from_millis(50));
        shutdown.trigger();
        arbiter.cancel_all();
        handle.join().unwrap();

        // Interrupted mid-think: never requested, never ate
        assert_eq!(meals.load(Ordering::SeqCst), 0);
        assert_eq!(arbiter.total_grants(), 0);
    }
}
