//! Simulation runtime - thread orchestration and shutdown
//!
//! One OS thread per seat plus a supervisory timer. The timer ends the
//! run after the configured duration (or as soon as the grant budget is
//! spent), closes the arbiter, and the caller then collects every
//! philosopher under a bounded grace period before freezing the counters
//! into a report.

pub mod shutdown;

pub use shutdown::ShutdownToken;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::delay::{DelaySource, UniformDelay};
use crate::error::{Error, Result};
use crate::events::{EventSink, NullSink};
use crate::report::RunReport;
use crate::table::{Arbiter, Philosopher};

/// How often a join waits between liveness checks during the grace period
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A configured dining run
pub struct Simulation {
    config: Config,
    sink: Arc<dyn EventSink>,
    delays: Arc<dyn DelaySource>,
}

impl Simulation {
    pub fn new(config: Config) -> Self {
        let delays: Arc<dyn DelaySource> = match config.delay.seed {
            Some(seed) => Arc::new(UniformDelay::with_seed(config.delay.max_phase_delay(), seed)),
            None => Arc::new(UniformDelay::new(config.delay.max_phase_delay())),
        };
        Self {
            config,
            sink: Arc::new(NullSink),
            delays,
        }
    }

    /// Replace the event sink (narration, diagnostics, test probes)
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the phase-delay source (deterministic runs)
    pub fn with_delays(mut self, delays: Arc<dyn DelaySource>) -> Self {
        self.delays = delays;
        self
    }

    /// Run the table to completion and return the final statistics.
    pub fn run(&self) -> Result<RunReport> {
        self.config.validate()?;

        let seats = self.config.table.seats;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let mut arbiter = Arbiter::new(seats, Arc::clone(&self.sink));
        if let Some(budget) = self.config.run.max_meals {
            arbiter = arbiter.with_grant_budget(budget);
        }
        let arbiter = Arc::new(arbiter);
        let shutdown = ShutdownToken::new();
        let meals: Vec<Arc<AtomicU64>> = (0..seats).map(|_| Arc::new(AtomicU64::new(0))).collect();
        let violations = Arc::new(AtomicU64::new(0));

        tracing::info!(
            %run_id,
            seats,
            duration_secs = self.config.run.duration_secs,
            max_meals = self.config.run.max_meals,
            "starting dining run"
        );

        let mut handles = Vec::with_capacity(seats);
        for seat in 0..seats {
            let philosopher = Philosopher::new(
                seat,
                Arc::clone(&arbiter),
                Arc::clone(&self.delays),
                shutdown.clone(),
                Arc::clone(&meals[seat]),
                Arc::clone(&violations),
            );
            let handle = thread::Builder::new()
                .name(format!("philosopher-{seat}"))
                .spawn(move || philosopher.run())
                .map_err(|e| Error::Spawn(format!("philosopher-{seat}"), e))?;
            handles.push(handle);
        }

        // Supervisory timer: wakes early if a philosopher spends the
        // grant budget, otherwise fires at the configured duration
        let timer = {
            let shutdown = shutdown.clone();
            let arbiter = Arc::clone(&arbiter);
            let duration = self.config.run.duration();
            thread::Builder::new()
                .name("supervisor".into())
                .spawn(move || {
                    shutdown.sleep_for(duration);
                    shutdown.trigger();
                    arbiter.cancel_all();
                    tracing::info!("stop signal sent to the table");
                })
                .map_err(|e| Error::Spawn("supervisor".into(), e))?
        };

        if timer.join().is_err() {
            tracing::warn!("supervisor thread panicked");
        }

        // Collect philosophers under the grace period; one shared
        // deadline, not one per thread
        let deadline = Instant::now() + self.config.run.grace();
        let mut stragglers = Vec::new();
        for (seat, handle) in handles.into_iter().enumerate() {
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(JOIN_POLL_INTERVAL);
            }
            if handle.is_finished() {
                if handle.join().is_err() {
                    tracing::warn!(seat, "philosopher thread panicked");
                }
            } else {
                tracing::warn!(seat, "philosopher missed the shutdown grace period");
                stragglers.push(seat);
            }
        }

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            meals: meals.iter().map(|m| m.load(Ordering::SeqCst)).collect(),
            grants: arbiter.total_grants(),
            violations: violations.load(Ordering::SeqCst),
            stragglers,
        };
        tracing::info!(
            total_meals = report.total_meals(),
            grants = report.grants,
            violations = report.violations,
            "dining run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::FixedDelay;

    fn quick_config(seats: usize, max_meals: u64) -> Config {
        let mut config = Config::default();
        config.table.seats = seats;
        config.run.duration_secs = 10;
        config.run.grace_secs = 2;
        config.run.max_meals = Some(max_meals);
        config.delay.max_phase_delay_ms = 0;
        config
    }

    #[test]
    fn test_budgeted_run_serves_exactly_the_budget() {
        let report = Simulation::new(quick_config(5, 50))
            .with_delays(Arc::new(FixedDelay::zero()))
            .run()
            .unwrap();

        assert_eq!(report.total_meals(), 50);
        assert_eq!(report.grants, 50);
        assert_eq!(report.violations, 0);
        assert!(report.stragglers.is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.table.seats = 1;
        assert!(Simulation::new(config).run().is_err());
    }

    #[test]
    fn test_timed_run_stops_on_schedule() {
        let mut config = Config::default();
        config.run.duration_secs = 1;
        config.run.grace_secs = 2;
        config.delay.max_phase_delay_ms = 20;
        config.delay.seed = Some(11);

        let start = Instant::now();
        let report = Simulation::new(config).run().unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_secs(1));
        assert!(
            elapsed < Duration::from_secs(5),
            "run took {:?}, shutdown is not bounded",
            elapsed
        );
        assert!(report.stragglers.is_empty());
        assert_eq!(report.total_meals(), report.grants);
    }
}
