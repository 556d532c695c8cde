//! Pluggable phase-duration sources
//!
//! Philosophers draw their think/eat durations from a [`DelaySource`], so
//! the demo can run against wall-clock randomness while tests inject fixed
//! (or zero) durations and race purely on the protocol.

use rand::prelude::*;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Source of think/eat phase durations
pub trait DelaySource: Send + Sync {
    /// Duration of the next think or eat phase
    fn next_delay(&self) -> Duration;
}

/// Uniform random delays in `[0, max]`, millisecond granularity
pub struct UniformDelay {
    max: Duration,
    rng: Mutex<StdRng>,
}

impl UniformDelay {
    pub fn new(max: Duration) -> Self {
        Self {
            max,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a source with a fixed seed (for reproducible runs)
    pub fn with_seed(max: Duration, seed: u64) -> Self {
        Self {
            max,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl DelaySource for UniformDelay {
    fn next_delay(&self) -> Duration {
        let max_ms = self.max.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        let ms = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..=max_ms);
        Duration::from_millis(ms)
    }
}

/// The same delay every time
pub struct FixedDelay(Duration);

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self(delay)
    }

    /// Zero-length phases: philosophers race purely on the protocol
    pub fn zero() -> Self {
        Self(Duration::ZERO)
    }
}

impl DelaySource for FixedDelay {
    fn next_delay(&self) -> Duration {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_is_constant() {
        let source = FixedDelay::new(Duration::from_millis(7));
        assert_eq!(source.next_delay(), Duration::from_millis(7));
        assert_eq!(source.next_delay(), Duration::from_millis(7));
    }

    #[test]
    fn test_zero_delay() {
        assert_eq!(FixedDelay::zero().next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_uniform_delay_respects_the_bound() {
        let max = Duration::from_millis(50);
        let source = UniformDelay::with_seed(max, 42);
        for _ in 0..200 {
            assert!(source.next_delay() <= max);
        }
    }

    #[test]
    fn test_uniform_delay_with_zero_bound_is_zero() {
        let source = UniformDelay::new(Duration::ZERO);
        assert_eq!(source.next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_seeded_sources_agree() {
        let a = UniformDelay::with_seed(Duration::from_millis(100), 7);
        let b = UniformDelay::with_seed(Duration::from_millis(100), 7);
        let first: Vec<Duration> = (0..10).map(|_| a.next_delay()).collect();
        let second: Vec<Duration> = (0..10).map(|_| b.next_delay()).collect();
        assert_eq!(first, second);
    }
}
