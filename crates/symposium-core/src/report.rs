//! Run reports and final statistics
//!
//! Once every philosopher thread has exited (or the grace period has
//! elapsed), the supervisor freezes the meal counters into a [`RunReport`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Final, race-free snapshot of one simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique ID of the run
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Meals completed per seat, indexed by seat id
    pub meals: Vec<u64>,
    /// Total grants the arbiter issued
    pub grants: u64,
    /// Adjacency violations flagged by the audit
    pub violations: u64,
    /// Seats whose threads missed the shutdown grace period
    pub stragglers: Vec<usize>,
}

impl RunReport {
    pub fn total_meals(&self) -> u64 {
        self.meals.iter().sum()
    }

    pub fn mean_meals(&self) -> f64 {
        if self.meals.is_empty() {
            return 0.0;
        }
        self.total_meals() as f64 / self.meals.len() as f64
    }

    /// Seat that ate the most, with its count
    pub fn max_seat(&self) -> Option<(usize, u64)> {
        self.meals
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
    }

    /// Seat that ate the least, with its count
    pub fn min_seat(&self) -> Option<(usize, u64)> {
        self.meals
            .iter()
            .copied()
            .enumerate()
            .min_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
    }

    /// Difference between the best- and worst-served seats
    pub fn spread(&self) -> u64 {
        match (self.max_seat(), self.min_seat()) {
            (Some((_, max)), Some((_, min))) => max - min,
            _ => 0,
        }
    }

    /// Wall-clock length of the run
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Final statistics ===")?;
        writeln!(
            f,
            "Run {} finished in {:.2}s",
            self.run_id,
            self.elapsed().num_milliseconds() as f64 / 1000.0
        )?;
        writeln!(f)?;
        writeln!(f, "Meals per seat:")?;
        for (seat, meals) in self.meals.iter().enumerate() {
            writeln!(f, "  seat {}: {}", seat, meals)?;
        }
        writeln!(f)?;
        writeln!(f, "Total meals: {}", self.total_meals())?;
        writeln!(f, "Mean meals per seat: {:.2}", self.mean_meals())?;
        if let Some((seat, meals)) = self.max_seat() {
            writeln!(f, "Most meals: seat {} ({})", seat, meals)?;
        }
        if let Some((seat, meals)) = self.min_seat() {
            writeln!(f, "Fewest meals: seat {} ({})", seat, meals)?;
        }
        writeln!(f, "Spread: {}", self.spread())?;
        write!(f, "Violations: {}", self.violations)?;
        if !self.stragglers.is_empty() {
            write!(f, "\nStragglers: {:?}", self.stragglers)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(meals: Vec<u64>) -> RunReport {
        let now = Utc::now();
        RunReport {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now + chrono::Duration::seconds(30),
            grants: meals.iter().sum(),
            meals,
            violations: 0,
            stragglers: Vec::new(),
        }
    }

    #[test]
    fn test_totals_and_mean() {
        let report = report(vec![17, 15, 19, 16, 14]);
        assert_eq!(report.total_meals(), 81);
        assert!((report.mean_meals() - 16.2).abs() < 1e-9);
    }

    #[test]
    fn test_max_min_and_spread() {
        let report = report(vec![17, 15, 19, 16, 14]);
        assert_eq!(report.max_seat(), Some((2, 19)));
        assert_eq!(report.min_seat(), Some((4, 14)));
        assert_eq!(report.spread(), 5);
    }

    #[test]
    fn test_ties_resolve_to_the_first_seat() {
        let report = report(vec![10, 12, 12, 10]);
        assert_eq!(report.max_seat(), Some((1, 12)));
        assert_eq!(report.min_seat(), Some((0, 10)));
    }

    #[test]
    fn test_empty_report() {
        let report = report(Vec::new());
        assert_eq!(report.total_meals(), 0);
        assert_eq!(report.mean_meals(), 0.0);
        assert_eq!(report.max_seat(), None);
        assert_eq!(report.spread(), 0);
    }

    #[test]
    fn test_serde_roundtrip() {
        let report = report(vec![1, 2, 3]);
        let json = serde_json::to_string(&report).unwrap();
        let parsed: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.meals, vec![1, 2, 3]);
        assert_eq!(parsed.run_id, report.run_id);
    }

    #[test]
    fn test_display_contains_the_stats_block() {
        let rendered = report(vec![3, 4]).to_string();
        assert!(rendered.contains("Total meals: 7"));
        assert!(rendered.contains("Mean meals per seat: 3.50"));
        assert!(rendered.contains("Most meals: seat 1 (4)"));
        assert!(rendered.contains("Fewest meals: seat 0 (3)"));
        assert!(rendered.contains("Spread: 1"));
    }
}
