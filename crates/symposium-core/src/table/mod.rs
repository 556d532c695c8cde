//! Table domain - seats, seat states, and the ring arbiter

pub mod arbiter;
pub mod gate;
pub mod philosopher;

pub use arbiter::{Arbiter, Violation};
pub use gate::{Gate, GateSignal};
pub use philosopher::Philosopher;

use serde::{Deserialize, Serialize};

/// Identifier of a seat at the table, in `[0, seats)`
pub type SeatId = usize;

/// State of one seat in the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatState {
    /// Not interested in the shared edges
    Thinking,
    /// Waiting for both shared edges
    Hungry,
    /// Holding both shared edges
    Eating,
}

impl SeatState {
    /// Check if the seat currently holds its shared edges
    pub fn is_eating(&self) -> bool {
        matches!(self, Self::Eating)
    }

    /// Check if the seat is waiting for its shared edges
    pub fn is_hungry(&self) -> bool {
        matches!(self, Self::Hungry)
    }
}

impl std::fmt::Display for SeatState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Thinking => write!(f, "thinking"),
            Self::Hungry => write!(f, "hungry"),
            Self::Eating => write!(f, "eating"),
        }
    }
}

/// A seat id paired with the state recorded for it at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    pub seat: SeatId,
    pub state: SeatState,
}

impl SeatView {
    pub fn new(seat: SeatId, state: SeatState) -> Self {
        Self { seat, state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_state_display() {
        assert_eq!(SeatState::Thinking.to_string(), "thinking");
        assert_eq!(SeatState::Hungry.to_string(), "hungry");
        assert_eq!(SeatState::Eating.to_string(), "eating");
    }

    #[test]
    fn test_seat_state_predicates() {
        assert!(SeatState::Eating.is_eating());
        assert!(!SeatState::Hungry.is_eating());
        assert!(SeatState::Hungry.is_hungry());
        assert!(!SeatState::Thinking.is_hungry());
    }

    #[test]
    fn test_seat_state_serde_snake_case() {
        let json = serde_json::to_string(&SeatState::Hungry).unwrap();
        assert_eq!(json, "\"hungry\"");
        let parsed: SeatState = serde_json::from_str("\"eating\"").unwrap();
        assert_eq!(parsed, SeatState::Eating);
    }

    #[test]
    fn test_seat_view_roundtrip() {
        let view = SeatView::new(3, SeatState::Thinking);
        let json = serde_json::to_string(&view).unwrap();
        let parsed: SeatView = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, view);
    }
}
