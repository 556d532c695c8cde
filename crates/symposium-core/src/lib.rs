//! Symposium Core Library
//!
//! This crate provides the core functionality for Symposium, including:
//! - The ring arbiter (thinking/hungry/eating grant protocol)
//! - Philosopher lifecycle loops with cooperative shutdown
//! - Event sinks for transition narration and adjacency diagnostics
//! - Pluggable phase-delay sources
//! - Run reports and final statistics

pub mod config;
pub mod delay;
pub mod error;
pub mod events;
pub mod report;
pub mod sim;
pub mod table;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::delay::{DelaySource, FixedDelay, UniformDelay};
    pub use crate::error::{Error, Result};
    pub use crate::events::{EventSink, NullSink, TableEvent, TracingSink};
    pub use crate::report::RunReport;
    pub use crate::sim::{ShutdownToken, Simulation};
    pub use crate::table::{Arbiter, SeatState};
}
