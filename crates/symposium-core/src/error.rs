//! Error types for Symposium

use thiserror::Error;

/// Result type alias using Symposium's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Symposium error types
///
/// The grant protocol itself has no failure modes: `request` and `release`
/// are called only by the seat's own thread, in the order the lifecycle
/// loop guarantees, and cancellation during a wait is a designed outcome
/// rather than an error. What remains is configuration and thread plumbing.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to spawn thread '{0}': {1}")]
    Spawn(String, std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
