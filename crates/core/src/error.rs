//! Error types shared by backend implementations

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The ticketing backend rejected the request
    #[error("Ticket submission failed: {0}")]
    Submission(String),

    /// The ticketing backend could not be reached
    #[error("Ticket backend unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result alias used across the core traits
pub type Result<T> = std::result::Result<T, Error>;
