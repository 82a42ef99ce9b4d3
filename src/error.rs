//! Error types for micropg.

use thiserror::Error;

/// Result type for micropg operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for micropg.
#[derive(Debug, Error)]
pub enum Error {
    /// Protocol error (malformed message, framing inconsistency, etc.)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session is disconnected and cannot accept work
    #[error("Session is disconnected")]
    Disconnected,

    /// Invalid usage (e.g., malformed connection URL)
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),
}
