//! Error types for the Doorman service.

use thiserror::Error;

/// Main error type for Doorman operations.
#[derive(Error, Debug)]
pub enum DoormanError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Admission quota exhausted for a client
    #[error("Quota exceeded: limit {limit} per window, retry after {retry_after_secs}s")]
    QuotaExceeded { limit: u32, retry_after_secs: u64 },

    /// Credential failed verification; the cause is deliberately not
    /// distinguished further
    #[error("Invalid credential")]
    InvalidCredential,

    /// Identity referenced by a credential no longer resolves
    #[error("Identity not found")]
    IdentityNotFound,

    /// Identity resolves but the account is disabled
    #[error("Identity inactive")]
    IdentityInactive,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Doorman operations.
pub type Result<T> = std::result::Result<T, DoormanError>;
