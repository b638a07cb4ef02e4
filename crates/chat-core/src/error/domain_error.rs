//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

impl DomainError {
    /// Get an error code string for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::DirectoryUnavailable(_) => "DIRECTORY_UNAVAILABLE",
        }
    }
}
