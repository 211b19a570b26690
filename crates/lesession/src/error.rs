// Error Handling
//
// *La Gestion des Erreurs* (The Error Management) - Error taxonomy for session search

use thiserror::Error;

/// Result type for session search operations
pub type Result<T> = std::result::Result<T, Error>;

/// Session search error types
///
/// Every error is returned once to the immediate caller. The engine never
/// retries and never recovers silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Missing or invalid input (empty session id, bad configuration, malformed message)
    #[error("Validation error: {message}")]
    Validation {
        /// Human readable reason
        message: String,
    },

    /// Search requested for a session that was never indexed
    #[error("No index found for session: {session_id}")]
    IndexNotFound {
        /// Session that has no index
        session_id: String,
    },

    /// Unexpected failure while normalizing or matching
    #[error("Processing error: {message}")]
    Processing {
        /// Human readable reason
        message: String,
    },
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Create an index-not-found error
    pub fn index_not_found(session_id: impl Into<String>) -> Self {
        Error::IndexNotFound {
            session_id: session_id.into(),
        }
    }

    /// Create a processing error
    pub fn processing(message: impl Into<String>) -> Self {
        Error::Processing {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for client handling
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::IndexNotFound { .. } => "INDEX_NOT_FOUND",
            Error::Processing { .. } => "PROCESSING_ERROR",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::processing(err.to_string())
    }
}

/// Reject empty or whitespace-only session identifiers
pub(crate) fn ensure_session_id(session_id: &str) -> Result<()> {
    if session_id.trim().is_empty() {
        return Err(Error::validation("Session ID is required"));
    }
    Ok(())
}
