//! Error types for segcraft-fab
//!
//! Fabrication fails in one of two ways, distinguished by what the caller
//! should do next:
//! - **Fatal**: the chain's history or catalog is structurally broken for
//!   this attempt; replan at the chain level instead of retrying the segment.
//! - **Transient**: a collaborator was temporarily unavailable; retrying the
//!   same segment from scratch is safe.
//!
//! Expected absences are never errors; they surface as `Option` results and
//! segment messages.

use segcraft_common::segment::StoreError;
use thiserror::Error;

/// Fabrication failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FabricationError {
    /// Structural failure; do not retry this segment blindly
    #[error("Fatal fabrication error: {0}")]
    Fatal(String),

    /// Service failure; safe to retry
    #[error("Transient fabrication error: {0}")]
    Transient(String),
}

impl FabricationError {
    pub fn fatal(message: impl Into<String>) -> Self {
        FabricationError::Fatal(message.into())
    }

    pub fn transient(message: impl Into<String>) -> Self {
        FabricationError::Transient(message.into())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, FabricationError::Fatal(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, FabricationError::Transient(_))
    }
}

impl From<StoreError> for FabricationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) => FabricationError::Transient(err.to_string()),
            StoreError::NotFound(_) | StoreError::Invalid(_) => {
                FabricationError::Fatal(err.to_string())
            }
        }
    }
}

impl From<segcraft_common::Error> for FabricationError {
    fn from(err: segcraft_common::Error) -> Self {
        match err {
            segcraft_common::Error::Io(_) => FabricationError::Transient(err.to_string()),
            _ => FabricationError::Fatal(err.to_string()),
        }
    }
}

/// Convenience Result type using FabricationError
pub type Result<T> = std::result::Result<T, FabricationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_classification() {
        let err: FabricationError = StoreError::Unavailable("down".to_string()).into();
        assert!(err.is_retryable());
        assert!(!err.is_fatal());

        let err: FabricationError = StoreError::NotFound("Segment[1]".to_string()).into();
        assert!(err.is_fatal());

        let err: FabricationError = StoreError::Invalid("bad".to_string()).into();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_config_error_is_fatal() {
        let err: FabricationError = segcraft_common::Error::Config("tempo_min".to_string()).into();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("tempo_min"));
    }
}
