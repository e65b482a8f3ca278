//! Error types raised by repository implementations.

use skirmish_core::{DomainError, ErrorSeverity, MissingReferenceError, RecordRef};
use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("document store lock was poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Missing(#[from] MissingReferenceError),
}

impl RepositoryError {
    pub fn missing(record: RecordRef) -> Self {
        Self::Missing(MissingReferenceError(record))
    }

    /// True when the record was already gone; callers treat this as cleaned up.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }
}

impl DomainError for RepositoryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::LockPoisoned => ErrorSeverity::Fatal,
            Self::Missing(_) => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::LockPoisoned => "STORE_LOCK_POISONED",
            Self::Missing(inner) => inner.error_code(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
