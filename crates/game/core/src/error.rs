//! Common error infrastructure for skirmish-core.
//!
//! This module provides the severity classification shared by every error in
//! the crate, plus the four cross-cutting error kinds that both the pure core
//! and the runtime raise:
//!
//! - [`ConfigurationError`]: a condition references an unknown event/action pair
//! - [`AuthorizationError`]: a user tries to mutate a record they do not own
//! - [`MissingReferenceError`]: a stored identifier no longer resolves
//! - [`ConcurrentModificationError`]: a record vanished between read and write
//!
//! Domain-specific errors (e.g. [`crate::flow::FlowError`]) live beside the
//! code that raises them and implement [`DomainError`] as well.

use crate::state::{
    ActivationId, ActorId, EffectId, ItemId, MessageId, TemplateId, TokenId, UserId,
};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the operation can be skipped and the batch continues
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistencies that require investigation
/// - **Fatal**: unrecoverable errors indicating corrupted records
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - skip the item and carry on.
    ///
    /// Examples: message already deleted, token removed mid-reconciliation
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: unknown condition event, unauthorized damage application
    Validation,

    /// Internal error - unexpected state inconsistency.
    Internal,

    /// Fatal error - record corrupted, cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all skirmish-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait DomainError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// A condition entry references an event or action the trigger matrix does
/// not know, or pairs them in a way the matrix forbids.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfigurationError {
    #[error("unknown condition event `{0}`")]
    UnknownEvent(String),

    #[error("unknown update action `{0}`")]
    UnknownAction(String),

    #[error("update action `{action}` cannot be paired with condition event `{event}`")]
    InvalidPair { event: String, action: String },

    #[error("condition event `{event}` is not available on {scope} conditions")]
    OutOfScope { event: String, scope: String },

    #[error("condition #{index}: {source}")]
    AtIndex {
        index: usize,
        #[source]
        source: Box<ConfigurationError>,
    },
}

impl ConfigurationError {
    /// Wraps this error with the position of the offending entry.
    pub fn at(self, index: usize) -> Self {
        Self::AtIndex {
            index,
            source: Box::new(self),
        }
    }
}

impl DomainError for ConfigurationError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownEvent(_) => "CONFIG_UNKNOWN_EVENT",
            Self::UnknownAction(_) => "CONFIG_UNKNOWN_ACTION",
            Self::InvalidPair { .. } => "CONFIG_INVALID_PAIR",
            Self::OutOfScope { .. } => "CONFIG_OUT_OF_SCOPE",
            Self::AtIndex { source, .. } => source.error_code(),
        }
    }
}

/// A user without privilege or ownership attempted a mutation.
///
/// Callers treat this as a no-op: the record stays untouched and the
/// triggering control is left inert.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("user {user:?} may not modify actor {actor:?}")]
pub struct AuthorizationError {
    pub user: UserId,
    pub actor: ActorId,
}

impl DomainError for AuthorizationError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        "UNAUTHORIZED"
    }
}

/// Identifier of a stored record that a reference may point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordRef {
    Actor(ActorId),
    Item(ItemId),
    Token(TokenId),
    Effect(EffectId),
    Template(TemplateId),
    Message(MessageId),
    Activation(ActivationId),
}

/// A stored identifier no longer resolves.
///
/// Treated as "already cleaned up": the caller skips the item.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("referenced record {0:?} no longer exists")]
pub struct MissingReferenceError(pub RecordRef);

impl DomainError for MissingReferenceError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        "MISSING_REFERENCE"
    }
}

/// A record changed underneath an in-flight pass (e.g. a token deleted while
/// auras were being reconciled). The affected entry is dropped from the pass.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("record {0:?} was modified concurrently")]
pub struct ConcurrentModificationError(pub RecordRef);

impl DomainError for ConcurrentModificationError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        "CONCURRENT_MODIFICATION"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_configuration_error_keeps_inner_code() {
        let err = ConfigurationError::UnknownEvent("dance".into()).at(3);
        assert_eq!(err.error_code(), "CONFIG_UNKNOWN_EVENT");
        assert_eq!(err.to_string(), "condition #3: unknown condition event `dance`");
        assert_eq!(err.severity(), ErrorSeverity::Validation);
    }

    #[test]
    fn missing_references_are_recoverable() {
        let err = MissingReferenceError(RecordRef::Message(MessageId(7)));
        assert!(err.severity().is_recoverable());
        assert!(!err.severity().is_internal());
    }
}
