use crate::error::{DomainError, ErrorSeverity};

/// Errors raised while turning an item into a plan.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("branch nesting exceeds the limit of {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("item macro failed: {0}")]
    MacroFailed(String),
}

impl DomainError for FlowError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NestingTooDeep { .. } => ErrorSeverity::Validation,
            Self::MacroFailed(_) => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NestingTooDeep { .. } => "FLOW_NESTING_TOO_DEEP",
            Self::MacroFailed(_) => "FLOW_MACRO_FAILED",
        }
    }
}
