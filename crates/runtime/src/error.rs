//! Unified error types surfaced by the runtime.
//!
//! Wraps failures from worker coordination, the document store and plan
//! building so callers can bubble them up with consistent context.

use skirmish_core::{
    ActivationId, AuthorizationError, ConfigurationError, DomainError, ErrorSeverity, FlowError,
    FormulaError, MissingReferenceError,
};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::activation::ActivationState;
pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("privileged relay channel closed")]
    RelayChannelClosed,

    #[error("privileged relay reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("removal queue channel closed")]
    RemovalChannelClosed,

    #[error("session requires a document store before building")]
    MissingStore,

    #[error("worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to build plan")]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("activation {activation} is {state:?}, expected {expected:?}")]
    InvalidState {
        activation: ActivationId,
        state: ActivationState,
        expected: ActivationState,
    },

    #[error("no executor registered for step `{0}`")]
    UnknownStep(String),

    #[error("step `{step}` failed")]
    Step {
        step: String,
        #[source]
        source: StepError,
    },

    #[error("hook cascade exceeded {limit} events")]
    HookCascade { limit: usize },
}

/// Failures raised while executing a single step.
///
/// The runner records them on the activation, which then ends as failed;
/// other activations are unaffected.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Missing(#[from] MissingReferenceError),

    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),

    #[error("invalid damage formula")]
    Formula(#[from] FormulaError),

    #[error("step `{step}` received input it did not ask for")]
    UnexpectedInput { step: String },

    #[error("no earlier step produced {0}")]
    MissingOutput(&'static str),

    #[error(transparent)]
    Runtime(Box<RuntimeError>),

    #[error("{0}")]
    Failed(String),
}

impl From<RuntimeError> for StepError {
    fn from(error: RuntimeError) -> Self {
        StepError::Runtime(Box::new(error))
    }
}

impl RuntimeError {
    /// True when the failure only means a record was already cleaned up.
    pub fn is_missing(&self) -> bool {
        matches!(self, RuntimeError::Repository(error) if error.is_missing())
    }
}

impl DomainError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::Repository(error) => error.severity(),
            RuntimeError::Flow(error) => error.severity(),
            RuntimeError::Configuration(error) => error.severity(),
            RuntimeError::InvalidState { .. } | RuntimeError::UnknownStep(_) => {
                ErrorSeverity::Validation
            }
            RuntimeError::Step { source, .. } => source.severity(),
            RuntimeError::MissingStore => ErrorSeverity::Validation,
            RuntimeError::RelayChannelClosed
            | RuntimeError::ReplyChannelClosed(_)
            | RuntimeError::RemovalChannelClosed
            | RuntimeError::WorkerJoin(_)
            | RuntimeError::HookCascade { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RuntimeError::RelayChannelClosed => "RELAY_CLOSED",
            RuntimeError::ReplyChannelClosed(_) => "RELAY_REPLY_CLOSED",
            RuntimeError::RemovalChannelClosed => "REMOVAL_CLOSED",
            RuntimeError::MissingStore => "MISSING_STORE",
            RuntimeError::WorkerJoin(_) => "WORKER_JOIN",
            RuntimeError::Repository(error) => error.error_code(),
            RuntimeError::Flow(error) => error.error_code(),
            RuntimeError::Configuration(error) => error.error_code(),
            RuntimeError::InvalidState { .. } => "INVALID_STATE",
            RuntimeError::UnknownStep(_) => "UNKNOWN_STEP",
            RuntimeError::Step { .. } => "STEP_FAILED",
            RuntimeError::HookCascade { .. } => "HOOK_CASCADE",
        }
    }
}

impl DomainError for StepError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            StepError::Repository(error) => error.severity(),
            StepError::Missing(error) => error.severity(),
            StepError::Unauthorized(error) => error.severity(),
            StepError::Formula(_) | StepError::UnexpectedInput { .. } => ErrorSeverity::Validation,
            StepError::MissingOutput(_) | StepError::Failed(_) => ErrorSeverity::Internal,
            StepError::Runtime(error) => error.severity(),
        }
    }
}
