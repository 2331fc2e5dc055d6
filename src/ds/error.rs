//! Error taxonomy for helper resolution and example execution.
//!
//! Every failure here is local to one example: it is surfaced to the runner,
//! which marks that example failed and carries on with its siblings.

use thiserror::Error;

use crate::ds::scope::ScopeId;
use crate::helper::declaration::HelperId;
use crate::runner::context::ExamplePhase;

/// Boxed error type a definition block may fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type HelperResult<T> = Result<T, HelperError>;

#[derive(Debug, Error)]
pub enum HelperError {
    /// No scope in the chain declares the requested identifier.
    #[error("undefined helper `{id}`: no enclosing group declares it")]
    NoSuchHelper { id: HelperId },

    /// A definition block re-entered its own resolution before completing.
    #[error("circular evaluation of helper `{id}`: {}", join_cycle(.cycle))]
    CircularHelperEvaluation { id: HelperId, cycle: Vec<HelperId> },

    /// The definition block itself failed. Displayed exactly as the block's error.
    #[error(transparent)]
    DefinitionBlockFailure(BoxError),

    /// The helper's block already failed earlier in this example and is not re-run.
    #[error("helper `{id}` already failed earlier in this example")]
    PreviouslyFailed { id: HelperId },

    #[error("helper `{id}` does not hold a value of type `{expected}`")]
    TypeMismatch {
        id: HelperId,
        expected: &'static str,
    },

    /// `super_helper` found nothing further out than the current definition.
    #[error("helper `{id}` has no definition in an outer group")]
    NoOuterDefinition { id: HelperId },

    /// A definition block, hook or example body panicked.
    #[error("example panicked: {message}")]
    Panicked { message: String },

    /// The example body was requested after a pre-example action failed.
    #[error("cannot run the example body: a pre-example action failed")]
    EagerPhaseFailed,

    #[error("expectation not met: {message}")]
    ExpectationNotMet { message: String },

    /// The runner drove the example lifecycle out of order.
    #[error("cannot {operation} while the example is {phase}")]
    PhaseViolation {
        operation: &'static str,
        phase: ExamplePhase,
    },

    #[error("scope {0} does not belong to this suite")]
    UnknownScope(ScopeId),

    #[error("helper config error: {0}")]
    Config(String),
}

impl HelperError {
    /// Wrap an arbitrary error (or message) as a definition block failure.
    pub fn failure(err: impl Into<BoxError>) -> Self {
        HelperError::DefinitionBlockFailure(err.into())
    }

    pub fn expectation(message: impl Into<String>) -> Self {
        HelperError::ExpectationNotMet {
            message: message.into(),
        }
    }

    /// The helper this error is about, if any.
    pub fn helper_id(&self) -> Option<&HelperId> {
        match self {
            HelperError::NoSuchHelper { id }
            | HelperError::CircularHelperEvaluation { id, .. }
            | HelperError::PreviouslyFailed { id }
            | HelperError::TypeMismatch { id, .. }
            | HelperError::NoOuterDefinition { id } => Some(id),
            _ => None,
        }
    }
}

fn join_cycle(cycle: &[HelperId]) -> String {
    cycle
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
