//! Error types for halo-trace
//!
//! Transport failures from the backends never surface here: the controller
//! turns them into status messages. What remains are intake failures and
//! calls made from a stage that does not allow them.

use thiserror::Error;

use crate::models::Stage;
use crate::services::IntakeError;

/// Workflow controller error type
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Image could not be accepted
    #[error(transparent)]
    Intake(#[from] IntakeError),

    /// Operation not legal from the current stage
    #[error("Cannot {operation} while session is {stage}")]
    InvalidTransition {
        operation: &'static str,
        stage: Stage,
    },

    /// Extraction or resolution attempted before choosing a category
    #[error("No category selected")]
    CategoryNotSelected,
}

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;
