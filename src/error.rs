//! Engine error type.
//!
//! Validation failures and store failures are separate variants so the CLI
//! can report them distinctly; notification and analysis-provider failures
//! are degraded paths handled at their call sites and never reach here as
//! fatal errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("task {0} not found")]
    TaskNotFound(u64),

    #[error("member {0} not found")]
    MemberNotFound(u64),

    #[error("invalid transition for task {id}: {reason}")]
    InvalidTransition { id: u64, reason: String },

    #[error("prerequisite cycle through task {0}")]
    CycleDetected(u64),

    #[error("{0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("analysis provider: {0}")]
    Provider(String),
}
