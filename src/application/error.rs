//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{DomainError, NodeId};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("node document already exists: {0}")]
    DocumentExists(PathBuf),

    #[error("node document not found: {0}")]
    DocumentMissing(PathBuf),

    #[error("a drag of {0} is already in progress")]
    DragInProgress(NodeId),

    #[error("no drag in progress")]
    NoActiveDrag,

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
