use std::io;

use thiserror::Error;

use crate::stage::Category;

/// Errors raised while building or evaluating a stage chain.
#[derive(Error, Debug)]
pub enum QueryError {
    /// No stage constructor is registered under this category and name
    #[error("Unknown {category} stage: '{name}'")]
    UnresolvedStageType { category: Category, name: String },

    /// The resolved stage has no implementation for the requested operation
    #[error("Stage {stage} does not support operation '{operation}'")]
    UnsupportedOperation { stage: String, operation: String },

    /// A stage rejected one of its options at construction
    #[error("Invalid option '{key}' for stage {stage}: {reason}")]
    InvalidOption {
        stage: String,
        key: String,
        reason: String,
    },

    /// An operation was called with arguments it cannot use
    #[error("Invalid argument for '{operation}': {reason}")]
    InvalidArgument { operation: String, reason: String },

    /// The entry source produced something other than a list of objects
    #[error("Invalid entries: {0}")]
    InvalidEntries(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueryError {
    pub(crate) fn invalid_option(
        stage: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        QueryError::InvalidOption {
            stage: stage.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_argument(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidArgument {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}
