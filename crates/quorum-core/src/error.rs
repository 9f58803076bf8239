use quorum_db::StoreError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Structured detail attached to a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorContext {
    pub field: String,
    pub message: String,
}

impl ErrorContext {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.message)
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(ErrorContext),
    #[error("poll {id} not found")]
    NotFound { id: String },
    #[error("poll {id} is closed and no longer accepts votes")]
    ClosedPoll { id: String },
    #[error("option {number} does not exist, choose a number from 1 to {available}")]
    InvalidOption { number: i64, available: usize },
    #[error("only the creator of the poll can do that")]
    Forbidden,
    #[error("poll {id} is already closed")]
    AlreadyClosed { id: String },
    #[error("poll {id} is busy, gave up after {attempts} write attempts")]
    ConcurrencyExhausted { id: String, attempts: u32 },
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl CoreError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation(ErrorContext::new(field, message))
    }

    /// Failures of the machinery rather than of the request. These are logged
    /// and answered with a generic "try again".
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            CoreError::ConcurrencyExhausted { .. } | CoreError::Storage(_)
        )
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            CoreError::Validation(ctx) => Some(ctx),
            _ => None,
        }
    }
}
