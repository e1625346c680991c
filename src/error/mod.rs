//! Normalized error taxonomy
//!
//! Every failure leaving a pipeline is expressed as a [`ServerError`] carrying
//! one of the closed set of [`ErrorCode`]s. The [`Classifier`] is the single
//! place where raw failures are mapped onto it.

pub mod classifier;
pub mod rules;

pub use classifier::{Classifier, ErrorRule};
pub use rules::{ConstraintDetail, DetailConstraintRule, UNIQUE_SUFFIXES};

#[cfg(feature = "sqlite")]
pub use rules::SqliteUniqueRule;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of error kinds a pipeline can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input did not satisfy the schema, or a required header was missing
    ValidationFailed,
    /// A uniqueness constraint rejected the write
    AlreadyExists,
    /// Anything that could not be classified more precisely
    InternalServerError,
}

impl ErrorCode {
    /// Wire name of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    /// HTTP status an HTTP-facing caller should answer with
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::AlreadyExists => StatusCode::CONFLICT,
            ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized error: message, code and the offending field path if known
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ServerError {
    pub message: String,
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<Vec<String>>,
}

impl ServerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            at: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn already_exists(message: impl Into<String>, at: Vec<String>) -> Self {
        Self::new(ErrorCode::AlreadyExists, message).with_at(at)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalServerError, message)
    }

    /// Attach the offending field path
    pub fn with_at(mut self, at: Vec<String>) -> Self {
        self.at = Some(at);
        self
    }
}
