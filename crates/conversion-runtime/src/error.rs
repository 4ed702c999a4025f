//! Error types

use std::fmt;

use crate::queue::QueueError;

/// Where loading a library into an environment went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    /// Evaluating the library source threw
    Injection,
    /// The source ran but its entry point is not defined afterwards
    Verification,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStage::Injection => f.write_str("injection"),
            LoadStage::Verification => f.write_str("verification"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("execution environment could not be initialized: {detail}")]
    EnvironmentInitializationFailed { detail: String },

    #[error("library `{name}` not found")]
    LibraryNotFound { name: String },

    #[error("library `{name}` failed during {stage}: {detail}")]
    LibraryLoadingFailed {
        name: String,
        stage: LoadStage,
        detail: String,
    },

    #[error("invalid input: {detail}")]
    InvalidInput { detail: String },

    #[error("conversion failed: {detail}")]
    ConversionFailed { detail: String },

    #[error("script exception: {message}")]
    JsException { message: String },

    #[error("input contained no convertible content")]
    EmptyResult,
}

impl ConversionError {
    /// Input was processed but nothing renderable was found
    pub fn is_empty_result(&self) -> bool {
        matches!(self, ConversionError::EmptyResult)
    }

    /// True for everything except [`ConversionError::EmptyResult`]
    pub fn is_fatal(&self) -> bool {
        !self.is_empty_result()
    }

    /// Library lookup or loading problems, as opposed to conversion problems
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            ConversionError::EnvironmentInitializationFailed { .. }
                | ConversionError::LibraryNotFound { .. }
                | ConversionError::LibraryLoadingFailed { .. }
        )
    }
}

impl From<serde_json::Error> for ConversionError {
    fn from(err: serde_json::Error) -> Self {
        ConversionError::InvalidInput {
            detail: err.to_string(),
        }
    }
}

impl From<QueueError> for ConversionError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Panicked { message, .. } => ConversionError::JsException { message },
            other => ConversionError::EnvironmentInitializationFailed {
                detail: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;
