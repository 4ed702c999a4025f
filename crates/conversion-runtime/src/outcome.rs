//! Outcome classification shared by both engines

use crate::error::{ConversionError, Result};
use crate::script::{ScriptException, ScriptValue};

/// Result of one conversion as a tagged union.
///
/// `EmptyResult` is not a failure: the input was processed and simply held
/// nothing renderable.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    Success(String),
    EmptyResult,
    Failure(ConversionError),
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Success(_))
    }

    pub fn markdown(&self) -> Option<&str> {
        match self {
            ConversionOutcome::Success(markdown) => Some(markdown),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<String> {
        self.into()
    }
}

impl From<Result<String>> for ConversionOutcome {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(markdown) => ConversionOutcome::Success(markdown),
            Err(ConversionError::EmptyResult) => ConversionOutcome::EmptyResult,
            Err(err) => ConversionOutcome::Failure(err),
        }
    }
}

impl From<ConversionOutcome> for Result<String> {
    fn from(outcome: ConversionOutcome) -> Self {
        match outcome {
            ConversionOutcome::Success(markdown) => Ok(markdown),
            ConversionOutcome::EmptyResult => Err(ConversionError::EmptyResult),
            ConversionOutcome::Failure(err) => Err(err),
        }
    }
}

/// How strictly a script result must be a string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResultShape {
    /// Only a string is a valid result
    StringOnly,
    /// Any defined, non-null scalar is stringified
    Stringifiable,
}

/// Turn the raw value an engine returned into an outcome.
///
/// An empty string is only an `EmptyResult` when the input had content;
/// empty input producing empty output is a success.
pub(crate) fn classify(
    html: &str,
    evaluated: std::result::Result<ScriptValue, ScriptException>,
    shape: ResultShape,
) -> ConversionOutcome {
    let value = match evaluated {
        Ok(value) => value,
        Err(exception) => {
            return ConversionOutcome::Failure(ConversionError::JsException {
                message: exception.message,
            })
        }
    };

    let markdown = match (value, shape) {
        (ScriptValue::String(markdown), _) => markdown,
        (ScriptValue::Number(n), ResultShape::Stringifiable) => ScriptValue::Number(n).to_js_string(),
        (ScriptValue::Bool(b), ResultShape::Stringifiable) => b.to_string(),
        (other, _) => {
            return ConversionOutcome::Failure(ConversionError::ConversionFailed {
                detail: format!("engine returned {}", other.type_of()),
            })
        }
    };

    if markdown.is_empty() && !html.trim().is_empty() {
        ConversionOutcome::EmptyResult
    } else {
        ConversionOutcome::Success(markdown)
    }
}
