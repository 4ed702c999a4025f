//! Script execution environments.
//!
//! Engines run inside a context that evaluates script source and returns the
//! completion value of the last statement. Contexts are created by a
//! [`ContextFactory`] on the thread that will use them and never leave it.
//!
//! [`native::NativeHost`] is the in-process factory, an embedded JavaScript
//! engine with the Rust rewriters registered as native modules.

pub mod native;

/// A value returned from a script context
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Any object, array or function. Only its callability survives the
    /// trip out of the context.
    Object { callable: bool },
}

impl ScriptValue {
    /// The `typeof` of this value
    pub fn type_of(&self) -> &'static str {
        match self {
            ScriptValue::Undefined => "undefined",
            ScriptValue::Null => "object",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Object { callable: true } => "function",
            ScriptValue::Object { callable: false } => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            ScriptValue::Undefined | ScriptValue::Null => false,
            ScriptValue::Bool(b) => *b,
            ScriptValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ScriptValue::String(s) => !s.is_empty(),
            ScriptValue::Object { .. } => true,
        }
    }

    /// String conversion as `String(value)` would perform it
    pub fn to_js_string(&self) -> String {
        match self {
            ScriptValue::Undefined => "undefined".to_string(),
            ScriptValue::Null => "null".to_string(),
            ScriptValue::Bool(b) => b.to_string(),
            ScriptValue::Number(n) => number_to_string(*n),
            ScriptValue::String(s) => s.clone(),
            ScriptValue::Object { callable: true } => "function () { [native code] }".to_string(),
            ScriptValue::Object { callable: false } => "[object Object]".to_string(),
        }
    }
}

pub(crate) fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// An exception thrown inside a script context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ScriptException {
    pub message: String,
}

impl ScriptException {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A live interpreter or rendering context
pub trait ScriptContext {
    /// Evaluate `source` and return the completion value of its last statement
    fn evaluate(&mut self, source: &str) -> Result<ScriptValue, ScriptException>;

    /// Load an empty document so DOM-dependent libraries can run
    fn load_blank_document(&mut self) -> Result<(), ScriptException>;
}

/// Creates contexts. Moved onto the thread that owns the contexts it creates.
pub trait ContextFactory: Send + 'static {
    type Context: ScriptContext + 'static;

    fn create_context(&self) -> Result<Self::Context, ScriptException>;
}
