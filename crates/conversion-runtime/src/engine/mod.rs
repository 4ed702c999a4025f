//! Engine adapters: one per backend, each owning its execution environment.

mod dom;
mod string;

pub use dom::DomAdapter;
pub use string::StringAdapter;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ConversionError, LoadStage, Result};
use crate::library::LibrarySource;
use crate::options::{ConversionOptions, Engine, LibrarySpec};
use crate::script::{ScriptContext, ScriptValue};

/// Lifecycle of an adapter's execution environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentPhase {
    Uninitialized,
    Initializing,
    Ready,
    Reinitializing,
    /// The environment was lost or failed to come back; the next call retries
    Degraded,
    Disposed,
}

#[async_trait]
pub trait EngineAdapter: Send + Sync {
    fn engine(&self) -> Engine;

    async fn convert(&self, html: &str, options: &ConversionOptions) -> Result<String>;

    /// Current environment phase, read on the thread that owns it
    async fn phase(&self) -> EnvironmentPhase;

    /// Release the environment. Later conversions fail.
    async fn dispose(&self);
}

/// Script that evaluates to `true` while `entry_point` is usable
pub(crate) fn probe_script(entry_point: &str) -> String {
    format!("typeof {entry_point} === \"function\"")
}

/// Inject a library into `context` and verify its entry point
pub(crate) fn load_library<C: ScriptContext>(
    context: &mut C,
    libraries: &dyn LibrarySource,
    library: &LibrarySpec,
) -> Result<()> {
    let source = libraries
        .load_library_source(&library.name)
        .ok_or_else(|| ConversionError::LibraryNotFound {
            name: library.name.clone(),
        })?;
    debug!(library = %library.name, bytes = source.len(), "injecting library");

    context
        .evaluate(&source)
        .map_err(|exception| ConversionError::LibraryLoadingFailed {
            name: library.name.clone(),
            stage: LoadStage::Injection,
            detail: exception.message,
        })?;

    match context.evaluate(&probe_script(&library.entry_point)) {
        Ok(ScriptValue::Bool(true)) => Ok(()),
        Ok(_) => Err(ConversionError::LibraryLoadingFailed {
            name: library.name.clone(),
            stage: LoadStage::Verification,
            detail: format!("{} is not defined after injection", library.entry_point),
        }),
        Err(exception) => Err(ConversionError::LibraryLoadingFailed {
            name: library.name.clone(),
            stage: LoadStage::Verification,
            detail: exception.message,
        }),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedHost;
    use super::*;
    use crate::library::NativeLibraries;
    use crate::script::native::NativeHost;
    use crate::script::{ContextFactory, ScriptException};

    fn turndown() -> LibrarySpec {
        LibrarySpec::new("turndown", "TurndownService")
    }

    #[test]
    fn test_load_native_library() {
        let mut context = NativeHost::new().create_context().unwrap();
        load_library(&mut context, &NativeLibraries, &turndown()).unwrap();
        assert_eq!(
            context.evaluate(&probe_script("TurndownService")).unwrap(),
            ScriptValue::Bool(true)
        );
    }

    #[test]
    fn test_missing_library() {
        let mut context = NativeHost::new().create_context().unwrap();
        let err = load_library(
            &mut context,
            &NativeLibraries,
            &LibrarySpec::new("left-pad", "leftPad"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConversionError::LibraryNotFound {
                name: "left-pad".into()
            }
        );
    }

    #[test]
    fn test_injection_failure() {
        let mut context = NativeHost::new().create_context().unwrap();
        let broken = |_: &str| Some("this is not ( valid".to_string());
        let err = load_library(&mut context, &broken, &turndown()).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::LibraryLoadingFailed {
                stage: LoadStage::Injection,
                ..
            }
        ));
    }

    #[test]
    fn test_verification_failure() {
        let mut context = NativeHost::new().create_context().unwrap();
        let wrong_global = |_: &str| Some("globalThis.Other = 1;".to_string());
        let err = load_library(&mut context, &wrong_global, &turndown()).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::LibraryLoadingFailed {
                stage: LoadStage::Verification,
                ..
            }
        ));
    }

    #[test]
    fn test_verification_exception() {
        let host = ScriptedHost::default();
        host.push(Ok(ScriptValue::Undefined));
        host.push(Err(ScriptException::new("Error: probe crashed")));
        let mut context = host.create_context().unwrap();
        let err = load_library(&mut context, &NativeLibraries, &turndown()).unwrap_err();
        assert_eq!(
            err,
            ConversionError::LibraryLoadingFailed {
                name: "turndown".into(),
                stage: LoadStage::Verification,
                detail: "Error: probe crashed".into(),
            }
        );
    }
}
