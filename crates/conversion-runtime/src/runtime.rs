//! Routes each request to the adapter for its engine

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::engine::{DomAdapter, EngineAdapter, EnvironmentPhase, StringAdapter};
use crate::error::Result;
use crate::library::{LibrarySource, NativeLibraries};
use crate::options::{ConversionOptions, Engine, RuntimeConfig};
use crate::script::native::NativeHost;
use crate::script::ContextFactory;

/// Holds exactly one adapter per engine so their environments are reused
#[derive(Clone)]
pub struct ConversionRuntime {
    dom: Arc<dyn EngineAdapter>,
    string: Arc<dyn EngineAdapter>,
}

impl ConversionRuntime {
    /// Native host with the bundled libraries and default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(RuntimeConfig::default(), Arc::new(NativeLibraries))
    }

    pub fn with_config(config: RuntimeConfig, libraries: Arc<dyn LibrarySource>) -> Result<Self> {
        Self::with_host(NativeHost::new(), config, libraries)
    }

    /// Build both adapters on contexts from `host`
    pub fn with_host<F>(host: F, config: RuntimeConfig, libraries: Arc<dyn LibrarySource>) -> Result<Self>
    where
        F: ContextFactory + Clone,
    {
        let dom = DomAdapter::new(
            host.clone(),
            Arc::clone(&libraries),
            config.dom_library,
            config.dom_thread_name,
        )?;
        let string = StringAdapter::new(
            host,
            libraries,
            config.string_library,
            config.string_queue_name,
        )?;
        Ok(Self::from_adapters(Arc::new(dom), Arc::new(string)))
    }

    pub fn from_adapters(dom: Arc<dyn EngineAdapter>, string: Arc<dyn EngineAdapter>) -> Self {
        Self { dom, string }
    }

    pub fn adapter(&self, engine: Engine) -> &Arc<dyn EngineAdapter> {
        match engine {
            Engine::DomEngine => &self.dom,
            Engine::StringEngine => &self.string,
        }
    }

    pub async fn convert(&self, html: &str, options: &ConversionOptions) -> Result<String> {
        let started = Instant::now();
        let result = self.adapter(options.engine).convert(html, options).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(err) if err.is_empty_result() => "empty",
            Err(_) => "failure",
        };
        debug!(
            engine = %options.engine,
            input_bytes = html.len(),
            output_bytes = result.as_ref().map_or(0, String::len),
            elapsed_us = started.elapsed().as_micros() as u64,
            outcome,
            "conversion finished"
        );

        result
    }

    pub async fn phase(&self, engine: Engine) -> EnvironmentPhase {
        self.adapter(engine).phase().await
    }

    /// Release both environments
    pub async fn dispose(&self) {
        self.dom.dispose().await;
        self.string.dispose().await;
    }
}

impl std::fmt::Debug for ConversionRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionRuntime")
            .field("dom", &self.dom.engine())
            .field("string", &self.string.engine())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records calls and echoes the engine name
    struct Echo {
        engine: Engine,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EngineAdapter for Echo {
        fn engine(&self) -> Engine {
            self.engine
        }

        async fn convert(&self, html: &str, _options: &ConversionOptions) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if html.is_empty() {
                return Err(ConversionError::EmptyResult);
            }
            Ok(format!("{}:{html}", self.engine))
        }

        async fn phase(&self) -> EnvironmentPhase {
            EnvironmentPhase::Ready
        }

        async fn dispose(&self) {}
    }

    fn echo(engine: Engine) -> Arc<Echo> {
        Arc::new(Echo {
            engine,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_routes_by_engine() {
        let dom = echo(Engine::DomEngine);
        let string = echo(Engine::StringEngine);
        let runtime = ConversionRuntime::from_adapters(dom.clone(), string.clone());

        let options = ConversionOptions::default();
        assert_eq!(runtime.convert("a", &options).await.unwrap(), "dom:a");
        let options = options.with_engine(Engine::StringEngine);
        assert_eq!(runtime.convert("b", &options).await.unwrap(), "string:b");
        assert_eq!(runtime.convert("c", &options).await.unwrap(), "string:c");

        assert_eq!(dom.calls.load(Ordering::SeqCst), 1);
        assert_eq!(string.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_pass_through_unchanged() {
        let runtime =
            ConversionRuntime::from_adapters(echo(Engine::DomEngine), echo(Engine::StringEngine));
        let err = runtime
            .convert("", &ConversionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, ConversionError::EmptyResult);
    }

    #[tokio::test]
    async fn test_native_runtime() {
        let runtime = ConversionRuntime::new().unwrap();
        assert_eq!(runtime.phase(Engine::DomEngine).await, EnvironmentPhase::Uninitialized);
        let markdown = runtime
            .convert("<p><em>hi</em></p>", &ConversionOptions::default())
            .await
            .unwrap();
        assert_eq!(markdown, "*hi*");
        assert_eq!(runtime.phase(Engine::DomEngine).await, EnvironmentPhase::Ready);
        assert_eq!(runtime.phase(Engine::StringEngine).await, EnvironmentPhase::Uninitialized);

        runtime.dispose().await;
        assert_eq!(runtime.phase(Engine::DomEngine).await, EnvironmentPhase::Disposed);
    }
}
