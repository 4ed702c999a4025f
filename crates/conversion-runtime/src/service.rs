//! The public entry point

use once_cell::sync::OnceCell;

use crate::error::Result;
use crate::options::ConversionOptions;
use crate::outcome::ConversionOutcome;
use crate::runtime::ConversionRuntime;

static SHARED: OnceCell<MarkdownService> = OnceCell::new();

/// One logical converter backed by a single [`ConversionRuntime`]
#[derive(Debug, Clone)]
pub struct MarkdownService {
    runtime: ConversionRuntime,
}

impl MarkdownService {
    pub fn new() -> Result<Self> {
        ConversionRuntime::new().map(Self::with_runtime)
    }

    pub fn with_runtime(runtime: ConversionRuntime) -> Self {
        Self { runtime }
    }

    /// Process-wide service, created on first use
    pub fn shared() -> Result<&'static MarkdownService> {
        SHARED.get_or_try_init(MarkdownService::new)
    }

    pub fn runtime(&self) -> &ConversionRuntime {
        &self.runtime
    }

    /// Convert with default options
    pub async fn convert(&self, html: &str) -> Result<String> {
        self.runtime.convert(html, &ConversionOptions::default()).await
    }

    pub async fn convert_with(&self, html: &str, options: &ConversionOptions) -> Result<String> {
        self.runtime.convert(html, options).await
    }

    pub async fn convert_outcome(&self, html: &str, options: &ConversionOptions) -> ConversionOutcome {
        self.runtime.convert(html, options).await.into()
    }

    /// Block the current thread until the conversion finishes.
    ///
    /// Must not be called from inside an async task.
    pub fn convert_blocking(&self, html: &str, options: &ConversionOptions) -> Result<String> {
        futures::executor::block_on(self.runtime.convert(html, options))
    }
}
