//! DOM engine adapter.
//!
//! The rendering context is affine to one thread: the adapter's serial queue
//! worker creates it, initializes it, runs every conversion in it and drops
//! it. Callers on any thread hand work to that worker and await the reply,
//! so concurrent calls are served one at a time in arrival order.
//!
//! Before each conversion the library entry point is probed. A failed probe
//! means the context was lost; the adapter rebuilds it once and gives up for
//! this call if that fails too.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::{load_library, probe_script, EngineAdapter, EnvironmentPhase};
use crate::error::{ConversionError, Result};
use crate::escape::escape_double_quoted;
use crate::library::LibrarySource;
use crate::options::{CodeBlockStyle, ConversionOptions, Engine, HeadingStyle, LibrarySpec};
use crate::outcome::{classify, ResultShape};
use crate::queue::SerialQueue;
use crate::script::{ContextFactory, ScriptContext, ScriptValue};

/// Inline tags kept as raw HTML because Markdown has no syntax for them
const KEPT_INLINE_TAGS: [&str; 4] = ["del", "ins", "sup", "sub"];

/// Tags whose content never belongs in Markdown
const REMOVED_TAGS: [&str; 2] = ["script", "style"];

const SERVICE_VARIABLE: &str = "turndownService";

/// Configuration object handed to the rewriter constructor
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DomEngineConfig {
    heading_style: &'static str,
    hr: &'static str,
    bullet_list_marker: &'static str,
    code_block_style: &'static str,
    fence: &'static str,
    em_delimiter: &'static str,
    strong_delimiter: &'static str,
    link_style: &'static str,
    link_reference_style: &'static str,
}

impl DomEngineConfig {
    fn from_options(options: &ConversionOptions) -> Self {
        Self {
            heading_style: match options.heading_style {
                HeadingStyle::Atx => "atx",
                HeadingStyle::Setext => "setext",
            },
            hr: "---",
            bullet_list_marker: options.bullet_marker.as_str(),
            code_block_style: match options.code_block_style {
                CodeBlockStyle::Fenced => "fenced",
                CodeBlockStyle::Indented => "indented",
            },
            fence: "```",
            em_delimiter: "*",
            strong_delimiter: "**",
            link_style: "inlined",
            link_reference_style: "full",
        }
    }
}

/// Build the script that configures a rewriter and converts `html`
pub(crate) fn dom_command(
    entry_point: &str,
    options: &ConversionOptions,
    html: &str,
) -> Result<String> {
    let config = serde_json::to_string(&DomEngineConfig::from_options(options))?;
    let svc = SERVICE_VARIABLE;

    let mut command = format!("var {svc} = new {entry_point}({config});\n");
    command.push_str(&format!(
        "{svc}.keep({});\n",
        serde_json::to_string(&KEPT_INLINE_TAGS)?
    ));
    command.push_str(&format!(
        "{svc}.remove({});\n",
        serde_json::to_string(&REMOVED_TAGS)?
    ));
    for tag in &options.skip_tags {
        command.push_str(&format!("{svc}.keep(\"{}\");\n", escape_double_quoted(tag)));
    }
    if !options.ignore_tags.is_empty() {
        command.push_str(&format!(
            "{svc}.remove({});\n",
            serde_json::to_string(&options.ignore_tags)?
        ));
    }
    command.push_str(&format!("{svc}.turndown(\"{}\");", escape_double_quoted(html)));
    Ok(command)
}

/// State owned by the affine thread
struct DomEnvironment<F: ContextFactory> {
    factory: F,
    libraries: Arc<dyn LibrarySource>,
    library: LibrarySpec,
    context: Option<F::Context>,
    phase: EnvironmentPhase,
}

impl<F: ContextFactory> DomEnvironment<F> {
    fn build_context(&self) -> Result<F::Context> {
        let mut context = self.factory.create_context().map_err(|exception| {
            ConversionError::EnvironmentInitializationFailed {
                detail: exception.message,
            }
        })?;
        context.load_blank_document().map_err(|exception| {
            ConversionError::EnvironmentInitializationFailed {
                detail: format!("loading blank document: {}", exception.message),
            }
        })?;
        load_library(&mut context, self.libraries.as_ref(), &self.library)?;
        Ok(context)
    }

    fn initialize(&mut self, phase: EnvironmentPhase) -> Result<()> {
        self.phase = phase;
        self.context = None;
        info!(library = %self.library.name, ?phase, "initializing DOM environment");

        match self.build_context() {
            Ok(context) => {
                self.context = Some(context);
                self.phase = EnvironmentPhase::Ready;
                info!(library = %self.library.name, "DOM environment ready");
                Ok(())
            }
            Err(err) => {
                self.phase = match phase {
                    EnvironmentPhase::Initializing => EnvironmentPhase::Uninitialized,
                    _ => EnvironmentPhase::Degraded,
                };
                warn!(library = %self.library.name, error = %err, "DOM environment initialization failed");
                Err(err)
            }
        }
    }

    fn probe(&mut self) -> bool {
        let script = probe_script(&self.library.entry_point);
        match self.context.as_mut().map(|context| context.evaluate(&script)) {
            Some(Ok(ScriptValue::Bool(true))) => true,
            Some(Ok(value)) => {
                warn!(result = value.type_of(), "DOM environment probe failed");
                false
            }
            Some(Err(exception)) => {
                warn!(error = %exception, "DOM environment probe threw");
                false
            }
            None => false,
        }
    }

    /// Bring the environment to `Ready`, rebuilding it once if it was lost
    fn ensure_ready(&mut self) -> Result<&mut F::Context> {
        match self.phase {
            EnvironmentPhase::Disposed => {
                return Err(ConversionError::EnvironmentInitializationFailed {
                    detail: "environment has been disposed".to_string(),
                })
            }
            EnvironmentPhase::Ready => {
                if !self.probe() {
                    self.phase = EnvironmentPhase::Degraded;
                    self.initialize(EnvironmentPhase::Reinitializing)
                        .map_err(|err| ConversionError::EnvironmentInitializationFailed {
                            detail: format!("reinitialization after environment loss failed: {err}"),
                        })?;
                }
            }
            EnvironmentPhase::Degraded => self.initialize(EnvironmentPhase::Reinitializing)?,
            _ => self.initialize(EnvironmentPhase::Initializing)?,
        }

        self.context
            .as_mut()
            .ok_or_else(|| ConversionError::EnvironmentInitializationFailed {
                detail: "environment is not ready".to_string(),
            })
    }

    fn convert(&mut self, html: &str, command: &str) -> Result<String> {
        let context = self.ensure_ready()?;
        classify(html, context.evaluate(command), ResultShape::StringOnly).into_result()
    }

    fn dispose(&mut self) {
        self.context = None;
        if self.phase != EnvironmentPhase::Disposed {
            self.phase = EnvironmentPhase::Disposed;
            info!(library = %self.library.name, "DOM environment disposed");
        }
    }
}

/// Adapter for the DOM-based rewriter
pub struct DomAdapter<F: ContextFactory> {
    queue: SerialQueue<DomEnvironment<F>>,
    entry_point: String,
}

impl<F: ContextFactory> DomAdapter<F> {
    /// Spawn the affine thread. The environment itself is created lazily on
    /// the first conversion.
    pub fn new(
        factory: F,
        libraries: Arc<dyn LibrarySource>,
        library: LibrarySpec,
        thread_name: impl Into<String>,
    ) -> Result<Self> {
        let entry_point = library.entry_point.clone();
        let queue = SerialQueue::spawn(thread_name, move || DomEnvironment {
            factory,
            libraries,
            library,
            context: None,
            phase: EnvironmentPhase::Uninitialized,
        })?;
        Ok(Self { queue, entry_point })
    }
}

impl<F: ContextFactory> std::fmt::Debug for DomAdapter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomAdapter")
            .field("queue", &self.queue)
            .field("entry_point", &self.entry_point)
            .finish()
    }
}

#[async_trait]
impl<F: ContextFactory> EngineAdapter for DomAdapter<F> {
    fn engine(&self) -> Engine {
        Engine::DomEngine
    }

    async fn convert(&self, html: &str, options: &ConversionOptions) -> Result<String> {
        let command = dom_command(&self.entry_point, options, html)?;
        let html = html.to_string();
        self.queue
            .run(move |environment| environment.convert(&html, &command))
            .await?
    }

    async fn phase(&self) -> EnvironmentPhase {
        self.queue
            .run(|environment| environment.phase)
            .await
            .unwrap_or(EnvironmentPhase::Disposed)
    }

    async fn dispose(&self) {
        // A closed queue has nothing left to dispose
        let _ = self.queue.run(|environment| environment.dispose()).await;
    }
}
