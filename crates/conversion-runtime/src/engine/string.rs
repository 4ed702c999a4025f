//! String engine adapter.
//!
//! The interpreter context lives in the state of a dedicated serial queue.
//! Initialization is a check-then-act on that state, performed inside the
//! queue, so two callers can never race to build it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::{load_library, EngineAdapter, EnvironmentPhase};
use crate::error::{ConversionError, Result};
use crate::escape::escape_template_literal;
use crate::library::LibrarySource;
use crate::options::{BulletMarker, ConversionOptions, Engine, LibrarySpec};
use crate::outcome::{classify, ResultShape};
use crate::queue::SerialQueue;
use crate::script::{ContextFactory, ScriptContext};

/// The options the string engine understands
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StringEngineConfig<'a> {
    skip_tags: Vec<&'a str>,
    ignore_tags: Vec<&'a str>,
    empty_tags: Vec<&'a str>,
    /// Left out when it matches the library default
    #[serde(skip_serializing_if = "Option::is_none")]
    bullet_marker: Option<&'static str>,
}

impl<'a> StringEngineConfig<'a> {
    fn from_options(options: &'a ConversionOptions) -> Self {
        Self {
            skip_tags: options.skip_tags.iter().map(String::as_str).collect(),
            ignore_tags: options.ignore_tags.iter().map(String::as_str).collect(),
            empty_tags: options.empty_tags.iter().map(String::as_str).collect(),
            bullet_marker: (options.bullet_marker != BulletMarker::default())
                .then(|| options.bullet_marker.as_str()),
        }
    }
}

pub(crate) fn string_command(
    entry_point: &str,
    options: &ConversionOptions,
    html: &str,
) -> Result<String> {
    let config = serde_json::to_string(&StringEngineConfig::from_options(options))?;
    Ok(format!(
        "{entry_point}(`{}`, {config})",
        escape_template_literal(html)
    ))
}

struct StringEnvironment<F: ContextFactory> {
    factory: F,
    libraries: Arc<dyn LibrarySource>,
    library: LibrarySpec,
    /// `Some` once the library is loaded and verified
    context: Option<F::Context>,
    disposed: bool,
}

impl<F: ContextFactory> StringEnvironment<F> {
    fn ensure_initialized(&mut self) -> Result<&mut F::Context> {
        if self.disposed {
            return Err(ConversionError::EnvironmentInitializationFailed {
                detail: "environment has been disposed".to_string(),
            });
        }

        if self.context.is_none() {
            info!(library = %self.library.name, "initializing string environment");
            let mut context = self.factory.create_context().map_err(|exception| {
                ConversionError::EnvironmentInitializationFailed {
                    detail: exception.message,
                }
            })?;
            if let Err(err) = load_library(&mut context, self.libraries.as_ref(), &self.library) {
                warn!(library = %self.library.name, error = %err, "string environment initialization failed");
                return Err(err);
            }
            self.context = Some(context);
            info!(library = %self.library.name, "string environment ready");
        }

        self.context
            .as_mut()
            .ok_or_else(|| ConversionError::EnvironmentInitializationFailed {
                detail: "environment is not ready".to_string(),
            })
    }

    fn convert(&mut self, html: &str, command: &str) -> Result<String> {
        let context = self.ensure_initialized()?;
        classify(html, context.evaluate(command), ResultShape::Stringifiable).into_result()
    }

    fn phase(&self) -> EnvironmentPhase {
        match (self.disposed, self.context.is_some()) {
            (true, _) => EnvironmentPhase::Disposed,
            (false, true) => EnvironmentPhase::Ready,
            (false, false) => EnvironmentPhase::Uninitialized,
        }
    }
}

/// Adapter for the lightweight string rewriter
pub struct StringAdapter<F: ContextFactory> {
    queue: SerialQueue<StringEnvironment<F>>,
    entry_point: String,
}

impl<F: ContextFactory> StringAdapter<F> {
    pub fn new(
        factory: F,
        libraries: Arc<dyn LibrarySource>,
        library: LibrarySpec,
        queue_name: impl Into<String>,
    ) -> Result<Self> {
        let entry_point = library.entry_point.clone();
        let queue = SerialQueue::spawn(queue_name, move || StringEnvironment {
            factory,
            libraries,
            library,
            context: None,
            disposed: false,
        })?;
        Ok(Self { queue, entry_point })
    }
}

impl<F: ContextFactory> std::fmt::Debug for StringAdapter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringAdapter")
            .field("queue", &self.queue)
            .field("entry_point", &self.entry_point)
            .finish()
    }
}

#[async_trait]
impl<F: ContextFactory> EngineAdapter for StringAdapter<F> {
    fn engine(&self) -> Engine {
        Engine::StringEngine
    }

    async fn convert(&self, html: &str, options: &ConversionOptions) -> Result<String> {
        let command = string_command(&self.entry_point, options, html)?;
        let html = html.to_string();
        self.queue
            .run(move |environment| environment.convert(&html, &command))
            .await?
    }

    async fn phase(&self) -> EnvironmentPhase {
        self.queue
            .run(|environment| environment.phase())
            .await
            .unwrap_or(EnvironmentPhase::Disposed)
    }

    async fn dispose(&self) {
        let _ = self
            .queue
            .run(|environment| {
                environment.context = None;
                environment.disposed = true;
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::ScriptedHost;
    use crate::error::LoadStage;
    use crate::library::NativeLibraries;
    use crate::options::HeadingStyle;
    use crate::script::native::NativeHost;
    use crate::script::ScriptValue;
    use pretty_assertions::assert_eq;

    fn html_to_md() -> LibrarySpec {
        LibrarySpec::new("html-to-md", "html2md")
    }

    fn native_adapter() -> StringAdapter<NativeHost> {
        StringAdapter::new(
            NativeHost::new(),
            Arc::new(NativeLibraries),
            html_to_md(),
            "string-test",
        )
        .unwrap()
    }

    fn string_options() -> ConversionOptions {
        ConversionOptions::new().with_engine(Engine::StringEngine)
    }

    #[test]
    fn test_command_omits_default_bullet_marker() {
        let command = string_command("html2md", &string_options(), "<p>a</p>").unwrap();
        assert_eq!(
            command,
            r#"html2md(`<p>a</p>`, {"skipTags":[],"ignoreTags":[],"emptyTags":[]})"#
        );
    }

    #[test]
    fn test_command_with_tags_and_marker() {
        let options = string_options()
            .with_bullet_marker(BulletMarker::Asterisk)
            .skip_tag("div")
            .ignore_tag("nav")
            .empty_tag("span");
        let command = string_command("html2md", &options, "<code>`${x}`\\</code>").unwrap();
        assert_eq!(
            command,
            r#"html2md(`<code>\`\${x}\`\\</code>`, {"skipTags":["div"],"ignoreTags":["nav"],"emptyTags":["span"],"bulletMarker":"*"})"#
        );
    }

    #[tokio::test]
    async fn test_convert_list_with_marker() {
        let adapter = native_adapter();
        let options = string_options().with_bullet_marker(BulletMarker::Asterisk);
        assert_eq!(
            adapter
                .convert("<ul><li>Item 1</li><li>Item 2</li></ul>", &options)
                .await
                .unwrap(),
            "* Item 1\n* Item 2"
        );
    }

    #[tokio::test]
    async fn test_dom_only_options_are_ignored() {
        let adapter = native_adapter();
        let options = string_options().with_heading_style(HeadingStyle::Setext);
        assert_eq!(
            adapter.convert("<h2>Title</h2>", &options).await.unwrap(),
            "## Title"
        );
    }

    #[tokio::test]
    async fn test_template_characters_survive() {
        let adapter = native_adapter();
        let markdown = adapter
            .convert("<p>costs $5 `now` ${x}</p>", &string_options())
            .await
            .unwrap();
        assert_eq!(markdown, "costs $5 \\`now\\` ${x}");
    }

    #[tokio::test]
    async fn test_initializes_once() {
        let adapter = native_adapter();
        assert_eq!(adapter.phase().await, EnvironmentPhase::Uninitialized);
        let options = string_options();
        let results = futures::future::join_all(
            (0..8).map(|i| {
                let options = options.clone();
                let adapter = &adapter;
                async move { adapter.convert(&format!("<p>n{i}</p>"), &options).await }
            }),
        )
        .await;
        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap(), format!("n{i}"));
        }
        assert_eq!(adapter.phase().await, EnvironmentPhase::Ready);
    }

    #[tokio::test]
    async fn test_empty_result() {
        let adapter = native_adapter();
        let err = adapter
            .convert("<script>track()</script>", &string_options())
            .await
            .unwrap_err();
        assert!(err.is_empty_result());
        assert_eq!(adapter.convert("  ", &string_options()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_library_errors() {
        let missing = StringAdapter::new(
            NativeHost::new(),
            Arc::new(NativeLibraries),
            LibrarySpec::new("nope", "nope"),
            "string-missing",
        )
        .unwrap();
        assert_eq!(
            missing.convert("<p>x</p>", &string_options()).await.unwrap_err(),
            ConversionError::LibraryNotFound { name: "nope".into() }
        );

        let throwing = StringAdapter::new(
            NativeHost::new(),
            Arc::new(|_: &str| Some("undefinedFn();".to_string())),
            html_to_md(),
            "string-throwing",
        )
        .unwrap();
        assert!(matches!(
            throwing.convert("<p>x</p>", &string_options()).await.unwrap_err(),
            ConversionError::LibraryLoadingFailed {
                stage: LoadStage::Injection,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_stringifiable_results() {
        let host = ScriptedHost::default();
        let adapter =
            StringAdapter::new(host.clone(), Arc::new(NativeLibraries), html_to_md(), "string-scalar")
                .unwrap();
        host.push(Ok(ScriptValue::Undefined));
        host.push(Ok(ScriptValue::Bool(true)));
        host.push(Ok(ScriptValue::Number(42.0)));
        host.push(Ok(ScriptValue::Null));
        let options = string_options();
        assert_eq!(adapter.convert("<p>42</p>", &options).await.unwrap(), "42");
        assert!(matches!(
            adapter.convert("<p>x</p>", &options).await.unwrap_err(),
            ConversionError::ConversionFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_dispose() {
        let adapter = native_adapter();
        adapter.convert("<p>x</p>", &string_options()).await.unwrap();
        adapter.dispose().await;
        assert_eq!(adapter.phase().await, EnvironmentPhase::Disposed);
        assert!(adapter.convert("<p>x</p>", &string_options()).await.is_err());
    }
}
