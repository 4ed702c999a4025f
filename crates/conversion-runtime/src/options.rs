//! Conversion options and runtime configuration

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Which engine handles a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Engine {
    /// Browser-grade parsing, highest fidelity on malformed markup
    #[default]
    #[serde(rename = "dom", alias = "DomEngine")]
    DomEngine,
    /// Lightweight string rewriter for valid, simple markup
    #[serde(rename = "string", alias = "StringEngine")]
    StringEngine,
}

impl Engine {
    pub fn as_str(self) -> &'static str {
        match self {
            Engine::DomEngine => "dom",
            Engine::StringEngine => "string",
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeadingStyle {
    #[default]
    #[serde(rename = "atx", alias = "ATX")]
    Atx,
    #[serde(rename = "setext", alias = "Setext")]
    Setext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BulletMarker {
    #[default]
    #[serde(rename = "-")]
    Dash,
    #[serde(rename = "*")]
    Asterisk,
    #[serde(rename = "+")]
    Plus,
}

impl BulletMarker {
    pub fn as_char(self) -> char {
        match self {
            BulletMarker::Dash => '-',
            BulletMarker::Asterisk => '*',
            BulletMarker::Plus => '+',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BulletMarker::Dash => "-",
            BulletMarker::Asterisk => "*",
            BulletMarker::Plus => "+",
        }
    }
}

impl TryFrom<char> for BulletMarker {
    type Error = char;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '-' => Ok(BulletMarker::Dash),
            '*' => Ok(BulletMarker::Asterisk),
            '+' => Ok(BulletMarker::Plus),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CodeBlockStyle {
    #[default]
    #[serde(rename = "fenced", alias = "Fenced")]
    Fenced,
    #[serde(rename = "indented", alias = "Indented")]
    Indented,
}

/// What a caller wants from one conversion.
///
/// Fields an engine has no use for are accepted and ignored by that engine:
/// `heading_style` and `code_block_style` only affect the DOM engine,
/// `empty_tags` only the string engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionOptions {
    pub engine: Engine,
    pub heading_style: HeadingStyle,
    pub bullet_marker: BulletMarker,
    pub code_block_style: CodeBlockStyle,
    pub skip_tags: IndexSet<String>,
    pub ignore_tags: IndexSet<String>,
    pub empty_tags: IndexSet<String>,
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_heading_style(mut self, style: HeadingStyle) -> Self {
        self.heading_style = style;
        self
    }

    pub fn with_bullet_marker(mut self, marker: BulletMarker) -> Self {
        self.bullet_marker = marker;
        self
    }

    pub fn with_code_block_style(mut self, style: CodeBlockStyle) -> Self {
        self.code_block_style = style;
        self
    }

    pub fn skip_tag(mut self, tag: impl Into<String>) -> Self {
        self.skip_tags.insert(tag.into());
        self
    }

    pub fn ignore_tag(mut self, tag: impl Into<String>) -> Self {
        self.ignore_tags.insert(tag.into());
        self
    }

    pub fn empty_tag(mut self, tag: impl Into<String>) -> Self {
        self.empty_tags.insert(tag.into());
        self
    }
}

/// A library the runtime loads into an environment, and the global it defines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySpec {
    pub name: String,
    pub entry_point: String,
}

impl LibrarySpec {
    pub fn new(name: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_point: entry_point.into(),
        }
    }
}

/// Static configuration of a [`ConversionRuntime`](crate::ConversionRuntime)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    pub dom_library: LibrarySpec,
    pub string_library: LibrarySpec,
    /// Name of the thread the DOM environment is bound to
    pub dom_thread_name: String,
    /// Name of the serial queue owning the string environment
    pub string_queue_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dom_library: LibrarySpec::new("turndown", "TurndownService"),
            string_library: LibrarySpec::new("html-to-md", "html2md"),
            dom_thread_name: "markdown-dom".to_string(),
            string_queue_name: "markdown-string".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options = ConversionOptions::default();
        assert_eq!(options.engine, Engine::DomEngine);
        assert_eq!(options.heading_style, HeadingStyle::Atx);
        assert_eq!(options.bullet_marker, BulletMarker::Dash);
        assert_eq!(options.code_block_style, CodeBlockStyle::Fenced);
        assert!(options.skip_tags.is_empty());
        assert!(options.ignore_tags.is_empty());
        assert!(options.empty_tags.is_empty());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let options: ConversionOptions = serde_json::from_str(
            r#"{"engine":"string","bulletMarker":"*","skipTags":["div","span","div"]}"#,
        )
        .unwrap();
        assert_eq!(options.engine, Engine::StringEngine);
        assert_eq!(options.bullet_marker, BulletMarker::Asterisk);
        assert_eq!(options.heading_style, HeadingStyle::Atx);
        assert_eq!(
            options.skip_tags.iter().collect::<Vec<_>>(),
            vec!["div", "span"]
        );
    }

    #[test]
    fn test_builder() {
        let options = ConversionOptions::new()
            .with_engine(Engine::StringEngine)
            .with_bullet_marker(BulletMarker::Plus)
            .skip_tag("div")
            .ignore_tag("nav")
            .empty_tag("span");
        assert_eq!(options.bullet_marker.as_char(), '+');
        assert!(options.skip_tags.contains("div"));
        assert!(options.ignore_tags.contains("nav"));
        assert!(options.empty_tags.contains("span"));
    }

    #[test]
    fn test_bullet_marker_from_char() {
        assert_eq!(BulletMarker::try_from('*'), Ok(BulletMarker::Asterisk));
        assert_eq!(BulletMarker::try_from('x'), Err('x'));
    }

    #[test]
    fn test_runtime_config_defaults() {
        let config: RuntimeConfig = serde_json::from_str(r#"{"domThreadName":"dom"}"#).unwrap();
        assert_eq!(config.dom_thread_name, "dom");
        assert_eq!(config.dom_library.entry_point, "TurndownService");
        assert_eq!(config.string_library.name, "html-to-md");
    }
}
