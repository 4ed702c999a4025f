//! TurndownService - the main entry point for HTML to Markdown conversion.

use markdown_ast::{serialize, MarkdownStyle};

use crate::convert::Converter;
use crate::html::parse_html;
use crate::node::Node;
use crate::rules::TagRules;
use crate::utilities::escape_markdown;

/// Converts HTML to Markdown through a parsed document tree
#[derive(Debug, Clone, Default)]
pub struct TurndownService {
    style: MarkdownStyle,
    rules: TagRules,
}

impl TurndownService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(style: MarkdownStyle) -> Self {
        Self {
            style,
            rules: TagRules::new(),
        }
    }

    /// Convert an HTML fragment to Markdown
    pub fn turndown(&self, html: &str) -> String {
        self.turndown_nodes(&parse_html(html))
    }

    /// Convert an already parsed tree to Markdown
    pub fn turndown_nodes(&self, nodes: &[Node]) -> String {
        let ast = Converter::new(&self.rules).document(nodes);
        serialize(&ast, &self.style)
    }

    /// Keep matching elements as raw HTML
    pub fn keep<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rules.keep(tags);
        self
    }

    /// Drop matching elements together with their content
    pub fn remove<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rules.remove(tags);
        self
    }

    pub fn escape(&self, text: &str) -> String {
        escape_markdown(text)
    }

    pub fn style(&self) -> &MarkdownStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut MarkdownStyle {
        &mut self.style
    }

    pub fn rules(&self) -> &TagRules {
        &self.rules
    }
}
