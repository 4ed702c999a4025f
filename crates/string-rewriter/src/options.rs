//! Translation options

use indexmap::IndexSet;
use markdown_ast::{CodeBlockStyle, HeadingStyle, MarkdownStyle};

/// Wrappers dropped by default while their children are kept
pub const DEFAULT_SKIP_TAGS: &[&str] = &[
    "div", "html", "body", "nav", "section", "footer", "main", "aside", "article", "header",
];

/// Elements dropped by default together with their content
pub const DEFAULT_IGNORE_TAGS: &[&str] = &[
    "script", "style", "head", "noscript", "template", "svg", "meta",
];

pub const DEFAULT_BULLET_MARKER: char = '-';

/// Options for [`translate`](crate::translate).
///
/// Tag lists supplied by the caller are merged into the defaults rather than
/// replacing them, so `script` and `style` stay ignored unless a caller
/// explicitly lists them as skip or empty tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateOptions {
    pub skip_tags: IndexSet<String>,
    pub ignore_tags: IndexSet<String>,
    pub empty_tags: IndexSet<String>,
    pub bullet_marker: char,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            skip_tags: DEFAULT_SKIP_TAGS.iter().map(|t| t.to_string()).collect(),
            ignore_tags: DEFAULT_IGNORE_TAGS.iter().map(|t| t.to_string()).collect(),
            empty_tags: IndexSet::new(),
            bullet_marker: DEFAULT_BULLET_MARKER,
        }
    }
}

/// How a tag is treated before any Markdown rule is considered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagAction {
    Ignore,
    Empty,
    Skip,
    Translate,
}

fn normalize<I, S>(tags: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
}

impl TranslateOptions {
    pub fn with_skip_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in normalize(tags) {
            self.ignore_tags.shift_remove(&tag);
            self.skip_tags.insert(tag);
        }
        self
    }

    pub fn with_ignore_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in normalize(tags) {
            self.skip_tags.shift_remove(&tag);
            self.ignore_tags.insert(tag);
        }
        self
    }

    pub fn with_empty_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in normalize(tags) {
            self.skip_tags.shift_remove(&tag);
            self.ignore_tags.shift_remove(&tag);
            self.empty_tags.insert(tag);
        }
        self
    }

    pub fn with_bullet_marker(mut self, marker: char) -> Self {
        self.bullet_marker = marker;
        self
    }

    pub(crate) fn action(&self, tag: &str) -> TagAction {
        if self.ignore_tags.contains(tag) {
            TagAction::Ignore
        } else if self.empty_tags.contains(tag) {
            TagAction::Empty
        } else if self.skip_tags.contains(tag) {
            TagAction::Skip
        } else {
            TagAction::Translate
        }
    }

    /// The fixed house style of this rewriter
    pub(crate) fn markdown_style(&self) -> MarkdownStyle {
        MarkdownStyle {
            heading_style: HeadingStyle::Atx,
            hr: "---".to_string(),
            bullet_list_marker: self.bullet_marker,
            code_block_style: CodeBlockStyle::Fenced,
            em_delimiter: '*',
            ..MarkdownStyle::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_tags_merge_with_defaults() {
        let options = TranslateOptions::default().with_ignore_tags(["NAV", " aside "]);
        assert_eq!(options.action("nav"), TagAction::Ignore);
        assert_eq!(options.action("aside"), TagAction::Ignore);
        assert_eq!(options.action("script"), TagAction::Ignore);
        assert_eq!(options.action("div"), TagAction::Skip);
    }

    #[test]
    fn test_empty_tags_override_other_sets() {
        let options = TranslateOptions::default().with_empty_tags(["div", "style"]);
        assert_eq!(options.action("div"), TagAction::Empty);
        assert_eq!(options.action("style"), TagAction::Empty);
        assert_eq!(options.action("p"), TagAction::Translate);
    }
}
