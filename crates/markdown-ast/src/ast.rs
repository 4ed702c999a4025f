//! Markdown Abstract Syntax Tree
//!
//! The intermediate format both rewriters build before serialization.

/// A block-level Markdown node
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Root container; nested documents are flattened by the serializer
    Document(Vec<Block>),

    /// Heading with level (1-6) and inline content
    Heading { level: u8, content: Vec<Inline> },

    Paragraph(Vec<Inline>),

    BlockQuote(Vec<Block>),

    /// Ordered or unordered list; `start` is only meaningful when ordered
    List {
        ordered: bool,
        start: u32,
        items: Vec<ListItem>,
    },

    /// Code block. Fenced vs. indented is decided by the serializer style.
    CodeBlock {
        language: Option<String>,
        code: String,
    },

    ThematicBreak,

    /// GFM-style table
    Table {
        headers: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },

    /// Raw HTML emitted verbatim (keep rules on block elements)
    HtmlBlock(String),
}

/// A list item containing blocks
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub content: Vec<Block>,
}

impl ListItem {
    pub fn new(content: Vec<Block>) -> Self {
        Self { content }
    }

    pub fn from_inlines(inlines: Vec<Inline>) -> Self {
        Self {
            content: vec![Block::Paragraph(inlines)],
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.iter().all(Block::is_blank)
    }
}

/// An inline Markdown node
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Text that has already been escaped for Markdown
    Text(String),

    Strong(Vec<Inline>),

    Emphasis(Vec<Inline>),

    /// Inline code; content is literal
    Code(String),

    Link {
        content: Vec<Inline>,
        url: String,
        title: Option<String>,
    },

    Image {
        alt: String,
        url: String,
        title: Option<String>,
    },

    /// Hard line break
    LineBreak,

    /// Raw HTML emitted verbatim (keep rules on inline elements)
    HtmlInline(String),
}

impl Block {
    /// Wrap a list of blocks, collapsing the single-child case.
    pub fn from_blocks(mut blocks: Vec<Block>) -> Option<Block> {
        match blocks.len() {
            0 => None,
            1 => blocks.pop(),
            _ => Some(Block::Document(blocks)),
        }
    }

    /// True when serializing this block would produce no visible output
    pub fn is_blank(&self) -> bool {
        match self {
            Block::Document(blocks) | Block::BlockQuote(blocks) => blocks.iter().all(Block::is_blank),
            Block::Paragraph(inlines) | Block::Heading { content: inlines, .. } => {
                inlines.iter().all(Inline::is_blank)
            }
            Block::List { items, .. } => items.iter().all(ListItem::is_blank),
            Block::CodeBlock { code, .. } => code.trim().is_empty(),
            Block::Table { headers, rows } => {
                headers.iter().flatten().all(Inline::is_blank)
                    && rows.iter().flatten().flatten().all(Inline::is_blank)
            }
            Block::ThematicBreak => false,
            Block::HtmlBlock(html) => html.trim().is_empty(),
        }
    }
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text(text.into())
    }

    /// True when serializing this inline would produce no visible output
    pub fn is_blank(&self) -> bool {
        match self {
            Inline::Text(text) => text.trim().is_empty(),
            Inline::Strong(inlines) | Inline::Emphasis(inlines) => {
                inlines.iter().all(Inline::is_blank)
            }
            Inline::Code(code) => code.is_empty(),
            Inline::Link { content, .. } => content.iter().all(Inline::is_blank),
            Inline::Image { .. } | Inline::LineBreak => false,
            Inline::HtmlInline(html) => html.trim().is_empty(),
        }
    }

    /// Plain text of this inline with all markup dropped
    pub fn plain_text(&self) -> String {
        match self {
            Inline::Text(text) | Inline::Code(text) | Inline::HtmlInline(text) => text.clone(),
            Inline::Strong(inner) | Inline::Emphasis(inner) | Inline::Link { content: inner, .. } => {
                inner.iter().map(Inline::plain_text).collect()
            }
            Inline::Image { alt, .. } => alt.clone(),
            Inline::LineBreak => "\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_blocks_collapses_single_child() {
        assert_eq!(Block::from_blocks(vec![]), None);
        assert_eq!(
            Block::from_blocks(vec![Block::ThematicBreak]),
            Some(Block::ThematicBreak)
        );
        assert!(matches!(
            Block::from_blocks(vec![Block::ThematicBreak, Block::ThematicBreak]),
            Some(Block::Document(_))
        ));
    }

    #[test]
    fn test_blankness() {
        assert!(Block::Paragraph(vec![Inline::text("  ")]).is_blank());
        assert!(!Block::Paragraph(vec![Inline::LineBreak]).is_blank());
        assert!(Block::List {
            ordered: false,
            start: 1,
            items: vec![ListItem::from_inlines(vec![])],
        }
        .is_blank());
    }

    #[test]
    fn test_plain_text_drops_markup() {
        let inline = Inline::Strong(vec![
            Inline::text("a "),
            Inline::Link {
                content: vec![Inline::text("b")],
                url: "u".into(),
                title: None,
            },
        ]);
        assert_eq!(inline.plain_text(), "a b");
    }
}
