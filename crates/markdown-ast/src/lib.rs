//! markdown-ast - Markdown AST and serialization
//!
//! Both rewriting libraries lower their input into this AST and hand it to
//! [`serialize`], so the two engines agree on escaping, spacing and
//! post-processing even though they parse HTML very differently.
//!
//! # Architecture
//!
//! ```text
//! HTML ──scraper/html5ever──▶ dom-rewriter ────┐
//!                                               ├──▶ Markdown AST ──▶ Markdown String
//! HTML ──tl────────────────▶ string-rewriter ──┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use markdown_ast::{Block, Inline, MarkdownStyle, serialize};
//!
//! let ast = Block::Document(vec![
//!     Block::Heading {
//!         level: 1,
//!         content: vec![Inline::text("Hello World")],
//!     },
//!     Block::Paragraph(vec![
//!         Inline::text("This is "),
//!         Inline::Strong(vec![Inline::text("bold")]),
//!         Inline::text(" text."),
//!     ]),
//! ]);
//!
//! let markdown = serialize(&ast, &MarkdownStyle::default());
//! assert!(markdown.contains("**bold**"));
//! ```

mod ast;
mod options;
mod serialize;

pub use ast::{Block, Inline, ListItem};
pub use options::{CodeBlockStyle, HeadingStyle, LinkReferenceStyle, LinkStyle, MarkdownStyle};
pub use serialize::serialize;
