//! # dom-rewriter
//!
//! Convert HTML to Markdown through a real HTML5 document tree.
//!
//! The input is parsed with html5ever (via `scraper`) exactly the way a browser
//! would parse it, so unclosed tags, misnested formatting and stray end tags
//! are repaired before any rule runs. The resulting tree is lowered into the
//! shared [`markdown_ast`] and serialized.
//!
//! The API mirrors turndown: a [`TurndownService`] configured with a
//! [`MarkdownStyle`] plus `keep` and `remove` rules.
//!
//! ## Example
//!
//! ```rust
//! use dom_rewriter::{HeadingStyle, MarkdownStyle, TurndownService};
//!
//! let mut service = TurndownService::with_style(MarkdownStyle {
//!     heading_style: HeadingStyle::Atx,
//!     ..Default::default()
//! });
//! service.remove(["script", "style"]);
//!
//! let markdown = service.turndown("<h1>Hello World</h1><script>x()</script>");
//! assert_eq!(markdown, "# Hello World");
//! ```

mod convert;
pub mod html;
pub mod node;
mod rules;
mod service;
pub mod utilities;

pub use html::parse_html;
pub use markdown_ast::{
    CodeBlockStyle, HeadingStyle, LinkReferenceStyle, LinkStyle, MarkdownStyle,
};
pub use node::{Element, Node};
pub use rules::TagRules;
pub use service::TurndownService;
