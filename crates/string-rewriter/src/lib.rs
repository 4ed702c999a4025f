//! # string-rewriter
//!
//! A fast HTML to Markdown rewriter for valid, simple markup.
//!
//! Unlike `dom-rewriter` it never builds a spec-compliant document: `tl`
//! tokenizes the input into a flat arena of nodes and the translator walks it
//! once. Malformed markup is tolerated but not repaired the way a browser
//! would repair it.
//!
//! Tag handling is driven by three ordered tag sets:
//!
//! - `skip_tags`: the wrapper is dropped, children are translated normally
//! - `ignore_tags`: the element and everything inside it is dropped
//! - `empty_tags`: the element is flattened to its plain text
//!
//! ```rust
//! use string_rewriter::{translate, TranslateOptions};
//!
//! let options = TranslateOptions::default().with_bullet_marker('*');
//! let markdown = translate("<ul><li>Item 1</li><li>Item 2</li></ul>", &options).unwrap();
//! assert_eq!(markdown, "* Item 1\n* Item 2");
//! ```

mod options;
mod text;
mod translate;

pub use options::{
    TranslateOptions, DEFAULT_BULLET_MARKER, DEFAULT_IGNORE_TAGS, DEFAULT_SKIP_TAGS,
};
pub use translate::{translate, MAX_DEPTH};

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("HTML parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, TranslateError>;
