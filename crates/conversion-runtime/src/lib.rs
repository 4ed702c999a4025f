//! # conversion-runtime
//!
//! HTML to Markdown conversion behind one contract, with two engines:
//!
//! - [`Engine::DomEngine`]: runs a turndown-style rewriter inside a document
//!   context bound to one thread. Malformed markup is repaired the way a
//!   browser repairs it.
//! - [`Engine::StringEngine`]: runs a lightweight rewriter behind a serial
//!   queue. Faster, meant for valid and simple markup.
//!
//! Engines are script libraries loaded into an execution environment on first
//! use. The environment is probed before every DOM conversion and rebuilt if
//! it was lost.
//!
//! ```rust
//! use conversion_runtime::{BulletMarker, ConversionOptions, MarkdownService};
//!
//! let service = MarkdownService::new().unwrap();
//! let options = ConversionOptions::new().with_bullet_marker(BulletMarker::Asterisk);
//! let markdown = service
//!     .convert_blocking("<h1>Hello World</h1><ul><li>Item 1</li></ul>", &options)
//!     .unwrap();
//! assert_eq!(markdown, "# Hello World\n\n* Item 1");
//! ```
//!
//! Converting input with nothing renderable in it, such as a lone `<script>`,
//! yields [`ConversionError::EmptyResult`]. Empty or blank input is not an
//! error and converts to an empty string.

mod engine;
mod error;
pub mod escape;
mod library;
mod options;
mod outcome;
pub mod queue;
mod runtime;
pub mod script;
mod service;

pub use engine::{DomAdapter, EngineAdapter, EnvironmentPhase, StringAdapter};
pub use error::{ConversionError, LoadStage, Result};
pub use library::{LibrarySource, NativeLibraries, SearchPathLibrarySource};
pub use options::{
    BulletMarker, CodeBlockStyle, ConversionOptions, Engine, HeadingStyle, LibrarySpec,
    RuntimeConfig,
};
pub use outcome::ConversionOutcome;
pub use runtime::ConversionRuntime;
pub use script::native::NativeHost;
pub use script::{ContextFactory, ScriptContext, ScriptException, ScriptValue};
pub use service::MarkdownService;
