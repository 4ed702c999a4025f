//! Library source lookup.
//!
//! Engines are plain script libraries. Where their source comes from is up to
//! the host: bundled with the binary, searched on disk, or anything else that
//! implements [`LibrarySource`].

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Resolves a logical library name to loadable source text
pub trait LibrarySource: Send + Sync {
    fn load_library_source(&self, name: &str) -> Option<String>;
}

impl<F> LibrarySource for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn load_library_source(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Bundled libraries backed by the in-process rewriters.
///
/// Only loadable into contexts created by
/// [`NativeHost`](crate::script::native::NativeHost), which provides the
/// `__nativeModule` loader they import from.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLibraries;

impl NativeLibraries {
    pub const TURNDOWN: &'static str = include_str!("../js/turndown.js");
    pub const HTML_TO_MD: &'static str = include_str!("../js/html-to-md.js");
}

impl LibrarySource for NativeLibraries {
    fn load_library_source(&self, name: &str) -> Option<String> {
        match name {
            "turndown" => Some(Self::TURNDOWN.to_string()),
            "html-to-md" => Some(Self::HTML_TO_MD.to_string()),
            _ => None,
        }
    }
}

static LIBRARY_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("library name pattern is valid")
});

fn is_valid_name(name: &str) -> bool {
    !name.contains("..") && LIBRARY_NAME.is_match(name)
}

/// Searches a prioritized list of directories.
///
/// For a name `lib` each root is tried for `lib.js`, `lib.min.js` and
/// `lib/index.js` before moving on to the next root.
#[derive(Debug, Clone, Default)]
pub struct SearchPathLibrarySource {
    roots: Vec<PathBuf>,
}

impl SearchPathLibrarySource {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push_root(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn candidates<'a>(root: &'a Path, name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        [
            root.join(format!("{name}.js")),
            root.join(format!("{name}.min.js")),
            root.join(name).join("index.js"),
        ]
        .into_iter()
    }
}

impl LibrarySource for SearchPathLibrarySource {
    fn load_library_source(&self, name: &str) -> Option<String> {
        // Names like "../x" would escape the roots
        if !is_valid_name(name) {
            debug!(name, "rejected library name");
            return None;
        }

        self.roots
            .iter()
            .flat_map(|root| Self::candidates(root, name))
            .find_map(|path| match std::fs::read_to_string(&path) {
                Ok(source) => {
                    debug!(name, path = %path.display(), "library found");
                    Some(source)
                }
                Err(_) => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_root(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "conversion-runtime-{label}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_native_libraries() {
        assert!(NativeLibraries.load_library_source("turndown").is_some());
        assert!(NativeLibraries.load_library_source("html-to-md").is_some());
        assert!(NativeLibraries.load_library_source("jquery").is_none());
    }

    #[test]
    fn test_closure_source() {
        let source = |name: &str| (name == "x").then(|| "1".to_string());
        assert_eq!(source.load_library_source("x").as_deref(), Some("1"));
        assert_eq!(source.load_library_source("y"), None);
    }

    #[test]
    fn test_search_order() {
        let first = temp_root("first");
        let second = temp_root("second");
        fs::write(second.join("turndown.js"), "second").unwrap();
        fs::create_dir_all(first.join("turndown")).unwrap();
        fs::write(first.join("turndown").join("index.js"), "first").unwrap();
        fs::write(second.join("html-to-md.min.js"), "minified").unwrap();

        let source = SearchPathLibrarySource::new([&first, &second]);
        assert_eq!(source.load_library_source("turndown").as_deref(), Some("first"));
        assert_eq!(
            source.load_library_source("html-to-md").as_deref(),
            Some("minified")
        );
        assert_eq!(source.load_library_source("missing"), None);

        let _ = fs::remove_dir_all(first);
        let _ = fs::remove_dir_all(second);
    }

    #[test]
    fn test_rejects_path_traversal() {
        let root = temp_root("traversal");
        let source = SearchPathLibrarySource::new([root.join("nested")]);
        fs::write(root.join("secret.js"), "nope").unwrap();
        assert_eq!(source.load_library_source("../secret"), None);
        assert_eq!(source.load_library_source(".hidden"), None);
        assert_eq!(source.load_library_source(""), None);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn test_library_name_pattern() {
        for name in ["turndown", "html-to-md", "lib.v2_1", "9lives"] {
            assert!(is_valid_name(name), "{name}");
        }
        for name in ["", "-flag", ".hidden", "a/b", "a\\b", "x..y", "name with space"] {
            assert!(!is_valid_name(name), "{name}");
        }
    }
}
