//! Keep and remove rules.
//!
//! Markdown rules for the CommonMark elements always win; keep rules are
//! consulted next and remove rules last, matching turndown's precedence.

use indexmap::IndexSet;

#[derive(Debug, Clone, Default)]
pub struct TagRules {
    keep: IndexSet<String>,
    remove: IndexSet<String>,
}

/// What the converter should do with an element that has no Markdown rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// Emit the element's outer HTML unchanged
    Keep,
    /// Drop the element and its subtree
    Remove,
    /// Render the children in place of the element
    Unwrap,
}

impl TagRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keep
            .extend(tags.into_iter().map(|t| t.as_ref().trim().to_ascii_lowercase()));
    }

    pub fn remove<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.remove
            .extend(tags.into_iter().map(|t| t.as_ref().trim().to_ascii_lowercase()));
    }

    pub fn keeps(&self, tag: &str) -> bool {
        self.keep.contains(tag)
    }

    pub fn removes(&self, tag: &str) -> bool {
        self.remove.contains(tag)
    }

    pub(crate) fn disposition(&self, tag: &str) -> Disposition {
        if self.keeps(tag) {
            Disposition::Keep
        } else if self.removes(tag) {
            Disposition::Remove
        } else {
            Disposition::Unwrap
        }
    }
}
