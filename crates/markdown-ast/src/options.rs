//! Style options for Markdown serialization

/// Heading style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingStyle {
    /// Underlined headings (`===` / `---`).
    /// Only h1 and h2 can be underlined; deeper levels fall back to ATX.
    #[default]
    Setext,
    /// `#`-prefixed headings
    Atx,
}

/// Code block style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeBlockStyle {
    /// Four-space indented code blocks
    #[default]
    Indented,
    /// Fenced code blocks
    Fenced,
}

/// Link style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStyle {
    /// `[text](url)`
    #[default]
    Inlined,
    /// `[text][label]` with definitions collected at the end of the document
    Referenced,
}

/// Label style for referenced links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkReferenceStyle {
    /// `[text][1]`
    #[default]
    Full,
    /// `[text][]`
    Collapsed,
    /// `[text]`
    Shortcut,
}

/// Everything the serializer needs to know about the desired Markdown flavour.
///
/// The defaults follow turndown's defaults; callers that want a different
/// house style override individual fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownStyle {
    pub heading_style: HeadingStyle,

    /// Thematic break string
    pub hr: String,

    pub bullet_list_marker: char,

    pub code_block_style: CodeBlockStyle,

    /// Fence used for fenced code blocks. Lengthened automatically when the
    /// code itself contains a run of fence characters.
    pub fence: String,

    pub em_delimiter: char,

    pub strong_delimiter: String,

    pub link_style: LinkStyle,

    pub link_reference_style: LinkReferenceStyle,
}

impl Default for MarkdownStyle {
    fn default() -> Self {
        Self {
            heading_style: HeadingStyle::Setext,
            hr: "* * *".to_string(),
            bullet_list_marker: '*',
            code_block_style: CodeBlockStyle::Indented,
            fence: "```".to_string(),
            em_delimiter: '_',
            strong_delimiter: "**".to_string(),
            link_style: LinkStyle::Inlined,
            link_reference_style: LinkReferenceStyle::Full,
        }
    }
}
