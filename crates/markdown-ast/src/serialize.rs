//! Markdown AST serialization
//!
//! Converts Markdown AST nodes into Markdown text.

use crate::ast::{Block, Inline, ListItem};
use crate::options::{CodeBlockStyle, HeadingStyle, LinkReferenceStyle, LinkStyle, MarkdownStyle};

/// Serialize a block to a Markdown string
pub fn serialize(block: &Block, style: &MarkdownStyle) -> String {
    let mut writer = Writer::new(style);
    writer.block(block);
    writer.finish()
}

/// A link definition collected while writing referenced links
struct Reference {
    label: String,
    url: String,
    title: Option<String>,
}

struct Writer<'a> {
    style: &'a MarkdownStyle,
    out: String,
    references: Vec<Reference>,
}

impl<'a> Writer<'a> {
    fn new(style: &'a MarkdownStyle) -> Self {
        Self {
            style,
            out: String::with_capacity(4096),
            references: Vec::new(),
        }
    }

    fn finish(mut self) -> String {
        let mut output = collapse_and_trim(&self.out);

        if !self.references.is_empty() {
            output.push_str("\n\n");
            for (i, reference) in self.references.drain(..).enumerate() {
                if i > 0 {
                    output.push('\n');
                }
                output.push('[');
                output.push_str(&reference.label);
                output.push_str("]: ");
                output.push_str(&reference.url);
                push_title(&mut output, reference.title.as_deref());
            }
        }

        output
    }

    /// Run `f` against an empty buffer and return what it wrote.
    /// Link references keep accumulating in `self`.
    fn capture(&mut self, f: impl FnOnce(&mut Self)) -> String {
        let saved = std::mem::take(&mut self.out);
        f(self);
        std::mem::replace(&mut self.out, saved)
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Document(blocks) => {
                for child in blocks.iter().filter(|b| !b.is_blank()) {
                    self.block(child);
                }
            }

            Block::Heading { level, content } => self.heading(*level, content),

            Block::Paragraph(inlines) => {
                let text = self.capture(|w| w.inlines(inlines));
                let text = text.trim();
                if !text.is_empty() {
                    self.out.push_str(text);
                    self.out.push_str("\n\n");
                }
            }

            Block::BlockQuote(blocks) => {
                let inner = self.capture(|w| {
                    for child in blocks {
                        w.block(child);
                    }
                });
                let inner = collapse_and_trim(&inner);
                if inner.is_empty() {
                    return;
                }
                for line in inner.lines() {
                    self.out.push('>');
                    if !line.is_empty() {
                        self.out.push(' ');
                        self.out.push_str(line);
                    }
                    self.out.push('\n');
                }
                self.out.push('\n');
            }

            Block::List {
                ordered,
                start,
                items,
            } => self.list(*ordered, *start, items),

            Block::CodeBlock { language, code } => self.code_block(language.as_deref(), code),

            Block::ThematicBreak => {
                self.out.push_str(&self.style.hr);
                self.out.push_str("\n\n");
            }

            Block::Table { headers, rows } => self.table(headers, rows),

            Block::HtmlBlock(html) => {
                self.out.push_str(html.trim());
                self.out.push_str("\n\n");
            }
        }
    }

    fn heading(&mut self, level: u8, content: &[Inline]) {
        let text = self.capture(|w| w.inlines(content));
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        match self.style.heading_style {
            HeadingStyle::Setext if level <= 2 => {
                let underline = if level == 1 { "=" } else { "-" };
                self.out.push_str(text);
                self.out.push('\n');
                self.out.push_str(&underline.repeat(text.chars().count()));
            }
            _ => {
                self.out.push_str(&"#".repeat(level.clamp(1, 6) as usize));
                self.out.push(' ');
                self.out.push_str(text);
            }
        }
        self.out.push_str("\n\n");
    }

    fn list(&mut self, ordered: bool, start: u32, items: &[ListItem]) {
        for (i, item) in items.iter().enumerate() {
            let prefix = if ordered {
                format!("{}. ", start.saturating_add(i as u32))
            } else {
                format!("{} ", self.style.bullet_list_marker)
            };
            let body = self.list_item(item);
            let continuation = " ".repeat(prefix.len());

            self.out.push_str(&prefix);
            for (n, line) in body.lines().enumerate() {
                if n > 0 {
                    self.out.push('\n');
                    if !line.is_empty() {
                        self.out.push_str(&continuation);
                    }
                }
                self.out.push_str(line);
            }
            self.out.push('\n');
        }
        self.out.push('\n');
    }

    fn list_item(&mut self, item: &ListItem) -> String {
        let mut body = String::new();
        let mut previous_was_paragraph = false;

        for block in item.content.iter().filter(|b| !b.is_blank()) {
            let rendered = self.capture(|w| w.block(block));
            let rendered = collapse_and_trim(&rendered);
            if rendered.is_empty() {
                continue;
            }
            if !body.is_empty() {
                // A nested list hugs the paragraph that introduces it
                let tight = previous_was_paragraph && matches!(block, Block::List { .. });
                body.push_str(if tight { "\n" } else { "\n\n" });
            }
            body.push_str(&rendered);
            previous_was_paragraph = matches!(block, Block::Paragraph(_));
        }

        body
    }

    fn code_block(&mut self, language: Option<&str>, code: &str) {
        let code = code.strip_suffix('\n').unwrap_or(code);

        match self.style.code_block_style {
            CodeBlockStyle::Fenced => {
                let fence = fence_for(&self.style.fence, code);
                self.out.push_str(&fence);
                self.out.push_str(language.unwrap_or(""));
                self.out.push('\n');
                self.out.push_str(code);
                self.out.push('\n');
                self.out.push_str(&fence);
            }
            CodeBlockStyle::Indented => {
                for (i, line) in code.split('\n').enumerate() {
                    if i > 0 {
                        self.out.push('\n');
                    }
                    self.out.push_str("    ");
                    self.out.push_str(line);
                }
            }
        }
        self.out.push_str("\n\n");
    }

    fn table(&mut self, headers: &[Vec<Inline>], rows: &[Vec<Vec<Inline>>]) {
        let columns = rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(headers.len()))
            .max()
            .unwrap_or(0);
        if columns == 0 {
            return;
        }

        let render_row = |w: &mut Self, cells: &[Vec<Inline>]| -> Vec<String> {
            (0..columns)
                .map(|i| match cells.get(i) {
                    Some(cell) => {
                        let text = w.capture(|w| w.inlines(cell));
                        text.trim().replace('\n', " ").replace('|', "\\|")
                    }
                    None => String::new(),
                })
                .collect()
        };

        let header_cells = render_row(self, headers);
        let body: Vec<Vec<String>> = rows.iter().map(|row| render_row(self, row)).collect();

        let mut widths = vec![3usize; columns];
        for row in std::iter::once(&header_cells).chain(body.iter()) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let write_row = |out: &mut String, cells: &[String]| {
            out.push('|');
            for (cell, width) in cells.iter().zip(&widths) {
                out.push(' ');
                out.push_str(cell);
                out.push_str(&" ".repeat(width - cell.chars().count()));
                out.push_str(" |");
            }
            out.push('\n');
        };

        write_row(&mut self.out, &header_cells);
        self.out.push('|');
        for width in &widths {
            self.out.push(' ');
            self.out.push_str(&"-".repeat(*width));
            self.out.push_str(" |");
        }
        self.out.push('\n');
        for row in &body {
            write_row(&mut self.out, row);
        }
        self.out.push('\n');
    }

    fn inlines(&mut self, inlines: &[Inline]) {
        for inline in inlines {
            self.inline(inline);
        }
    }

    fn inline(&mut self, inline: &Inline) {
        match inline {
            Inline::Text(text) => self.out.push_str(text),

            Inline::Strong(content) => {
                let delimiter = self.style.strong_delimiter.clone();
                self.delimited(content, &delimiter);
            }

            Inline::Emphasis(content) => {
                let delimiter = self.style.em_delimiter.to_string();
                self.delimited(content, &delimiter);
            }

            Inline::Code(code) => {
                if code.is_empty() {
                    return;
                }
                let ticks = "`".repeat(longest_run(code, '`') + 1);
                let pad = if code.starts_with('`') || code.ends_with('`') {
                    " "
                } else {
                    ""
                };
                self.out.push_str(&ticks);
                self.out.push_str(pad);
                self.out.push_str(code);
                self.out.push_str(pad);
                self.out.push_str(&ticks);
            }

            Inline::Link {
                content,
                url,
                title,
            } => self.link(content, url, title.as_deref()),

            Inline::Image { alt, url, title } => {
                self.out.push_str("![");
                self.out.push_str(alt);
                self.out.push_str("](");
                self.out.push_str(url);
                push_title(&mut self.out, title.as_deref());
                self.out.push(')');
            }

            Inline::LineBreak => self.out.push_str("  \n"),

            Inline::HtmlInline(html) => self.out.push_str(html),
        }
    }

    /// Wrap content in a delimiter, keeping surrounding whitespace outside of
    /// it so `<b>bold </b>` does not turn into `**bold **`.
    fn delimited(&mut self, content: &[Inline], delimiter: &str) {
        let inner = self.capture(|w| w.inlines(content));
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            self.out.push_str(&inner);
            return;
        }
        let leading = &inner[..inner.len() - inner.trim_start().len()];
        let trailing = &inner[inner.trim_end().len()..];

        self.out.push_str(leading);
        self.out.push_str(delimiter);
        self.out.push_str(trimmed);
        self.out.push_str(delimiter);
        self.out.push_str(trailing);
    }

    fn link(&mut self, content: &[Inline], url: &str, title: Option<&str>) {
        let text = self.capture(|w| w.inlines(content));

        match self.style.link_style {
            LinkStyle::Inlined => {
                self.out.push('[');
                self.out.push_str(&text);
                self.out.push_str("](");
                self.out.push_str(url);
                push_title(&mut self.out, title);
                self.out.push(')');
            }
            LinkStyle::Referenced => {
                let label = match self.style.link_reference_style {
                    LinkReferenceStyle::Full => {
                        let label = (self.references.len() + 1).to_string();
                        self.out.push('[');
                        self.out.push_str(&text);
                        self.out.push_str("][");
                        self.out.push_str(&label);
                        self.out.push(']');
                        label
                    }
                    LinkReferenceStyle::Collapsed => {
                        self.out.push('[');
                        self.out.push_str(&text);
                        self.out.push_str("][]");
                        text
                    }
                    LinkReferenceStyle::Shortcut => {
                        self.out.push('[');
                        self.out.push_str(&text);
                        self.out.push(']');
                        text
                    }
                };
                self.references.push(Reference {
                    label,
                    url: url.to_string(),
                    title: title.map(str::to_string),
                });
            }
        }
    }
}

fn push_title(out: &mut String, title: Option<&str>) {
    if let Some(title) = title {
        out.push_str(" \"");
        out.push_str(&title.replace('"', "\\\""));
        out.push('"');
    }
}

fn longest_run(text: &str, needle: char) -> usize {
    text.chars()
        .fold((0, 0), |(longest, current), c| {
            if c == needle {
                (longest.max(current + 1), current + 1)
            } else {
                (longest, 0)
            }
        })
        .0
}

/// Lengthen the configured fence until it cannot be closed by the code itself
fn fence_for(fence: &str, code: &str) -> String {
    let fence_char = fence.chars().next().unwrap_or('`');
    let needed = longest_run(code, fence_char) + 1;
    let length = fence.chars().count().max(needed);
    fence_char.to_string().repeat(length)
}

/// Collapse runs of more than two newlines and trim surrounding newlines
fn collapse_and_trim(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut newlines = 0;

    for c in s.trim_matches('\n').chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                result.push(c);
            }
        } else {
            newlines = 0;
            result.push(c);
        }
    }

    result
}
