//! HTML to Markdown AST translation over the `tl` node arena

use std::cell::Cell;

use markdown_ast::{serialize, Block, Inline, ListItem};
use smallvec::SmallVec;
use tl::{HTMLTag, Node, NodeHandle, Parser, ParserOptions};

use crate::options::{TagAction, TranslateOptions};
use crate::text::{collapse_and_escape, decode_entities};
use crate::{Result, TranslateError};

// Most inline elements have few children
type InlineVec = SmallVec<[Inline; 4]>;

/// Elements that start a new block when they appear in flow content
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "dialog", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hgroup", "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section",
    "summary", "table", "ul",
];

/// Elements nested deeper than this are translated as plain text
pub const MAX_DEPTH: usize = 256;

fn is_block_tag(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

/// Translate an HTML string to Markdown.
///
/// Returns an empty string when nothing in the input survives translation.
pub fn translate(html: &str, options: &TranslateOptions) -> Result<String> {
    let dom = tl::parse(html, ParserOptions::default())
        .map_err(|err| TranslateError::Parse(format!("{err:?}")))?;
    let translator = Translator {
        parser: dom.parser(),
        options,
        depth: Cell::new(0),
    };
    let document = Block::Document(translator.blocks(dom.children()));
    Ok(serialize(&document, &options.markdown_style()))
}

struct Translator<'t, 'h> {
    parser: &'t Parser<'h>,
    options: &'t TranslateOptions,
    depth: Cell<usize>,
}

/// One level of element nesting, released on drop
struct Level<'a>(&'a Cell<usize>);

impl Drop for Level<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

fn tag_name(tag: &HTMLTag) -> String {
    tag.name().as_utf8_str().to_ascii_lowercase()
}

fn attribute(tag: &HTMLTag, name: &str) -> Option<String> {
    let value = tag.attributes().get(name).flatten()?;
    let decoded = decode_entities(&value.as_utf8_str());
    let trimmed = decoded.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl<'t, 'h> Translator<'t, 'h> {
    fn nodes<'s>(&'s self, handles: &'s [NodeHandle]) -> impl Iterator<Item = &'t Node<'h>> + 's {
        handles.iter().filter_map(|handle| handle.get(self.parser))
    }

    fn enter(&self) -> Option<Level<'_>> {
        let depth = self.depth.get();
        (depth < MAX_DEPTH).then(|| {
            self.depth.set(depth + 1);
            Level(&self.depth)
        })
    }

    fn is_block_level(&self, tag: &HTMLTag) -> bool {
        let name = tag_name(tag);
        match self.options.action(&name) {
            TagAction::Ignore => false,
            _ => is_block_tag(&name),
        }
    }

    fn blocks(&self, handles: &[NodeHandle]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut pending = InlineVec::new();

        for node in self.nodes(handles) {
            match node {
                Node::Raw(raw) => push_text(&raw.as_utf8_str(), &mut pending),
                Node::Tag(tag) if self.is_block_level(tag) => {
                    flush_paragraph(&mut pending, &mut blocks);
                    blocks.extend(self.block(tag));
                }
                Node::Tag(tag) => self.inline(tag, &mut pending),
                Node::Comment(_) => {}
            }
        }

        flush_paragraph(&mut pending, &mut blocks);
        blocks
    }

    fn block(&self, tag: &HTMLTag) -> Option<Block> {
        let name = tag_name(tag);
        let children = tag.children();
        let children = children.top().as_slice();

        let action = self.options.action(&name);
        match action {
            TagAction::Ignore => return None,
            TagAction::Empty => {
                let text = collapse_and_escape(&decode_entities(&self.text_content(tag)), true);
                return (!text.trim().is_empty()).then(|| Block::Paragraph(vec![Inline::Text(text)]));
            }
            TagAction::Skip | TagAction::Translate => {}
        }

        let Some(_level) = self.enter() else {
            let text = collapse_and_escape(&decode_entities(&self.visible_text(tag)), true);
            return (!text.trim().is_empty()).then(|| Block::Paragraph(vec![Inline::Text(text)]));
        };

        if action == TagAction::Skip {
            return Block::from_blocks(self.blocks(children));
        }

        match name.as_str() {
            "p" => {
                let inlines = self.inlines(children);
                (!inlines.iter().all(Inline::is_blank)).then_some(Block::Paragraph(inlines))
            }

            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse().unwrap_or(1);
                let content = self.inlines(children);
                (!content.iter().all(Inline::is_blank)).then_some(Block::Heading { level, content })
            }

            "blockquote" => {
                let inner = self.blocks(children);
                (!inner.is_empty()).then_some(Block::BlockQuote(inner))
            }

            "ul" | "ol" => {
                let start = attribute(tag, "start")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1);
                let items: Vec<ListItem> = self
                    .nodes(children)
                    .filter_map(|node| match node {
                        Node::Tag(li) if tag_name(li) == "li" => Some(li),
                        _ => None,
                    })
                    .map(|li| ListItem::new(self.blocks(li.children().top().as_slice())))
                    .collect();
                (!items.is_empty()).then_some(Block::List {
                    ordered: name == "ol",
                    start,
                    items,
                })
            }

            "pre" => Some(self.code_block(tag)),

            "hr" => Some(Block::ThematicBreak),

            "table" => self.table(tag),

            _ => Block::from_blocks(self.blocks(children)),
        }
    }

    fn inlines(&self, handles: &[NodeHandle]) -> Vec<Inline> {
        let mut inlines = InlineVec::new();
        for node in self.nodes(handles) {
            match node {
                Node::Raw(raw) => push_text(&raw.as_utf8_str(), &mut inlines),
                Node::Tag(tag) => self.inline(tag, &mut inlines),
                Node::Comment(_) => {}
            }
        }
        inlines.into_vec()
    }

    fn inline(&self, tag: &HTMLTag, out: &mut InlineVec) {
        let name = tag_name(tag);
        let children = tag.children();
        let children = children.top().as_slice();

        let action = self.options.action(&name);
        match action {
            TagAction::Ignore => return,
            TagAction::Empty => {
                push_text(&self.text_content(tag), out);
                return;
            }
            TagAction::Skip | TagAction::Translate => {}
        }

        let Some(_level) = self.enter() else {
            push_text(&self.visible_text(tag), out);
            return;
        };

        if action == TagAction::Skip {
            out.extend(self.inlines(children));
            return;
        }

        match name.as_str() {
            "strong" | "b" => {
                let inner = self.inlines(children);
                if !inner.is_empty() {
                    out.push(Inline::Strong(inner));
                }
            }

            "em" | "i" => {
                let inner = self.inlines(children);
                if !inner.is_empty() {
                    out.push(Inline::Emphasis(inner));
                }
            }

            "code" => {
                let code = decode_entities(&self.text_content(tag));
                if !code.is_empty() {
                    out.push(Inline::Code(code));
                }
            }

            "a" => {
                let content = self.inlines(children);
                match attribute(tag, "href") {
                    Some(url) => out.push(Inline::Link {
                        content,
                        url,
                        title: attribute(tag, "title"),
                    }),
                    None => out.extend(content),
                }
            }

            "img" => {
                if let Some(url) = attribute(tag, "src") {
                    out.push(Inline::Image {
                        alt: attribute(tag, "alt").unwrap_or_default(),
                        url,
                        title: attribute(tag, "title"),
                    });
                }
            }

            "br" => out.push(Inline::LineBreak),

            _ => out.extend(self.inlines(children)),
        }
    }

    fn text_content(&self, tag: &HTMLTag) -> String {
        self.collect_text(tag, false)
    }

    /// Text of `tag` without the content of ignored descendants
    fn visible_text(&self, tag: &HTMLTag) -> String {
        self.collect_text(tag, true)
    }

    fn collect_text(&self, tag: &HTMLTag, skip_ignored: bool) -> String {
        let mut text = String::new();
        let mut stack: Vec<NodeHandle> = tag.children().top().as_slice().to_vec();
        stack.reverse();

        while let Some(handle) = stack.pop() {
            match handle.get(self.parser) {
                Some(Node::Raw(raw)) => text.push_str(&raw.as_utf8_str()),
                Some(Node::Tag(child)) => {
                    if skip_ignored && self.options.action(&tag_name(child)) == TagAction::Ignore {
                        continue;
                    }
                    let start = stack.len();
                    stack.extend_from_slice(child.children().top().as_slice());
                    stack[start..].reverse();
                }
                _ => {}
            }
        }

        text
    }

    fn code_block(&self, pre: &HTMLTag) -> Block {
        let code_tag = self
            .nodes(pre.children().top().as_slice())
            .find_map(|node| match node {
                Node::Tag(tag) if tag_name(tag) == "code" => Some(tag),
                _ => None,
            });

        match code_tag {
            Some(code) => {
                let language = attribute(code, "class").and_then(|class| {
                    class
                        .split_whitespace()
                        .find_map(|c| c.strip_prefix("language-").or_else(|| c.strip_prefix("lang-")))
                        .map(str::to_string)
                });
                Block::CodeBlock {
                    language,
                    code: decode_entities(&self.text_content(code)),
                }
            }
            None => Block::CodeBlock {
                language: None,
                code: decode_entities(&self.text_content(pre)),
            },
        }
    }

    fn table(&self, table: &HTMLTag) -> Option<Block> {
        let mut headers = Vec::new();
        let mut rows = Vec::new();
        self.table_section(table, &mut headers, &mut rows);

        if headers.is_empty() && rows.is_empty() {
            return None;
        }
        if headers.is_empty() {
            headers = rows.remove(0);
        }
        Some(Block::Table { headers, rows })
    }

    fn table_section(
        &self,
        section: &HTMLTag,
        headers: &mut Vec<Vec<Inline>>,
        rows: &mut Vec<Vec<Vec<Inline>>>,
    ) {
        for node in self.nodes(section.children().top().as_slice()) {
            let Node::Tag(child) = node else { continue };
            match tag_name(child).as_str() {
                "thead" | "tbody" | "tfoot" => {
                    if let Some(_level) = self.enter() {
                        self.table_section(child, headers, rows);
                    }
                }
                "tr" => {
                    let mut is_header = false;
                    let row: Vec<Vec<Inline>> = self
                        .nodes(child.children().top().as_slice())
                        .filter_map(|cell| match cell {
                            Node::Tag(cell) => {
                                let cell_name = tag_name(cell);
                                matches!(cell_name.as_str(), "th" | "td").then(|| {
                                    is_header |= cell_name == "th";
                                    self.inlines(cell.children().top().as_slice())
                                })
                            }
                            _ => None,
                        })
                        .collect();

                    if row.is_empty() {
                        continue;
                    }
                    if is_header && headers.is_empty() && rows.is_empty() {
                        *headers = row;
                    } else {
                        rows.push(row);
                    }
                }
                _ => {}
            }
        }
    }
}

fn push_text(raw: &str, out: &mut InlineVec) {
    let decoded = decode_entities(raw);
    let collapsed = collapse_and_escape(&decoded, out.is_empty());
    let ends_with_space = matches!(out.last(), Some(Inline::Text(prev)) if prev.ends_with(' '));
    let collapsed = if ends_with_space {
        collapsed.trim_start()
    } else {
        collapsed.as_str()
    };
    if !collapsed.is_empty() {
        out.push(Inline::Text(collapsed.to_string()));
    }
}

fn flush_paragraph(pending: &mut InlineVec, blocks: &mut Vec<Block>) {
    if pending.is_empty() {
        return;
    }
    let inlines = std::mem::take(pending).into_vec();
    if !inlines.iter().all(Inline::is_blank) {
        blocks.push(Block::Paragraph(inlines));
    }
}
