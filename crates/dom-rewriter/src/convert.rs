//! Convert the owned DOM tree to the Markdown AST
//!
//! Block context accumulates runs of inline content into paragraphs and
//! flushes them whenever a block-level element starts, the way a browser
//! creates anonymous block boxes.

use markdown_ast::{Block, Inline, ListItem};

use crate::node::{Element, Node};
use crate::rules::{Disposition, TagRules};
use crate::utilities::{clean_attribute, collapse_whitespace, escape_markdown, is_block};

/// Elements handled by a Markdown rule. Keep and remove never apply to these.
fn has_markdown_rule(element: &Element) -> bool {
    match element.tag.as_str() {
        "p" | "br" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" | "ul" | "ol"
        | "li" | "pre" | "hr" | "em" | "i" | "strong" | "b" | "code" | "img" | "table" => true,
        "a" => element.attr("href").is_some(),
        _ => false,
    }
}

pub(crate) struct Converter<'a> {
    rules: &'a TagRules,
}

impl<'a> Converter<'a> {
    pub(crate) fn new(rules: &'a TagRules) -> Self {
        Self { rules }
    }

    pub(crate) fn document(&self, nodes: &[Node]) -> Block {
        Block::Document(self.blocks(nodes))
    }

    fn disposition(&self, element: &Element) -> Option<Disposition> {
        if has_markdown_rule(element) {
            None
        } else {
            Some(self.rules.disposition(&element.tag))
        }
    }

    fn is_block_level(&self, element: &Element) -> bool {
        match self.disposition(element) {
            None => matches!(
                element.tag.as_str(),
                "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" | "ul" | "ol" | "li"
                    | "pre" | "hr" | "table"
            ),
            Some(Disposition::Remove) => false,
            Some(_) => is_block(&element.tag) || self.contains_block(element),
        }
    }

    fn contains_block(&self, element: &Element) -> bool {
        element
            .element_children()
            .any(|child| self.is_block_level(child))
    }

    fn blocks(&self, nodes: &[Node]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut pending = Vec::new();

        for node in nodes {
            match node {
                Node::Text(text) => push_text(text, &mut pending),
                Node::Element(element) if self.is_block_level(element) => {
                    flush_paragraph(&mut pending, &mut blocks);
                    if let Some(block) = self.block(element) {
                        blocks.push(block);
                    }
                }
                Node::Element(element) => self.inline(element, &mut pending),
                Node::Comment(_) => {}
            }
        }

        flush_paragraph(&mut pending, &mut blocks);
        blocks
    }

    fn block(&self, element: &Element) -> Option<Block> {
        match self.disposition(element) {
            Some(Disposition::Keep) => return Some(Block::HtmlBlock(element.outer_html())),
            Some(Disposition::Remove) => return None,
            Some(Disposition::Unwrap) => return Block::from_blocks(self.blocks(&element.children)),
            None => {}
        }

        let tag = element.tag.as_str();
        match tag {
            "p" => Some(Block::Paragraph(self.inlines(&element.children))),

            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse().unwrap_or(1);
                Some(Block::Heading {
                    level,
                    content: self.inlines(&element.children),
                })
            }

            "blockquote" => Some(Block::BlockQuote(self.blocks(&element.children))),

            "ul" | "ol" => {
                let start = element
                    .attr("start")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(1);
                let items: Vec<ListItem> = element
                    .element_children()
                    .filter(|child| child.tag == "li")
                    .map(|li| ListItem::new(self.blocks(&li.children)))
                    .collect();
                Some(Block::List {
                    ordered: tag == "ol",
                    start,
                    items,
                })
            }

            // A stray <li> outside of any list renders as its content
            "li" => Block::from_blocks(self.blocks(&element.children)),

            "pre" => Some(code_block(element)),

            "hr" => Some(Block::ThematicBreak),

            "table" => self.table(element),

            _ => Block::from_blocks(self.blocks(&element.children)),
        }
    }

    fn inlines(&self, nodes: &[Node]) -> Vec<Inline> {
        let mut inlines = Vec::new();
        for node in nodes {
            match node {
                Node::Text(text) => push_text(text, &mut inlines),
                Node::Element(element) => self.inline(element, &mut inlines),
                Node::Comment(_) => {}
            }
        }
        inlines
    }

    fn inline(&self, element: &Element, out: &mut Vec<Inline>) {
        match self.disposition(element) {
            Some(Disposition::Keep) => {
                out.push(Inline::HtmlInline(element.outer_html()));
                return;
            }
            Some(Disposition::Remove) => return,
            Some(Disposition::Unwrap) => {
                out.extend(self.inlines(&element.children));
                return;
            }
            None => {}
        }

        match element.tag.as_str() {
            "strong" | "b" => out.push(Inline::Strong(self.inlines(&element.children))),

            "em" | "i" => out.push(Inline::Emphasis(self.inlines(&element.children))),

            "code" => {
                let code = element.text_content();
                if !code.is_empty() {
                    out.push(Inline::Code(code));
                }
            }

            "a" => {
                let content = self.inlines(&element.children);
                match clean_attribute(element.attr("href")) {
                    Some(url) => out.push(Inline::Link {
                        content,
                        url,
                        title: clean_attribute(element.attr("title")),
                    }),
                    None => out.extend(content),
                }
            }

            "img" => {
                if let Some(url) = clean_attribute(element.attr("src")) {
                    out.push(Inline::Image {
                        alt: clean_attribute(element.attr("alt")).unwrap_or_default(),
                        url,
                        title: clean_attribute(element.attr("title")),
                    });
                }
            }

            "br" => out.push(Inline::LineBreak),

            // Block elements nested inside inline content flatten to their text runs
            _ => out.extend(self.inlines(&element.children)),
        }
    }

    fn table(&self, table: &Element) -> Option<Block> {
        let mut headers: Vec<Vec<Inline>> = Vec::new();
        let mut rows: Vec<Vec<Vec<Inline>>> = Vec::new();
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
        section: &Element,
        headers: &mut Vec<Vec<Inline>>,
        rows: &mut Vec<Vec<Vec<Inline>>>,
    ) {
        for child in section.element_children() {
            match child.tag.as_str() {
                "thead" | "tbody" | "tfoot" => self.table_section(child, headers, rows),
                "tr" => {
                    let mut is_header = false;
                    let row: Vec<Vec<Inline>> = child
                        .element_children()
                        .filter(|cell| matches!(cell.tag.as_str(), "th" | "td"))
                        .map(|cell| {
                            is_header |= cell.tag == "th";
                            self.inlines(&cell.children)
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

fn push_text(text: &str, out: &mut Vec<Inline>) {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        return;
    }
    // Adjacent whitespace from neighbouring text runs collapses to one space
    let ends_with_space = matches!(out.last(), Some(Inline::Text(prev)) if prev.ends_with(' '));
    let collapsed = if ends_with_space {
        collapsed.trim_start().to_string()
    } else {
        collapsed
    };
    if !collapsed.is_empty() {
        out.push(Inline::Text(escape_markdown(&collapsed)));
    }
}

fn flush_paragraph(pending: &mut Vec<Inline>, blocks: &mut Vec<Block>) {
    if pending.is_empty() {
        return;
    }
    let inlines = std::mem::take(pending);
    if !inlines.iter().all(Inline::is_blank) {
        blocks.push(Block::Paragraph(inlines));
    }
}

fn code_block(pre: &Element) -> Block {
    match pre.element_children().find(|child| child.tag == "code") {
        Some(code) => {
            let language = code.attr("class").and_then(|class| {
                class
                    .split_whitespace()
                    .find_map(|c| c.strip_prefix("language-").or_else(|| c.strip_prefix("lang-")))
                    .map(str::to_string)
            });
            Block::CodeBlock {
                language,
                code: code.text_content(),
            }
        }
        None => Block::CodeBlock {
            language: None,
            code: pre.text_content(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markdown_ast::{serialize, MarkdownStyle};
    use pretty_assertions::assert_eq;

    fn convert(nodes: &[Node], rules: &TagRules) -> String {
        let ast = Converter::new(rules).document(nodes);
        serialize(&ast, &MarkdownStyle::default())
    }

    fn el(tag: &str, children: Vec<Node>) -> Node {
        Node::Element(Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children,
        })
    }

    #[test]
    fn test_mixed_inline_and_block_content() {
        let div = el(
            "div",
            vec![
                Node::text("Intro "),
                el("b", vec![Node::text("bold")]),
                el("p", vec![Node::text("Para")]),
                Node::text("Tail"),
            ],
        );
        assert_eq!(convert(&[div], &TagRules::new()), "Intro **bold**\n\nPara\n\nTail");
    }

    #[test]
    fn test_keep_emits_html() {
        let mut rules = TagRules::new();
        rules.keep(["sup"]);
        let p = el("p", vec![Node::text("x"), el("sup", vec![Node::text("2")])]);
        assert_eq!(convert(&[p], &rules), "x<sup>2</sup>");
    }

    #[test]
    fn test_keep_does_not_override_markdown_rules() {
        let mut rules = TagRules::new();
        rules.keep(["p"]);
        let p = el("p", vec![Node::text("plain")]);
        assert_eq!(convert(&[p], &rules), "plain");
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut rules = TagRules::new();
        rules.remove(["nav"]);
        let nodes = [
            el("nav", vec![el("p", vec![Node::text("menu")])]),
            el("p", vec![Node::text("body")]),
        ];
        assert_eq!(convert(&nodes, &rules), "body");
    }

    #[test]
    fn test_unknown_elements_unwrap() {
        let nodes = [el("custom-tag", vec![Node::text("inside")])];
        assert_eq!(convert(&nodes, &TagRules::new()), "inside");
    }

    #[test]
    fn test_table_with_header_row() {
        let row = |tag: &str, a: &str, b: &str| {
            el(
                "tr",
                vec![el(tag, vec![Node::text(a)]), el(tag, vec![Node::text(b)])],
            )
        };
        let table = el(
            "table",
            vec![el("tbody", vec![row("th", "A", "B"), row("td", "1", "2")])],
        );
        let markdown = convert(&[table], &TagRules::new());
        assert!(markdown.starts_with("| A   | B   |"), "{markdown}");
        assert!(markdown.ends_with("| 1   | 2   |"), "{markdown}");
    }
}
