//! HTML parsing support.
//!
//! Parses an HTML string as a body fragment with html5ever's tree builder,
//! which applies the browser error-recovery rules, and copies the result into
//! the owned [`Node`] tree used by the converter.

use scraper::{ElementRef, Html, Node as ScraperNode};

use crate::node::{Element, Node};

/// Parse an HTML fragment into top-level nodes.
///
/// ```rust
/// use dom_rewriter::{parse_html, Node};
///
/// let nodes = parse_html("<p>Unclosed <strong>bold");
/// let p = nodes[0].as_element().unwrap();
/// assert_eq!(p.tag, "p");
/// assert_eq!(p.text_content(), "Unclosed bold");
/// ```
pub fn parse_html(html: &str) -> Vec<Node> {
    let document = Html::parse_fragment(html);
    collect_children(document.root_element(), 0)
}

/// Deepest element kept as structure. Anything nested further is folded into
/// the text of the element at this depth, so walks over the tree stay bounded.
pub const MAX_DEPTH: usize = 256;

/// Elements whose text never renders
const HIDDEN_TAGS: [&str; 5] = ["script", "style", "template", "noscript", "head"];

fn collect_children(element: ElementRef, depth: usize) -> Vec<Node> {
    let mut nodes = Vec::new();

    for child in element.children() {
        match child.value() {
            ScraperNode::Text(text) => nodes.push(Node::Text(text.text.to_string())),
            ScraperNode::Comment(comment) => {
                nodes.push(Node::Comment(comment.comment.to_string()))
            }
            ScraperNode::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    nodes.push(Node::Element(convert_element(child_element, depth + 1)));
                }
            }
            _ => {}
        }
    }

    nodes
}

fn convert_element(element: ElementRef, depth: usize) -> Element {
    let value = element.value();

    let children = if depth < MAX_DEPTH {
        collect_children(element, depth)
    } else {
        let text = flattened_text(element);
        if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::Text(text)]
        }
    };

    Element {
        tag: value.name().to_ascii_lowercase(),
        attrs: value
            .attrs()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
            .collect(),
        children,
    }
}

/// Visible descendant text in document order, without recursion
fn flattened_text(element: ElementRef) -> String {
    let mut text = String::new();
    let mut stack: Vec<_> = element.children().collect();
    stack.reverse();

    while let Some(node) = stack.pop() {
        match node.value() {
            ScraperNode::Text(t) => text.push_str(&t.text),
            ScraperNode::Element(e) if !HIDDEN_TAGS.contains(&e.name()) => {
                let start = stack.len();
                stack.extend(node.children());
                stack[start..].reverse();
            }
            _ => {}
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_html() {
        let nodes = parse_html("<p>Hello World</p>");
        assert_eq!(nodes.len(), 1);
        let p = nodes[0].as_element().unwrap();
        assert_eq!(p.tag, "p");
        assert_eq!(p.text_content(), "Hello World");
    }

    #[test]
    fn test_parse_keeps_comments() {
        let nodes = parse_html("<!-- note -->text");
        assert_eq!(nodes[0], Node::Comment(" note ".into()));
        assert_eq!(nodes[1], Node::text("text"));
    }

    #[test]
    fn test_parse_repairs_misnested_markup() {
        let nodes = parse_html("<b><i>one</b> two</i>");
        let text: String = nodes.iter().map(Node::text_content).collect();
        assert_eq!(text, "one two");
    }

    #[test]
    fn test_parse_decodes_entities() {
        let nodes = parse_html("<p>a &amp; b</p>");
        assert_eq!(nodes[0].text_content(), "a & b");
    }

    fn depth(nodes: &[Node]) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&Node, usize)> = nodes.iter().map(|node| (node, 1)).collect();
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            if let Node::Element(element) = node {
                stack.extend(element.children.iter().map(|child| (child, level + 1)));
            }
        }
        deepest
    }

    #[test]
    fn test_deep_nesting_is_folded() {
        let n = 10_000;
        let html = format!(
            "{}deep<script>hidden()</script> <b>text</b>{}",
            "<div>".repeat(n),
            "</div>".repeat(n)
        );
        let nodes = parse_html(&html);
        assert!(depth(&nodes) <= MAX_DEPTH + 1, "{}", depth(&nodes));

        let text: String = nodes.iter().map(Node::text_content).collect();
        assert_eq!(text, "deep text");
    }

    #[test]
    fn test_shallow_trees_are_untouched() {
        let html = format!("{}<em>x</em>{}", "<span>".repeat(20), "</span>".repeat(20));
        let nodes = parse_html(&html);
        assert_eq!(depth(&nodes), 22);
    }
}
