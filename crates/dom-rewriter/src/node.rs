//! Owned DOM tree handed from the HTML5 parser to the converter.
//!
//! Only the node kinds that matter for Markdown survive: elements, text and
//! comments. Tag and attribute names are stored lowercase.

use crate::utilities::is_void;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn text(content: &str) -> Self {
        Node::Text(content.to_string())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                for child in &element.children {
                    child.push_text(out);
                }
            }
            Node::Comment(_) => {}
        }
    }

    /// Serialize back to HTML (used by keep rules)
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.push_html(&mut out, false);
        out
    }

    fn push_html(&self, out: &mut String, raw_text: bool) {
        match self {
            Node::Text(text) if raw_text => out.push_str(text),
            Node::Text(text) => out.push_str(&escape_html_text(text)),
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            Node::Element(element) => element.push_html(out),
        }
    }
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs
            .push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.push_text(&mut out);
        }
        out
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.push_html(&mut out);
        out
    }

    fn push_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            if !value.is_empty() {
                out.push_str("=\"");
                out.push_str(&escape_html_attr(value));
                out.push('"');
            }
        }
        out.push('>');

        if is_void(&self.tag) {
            return;
        }

        let raw_text = matches!(self.tag.as_str(), "script" | "style");
        for child in &self.children {
            child.push_html(out, raw_text);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn escape_html_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_html_attr(s: &str) -> String {
    escape_html_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_are_case_insensitive() {
        let a = Element::new("A").with_attr("HREF", "https://example.com");
        assert_eq!(a.tag, "a");
        assert_eq!(a.attr("href"), Some("https://example.com"));
        assert_eq!(a.attr("title"), None);
    }

    #[test]
    fn test_text_content_skips_comments() {
        let div = Element::new("div")
            .with_child(Node::text("Hello "))
            .with_child(Node::Comment("hidden".into()))
            .with_child(Node::Element(
                Element::new("span").with_child(Node::text("World")),
            ));
        assert_eq!(div.text_content(), "Hello World");
    }

    #[test]
    fn test_outer_html_escapes_text_and_attrs() {
        let a = Element::new("a")
            .with_attr("title", "\"quoted\"")
            .with_child(Node::text("1 < 2 & 3"));
        assert_eq!(
            a.outer_html(),
            "<a title=\"&quot;quoted&quot;\">1 &lt; 2 &amp; 3</a>"
        );
    }

    #[test]
    fn test_void_element_html() {
        let img = Element::new("img").with_attr("src", "test.png").with_attr("alt", "");
        assert_eq!(img.outer_html(), "<img src=\"test.png\" alt>");
    }
}
