// ABOUTME: HTML serialization helpers and the generic per-element rewrite pass.
// ABOUTME: Stages describe element decisions; the walker emits a fresh HTML string from them.

use std::borrow::Cow;

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};

/// Decision a rewrite pass takes for a single element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Emit the element unchanged and walk its children.
    Keep,
    /// Drop the element and its whole subtree.
    Drop,
    /// Drop the tag but keep walking its children.
    Unwrap,
    /// Emit under a (possibly new) tag with the given attributes, then walk children.
    Emit {
        tag: String,
        attrs: Vec<(String, String)>,
    },
}

/// Per-element rewrite rules applied by [`rewrite_children`].
pub trait Rewrite {
    fn element(&self, el: ElementRef<'_>) -> Action;

    /// Hook for text nodes; `in_pre` is true inside a `pre` element.
    fn text<'t>(&self, node: NodeRef<'t, Node>, text: &'t str, in_pre: bool) -> Cow<'t, str> {
        let _ = (node, in_pre);
        Cow::Borrowed(text)
    }
}

/// Serialize the children of `parent` through `rules`.
pub fn rewrite_children<R: Rewrite + ?Sized>(parent: NodeRef<'_, Node>, rules: &R) -> String {
    let mut out = String::new();
    for child in parent.children() {
        rewrite_node(child, rules, false, &mut out);
    }
    out
}

fn rewrite_node<R: Rewrite + ?Sized>(node: NodeRef<'_, Node>, rules: &R, in_pre: bool, out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            let rendered = rules.text(node, &**text, in_pre);
            out.push_str(&escape_text(&rendered));
        }
        Node::Element(el) => {
            let Some(el_ref) = ElementRef::wrap(node) else {
                return;
            };
            let (tag, mut attrs): (String, Vec<(String, String)>) = match rules.element(el_ref) {
                Action::Drop => return,
                Action::Unwrap => {
                    for child in node.children() {
                        rewrite_node(child, rules, in_pre, out);
                    }
                    return;
                }
                Action::Keep => (
                    el.name().to_string(),
                    el.attrs()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
                Action::Emit { tag, attrs } => (tag, attrs),
            };
            // Attribute storage order is not stable across parses.
            attrs.sort_by(|a, b| a.0.cmp(&b.0));
            let child_in_pre = in_pre || tag == "pre";
            write_open_tag(out, &tag, attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            if is_void_element(&tag) {
                return;
            }
            for child in node.children() {
                rewrite_node(child, rules, child_in_pre, out);
            }
            write_close_tag(out, &tag);
        }
        Node::Comment(_) => {}
        _ => {}
    }
}

/// Write `<tag a="b">`, or `<tag a="b" />` for void elements.
pub fn write_open_tag<'a>(out: &mut String, tag: &str, attrs: impl IntoIterator<Item = (&'a str, &'a str)>) {
    out.push('<');
    out.push_str(tag);
    for (k, v) in attrs {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        out.push_str(&escape_attr(v));
        out.push('"');
    }
    if is_void_element(tag) {
        out.push_str(" />");
    } else {
        out.push('>');
    }
}

pub fn write_close_tag(out: &mut String, tag: &str) {
    if is_void_element(tag) {
        return;
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Serialize the children of a node without changes.
pub fn inner_html(node: NodeRef<'_, Node>) -> String {
    rewrite_children(node, &Identity)
}

struct Identity;

impl Rewrite for Identity {
    fn element(&self, _el: ElementRef<'_>) -> Action {
        Action::Keep
    }
}

/// Escape attribute value
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape text content
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Check if tag is void element
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag.to_lowercase().as_str(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    struct DropSpans;

    impl Rewrite for DropSpans {
        fn element(&self, el: ElementRef<'_>) -> Action {
            match el.value().name() {
                "span" => Action::Drop,
                "b" => Action::Emit {
                    tag: "strong".to_string(),
                    attrs: Vec::new(),
                },
                "font" => Action::Unwrap,
                _ => Action::Keep,
            }
        }
    }

    #[test]
    fn rewrite_applies_actions() {
        let doc = Html::parse_fragment(
            r#"<p id="x">a<span>gone</span><b class="c">bold</b><font>kept</font></p>"#,
        );
        let html = rewrite_children(*doc.root_element(), &DropSpans);
        assert_eq!(html, r#"<p id="x">a<strong>bold</strong>kept</p>"#);
    }

    #[test]
    fn escapes_text_and_attributes() {
        let doc = Html::parse_fragment(r#"<a href="?a=1&amp;b=&quot;2&quot;">1 &lt; 2</a>"#);
        assert_eq!(
            inner_html(*doc.root_element()),
            r#"<a href="?a=1&amp;b=&quot;2&quot;">1 &lt; 2</a>"#
        );
    }

    #[test]
    fn void_elements_self_close() {
        let doc = Html::parse_fragment("<p>a<br>b</p>");
        assert_eq!(inner_html(*doc.root_element()), "<p>a<br />b</p>");
    }
}
