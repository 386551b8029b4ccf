// ABOUTME: Output assembler producing the HTML, plain-text and RTF artifacts of a copy.
// ABOUTME: Collapses whitespace, drops empty containers and adds compatibility styles.

//! Output assembly.
//!
//! The canonical fragment is serialized through a final polish pass. Text
//! for `text/plain` is always the selection's own text serialization. When
//! the selection carries no formatting, or format preservation is off, the
//! HTML is the minimal paragraph wrapper from [`text::plain_wrapper`].

pub mod rtf;
pub mod text;

use std::borrow::Cow;

use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Node};
use serde::Serialize;
use tracing::debug;

use crate::analyze::FormatDescriptor;
use crate::dom::is_block_tag;
use crate::dom::serialize::{rewrite_children, Action, Rewrite};
use crate::dom::style::StyleDecls;
use crate::dom::ContentFragment;

pub use text::{html_to_text, plain_wrapper};

/// Elements removed when they hold no text and no void content.
const REMOVABLE_WHEN_EMPTY: &[&str] = &["div", "span", "p", "strong", "em", "u", "del"];

/// Elements whose presence keeps a container alive.
const CONTENT_ELEMENTS: &[&str] = &["br", "hr", "img", "input"];

pub const INLINE_CODE_STYLE: &str =
    "font-family: monospace; background-color: #f5f5f5; padding: 2px 4px; border-radius: 3px";
pub const PRE_STYLE: &str =
    "font-family: monospace; background-color: #f5f5f5; padding: 10px; border-radius: 5px; white-space: pre-wrap";
pub const BLOCKQUOTE_STYLE: &str =
    "border-left: 4px solid #ddd; padding-left: 16px; margin: 16px 0; font-style: italic";

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\r\n\x0C]+").unwrap());

/// Artifacts written to the clipboard for the rich-text path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assembled {
    pub html: String,
    pub plain_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtf: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Assembler {
    pub preserve_format: bool,
}

impl Default for Assembler {
    fn default() -> Self {
        Self {
            preserve_format: true,
        }
    }
}

impl Assembler {
    pub fn new(preserve_format: bool) -> Self {
        Self { preserve_format }
    }

    pub fn assemble(
        &self,
        fragment: &ContentFragment,
        descriptor: &FormatDescriptor,
        plain_text: &str,
    ) -> Assembled {
        let rich = descriptor.has_formatting && self.preserve_format;
        let html = if rich {
            let polished = polish(fragment);
            if polished.trim().is_empty() {
                debug!("polished html empty, using plain wrapper");
                plain_wrapper(plain_text)
            } else {
                polished
            }
        } else {
            plain_wrapper(plain_text)
        };
        let rtf = rich.then(|| rtf::to_rtf(plain_text, descriptor));
        debug!(rich, html_bytes = html.len(), "assembled output");
        Assembled {
            html,
            plain_text: plain_text.to_string(),
            rtf,
        }
    }
}

/// Serialize a canonical fragment with whitespace collapsing, empty-element
/// removal and compatibility styles.
pub fn polish(fragment: &ContentFragment) -> String {
    rewrite_children(*fragment.root(), &Polish)
}

struct Polish;

impl Rewrite for Polish {
    fn element(&self, el: ElementRef<'_>) -> Action {
        let name = el.value().name();
        if REMOVABLE_WHEN_EMPTY.contains(&name) && is_empty(el) {
            return Action::Drop;
        }
        let extra = match name {
            "code" if !inside_pre(el) => Some(INLINE_CODE_STYLE),
            "pre" => Some(PRE_STYLE),
            "blockquote" => Some(BLOCKQUOTE_STYLE),
            _ => None,
        };
        let Some(extra) = extra else {
            return Action::Keep;
        };
        let style = StyleDecls::parse(el.value().attr("style").unwrap_or(""))
            .merge(&StyleDecls::parse(extra))
            .to_string();
        let mut attrs: Vec<(String, String)> = el
            .value()
            .attrs()
            .filter(|(k, _)| *k != "style")
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        attrs.push(("style".to_string(), style));
        Action::Emit {
            tag: name.to_string(),
            attrs,
        }
    }

    fn text<'t>(&self, node: NodeRef<'t, Node>, text: &'t str, in_pre: bool) -> Cow<'t, str> {
        if in_pre {
            return Cow::Borrowed(text);
        }
        if text.trim().is_empty() && touches_block(node) {
            return Cow::Borrowed("");
        }
        WHITESPACE_RUN.replace_all(text, " ")
    }
}

fn is_empty(el: ElementRef<'_>) -> bool {
    let has_content = el.descendants().skip(1).any(|n| match n.value() {
        Node::Text(t) => !t.trim().is_empty(),
        Node::Element(e) => CONTENT_ELEMENTS.contains(&e.name()),
        _ => false,
    });
    !has_content
}

fn inside_pre(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .any(|a| a.value().as_element().is_some_and(|e| e.name() == "pre"))
}

fn is_block_node(node: Option<NodeRef<'_, Node>>) -> bool {
    node.and_then(|n| n.value().as_element().map(|e| is_block_tag(e.name())))
        .unwrap_or(false)
}

/// Whitespace text sitting between block boundaries carries no meaning.
fn touches_block(node: NodeRef<'_, Node>) -> bool {
    let parent_is_block = node
        .parent()
        .and_then(|p| p.value().as_element().map(|e| is_block_tag(e.name()) || e.name() == "html"))
        .unwrap_or(true);
    let prev = node.prev_sibling();
    let next = node.next_sibling();
    is_block_node(prev)
        || is_block_node(next)
        || (prev.is_none() && parent_is_block)
        || (next.is_none() && parent_is_block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::analyze;
    use pretty_assertions::assert_eq;

    fn polished(html: &str) -> String {
        polish(&ContentFragment::parse(html))
    }

    #[test]
    fn collapses_whitespace_outside_pre() {
        assert_eq!(
            polished("<p>a   b\n\tc</p><pre>x   y\n z</pre>"),
            format!("<p>a b c</p><pre style=\"{}\">x   y\n z</pre>", PRE_STYLE)
        );
    }

    #[test]
    fn drops_whitespace_between_blocks() {
        assert_eq!(polished("<div>\n  <p>a</p>\n  <p>b</p>\n</div>"), "<div><p>a</p><p>b</p></div>");
    }

    #[test]
    fn keeps_inline_spacing() {
        assert_eq!(
            polished("<p><strong>a</strong> <em>b</em></p>"),
            "<p><strong>a</strong> <em>b</em></p>"
        );
    }

    #[test]
    fn removes_empty_containers_but_not_breaks() {
        assert_eq!(
            polished("<p>a</p><div><span> </span></div><p><br /></p><strong></strong><p><img src=\"x.png\" /></p>"),
            "<p>a</p><p><br /></p><p><img src=\"x.png\" /></p>"
        );
    }

    #[test]
    fn compatibility_styles_are_idempotent() {
        let once = polished("<p><code>x</code></p><blockquote>q</blockquote>");
        let twice = polish(&ContentFragment::parse(&once));
        assert_eq!(twice, once);
        assert!(once.contains(&format!("<code style=\"{}\">", INLINE_CODE_STYLE)));
        assert!(once.contains(&format!("<blockquote style=\"{}\">", BLOCKQUOTE_STYLE)));
    }

    #[test]
    fn code_inside_pre_keeps_block_styling_only() {
        let out = polished("<pre><code>a</code></pre>");
        assert!(out.contains("<code>a</code>"));
    }

    #[test]
    fn unformatted_text_uses_wrapper() {
        let frag = ContentFragment::parse("hello\nworld");
        let d = analyze(&frag);
        let out = Assembler::default().assemble(&frag, &d, "hello\nworld");
        assert_eq!(out.html, "<p>hello</p><p>world</p>");
        assert_eq!(out.plain_text, "hello\nworld");
        assert!(out.rtf.is_none());
    }

    #[test]
    fn formatted_text_gets_rtf() {
        let frag = ContentFragment::parse("<p><strong>bold</strong></p>");
        let d = analyze(&frag);
        let out = Assembler::default().assemble(&frag, &d, "bold");
        assert_eq!(out.html, "<p><strong>bold</strong></p>");
        assert!(out.rtf.unwrap().contains(r"{\b bold}"));
    }

    #[test]
    fn preserve_format_off_uses_wrapper() {
        let frag = ContentFragment::parse("<p><strong>bold</strong></p>");
        let d = analyze(&frag);
        let out = Assembler::new(false).assemble(&frag, &d, "bold");
        assert_eq!(out.html, "<p>bold</p>");
        assert!(out.rtf.is_none());
    }

    #[test]
    fn empty_polish_falls_back_to_wrapper() {
        let frag = ContentFragment::parse("<strong> </strong>");
        let d = analyze(&frag);
        assert!(d.has_formatting);
        let out = Assembler::default().assemble(&frag, &d, " ");
        assert_eq!(out.html, "<p> </p>");
    }
}
