// ABOUTME: Plain-text helpers: the minimal HTML wrapper for unformatted text and a block-aware text reader.
// ABOUTME: For text without list markers the wrapper re-reads to exactly the original text.

use ego_tree::NodeRef;
use scraper::{Html, Node};

use crate::dom::is_block_tag;
use crate::dom::serialize::escape_text;
use crate::normalize::lists::{marker_kind, strip_marker};

/// Wrap plain text as minimal HTML.
///
/// Each non-empty line becomes a `<p>`, each empty line a `<br />`, and runs of
/// lines with the same list marker family become an `ol`/`ul` with the markers
/// stripped. Never returns an empty string.
pub fn plain_wrapper(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();
    let mut out = String::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if let Some(kind) = marker_kind(line) {
            let tag = kind.list_tag();
            out.push('<');
            out.push_str(tag);
            out.push('>');
            while i < lines.len() && marker_kind(lines[i]) == Some(kind) {
                out.push_str("<li>");
                out.push_str(&escape_text(strip_marker(lines[i])));
                out.push_str("</li>");
                i += 1;
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
            continue;
        }
        if line.is_empty() {
            out.push_str("<br />");
        } else {
            out.push_str("<p>");
            out.push_str(&escape_text(line));
            out.push_str("</p>");
        }
        i += 1;
    }
    out
}

/// Read HTML back as text: block boundaries and `br` become newlines.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_fragment(html);
    let mut out = String::new();
    for child in doc.root_element().children() {
        walk(child, &mut out);
    }
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

fn walk(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(el) => {
            let name = el.name();
            if name == "br" {
                out.push('\n');
                return;
            }
            if matches!(name, "script" | "style") {
                return;
            }
            let block = is_block_tag(name);
            if block && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            for child in node.children() {
                walk(child, out);
            }
            if block && !out.ends_with('\n') {
                out.push('\n');
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wraps_lines_and_blank_lines() {
        assert_eq!(plain_wrapper("a\n\nb"), "<p>a</p><br /><p>b</p>");
    }

    #[test]
    fn wraps_marker_lines_as_lists() {
        assert_eq!(
            plain_wrapper("1. first\n2. second"),
            "<ol><li>first</li><li>second</li></ol>"
        );
        assert_eq!(
            plain_wrapper("intro\n- a\n- b\nend"),
            "<p>intro</p><ul><li>a</li><li>b</li></ul><p>end</p>"
        );
    }

    #[test]
    fn wrapper_is_never_empty() {
        assert_eq!(plain_wrapper(""), "<br />");
    }

    #[test]
    fn text_round_trips_through_wrapper() {
        for text in [
            "",
            "a",
            "a\n",
            "\na",
            "a\n\nb",
            "  indented\nx < y & z",
            "line one\nline two\n\n\nlast",
        ] {
            assert_eq!(html_to_text(&plain_wrapper(text)), text, "{:?}", text);
        }
    }

    #[test]
    fn crlf_lines_drop_carriage_returns() {
        assert_eq!(plain_wrapper("a\r\nb"), "<p>a</p><p>b</p>");
    }

    #[test]
    fn block_aware_reading() {
        assert_eq!(
            html_to_text("<div>a<span>b</span></div><ul><li>c</li><li>d</li></ul>tail"),
            "ab\nc\nd\ntail"
        );
    }
}
