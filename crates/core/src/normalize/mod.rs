// ABOUTME: Structural normalizer turning editor pseudo-structures into canonical HTML.
// ABOUTME: Rebuilds lists, tables, headings, code blocks and inline marks in one tree walk.

//! Structural normalization.
//!
//! The normalizer walks the fragment once and writes a fresh HTML string.
//! Each element is checked in a fixed order: code block, table, list
//! container, heading marker, inline mark. The first hit decides how the
//! element is rebuilt; anything else is copied through. Runs of sibling
//! paragraphs that start with list markers are folded into a list in place.

pub mod lists;
pub mod marks;
pub mod tables;

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};
use tracing::debug;

use crate::dom::serialize::{escape_text, write_close_tag, write_open_tag};
use crate::dom::style::emphasis_subset;
use crate::dom::ContentFragment;

use lists::MarkerKind;

/// Options for [`Normalizer`].
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    /// Copy the emphasis style subset onto swapped tags.
    pub copy_styles: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self { copy_styles: true }
    }
}

impl Normalizer {
    pub fn new(copy_styles: bool) -> Self {
        Self { copy_styles }
    }

    pub fn normalize(&self, fragment: &ContentFragment) -> ContentFragment {
        let mut walk = Walk {
            opts: *self,
            out: String::new(),
            strip_marker: false,
        };
        walk.children(*fragment.root());
        debug!(bytes = walk.out.len(), "normalized fragment");
        ContentFragment::parse(&walk.out)
    }
}

/// Normalize with style copying enabled.
pub fn normalize(fragment: &ContentFragment) -> ContentFragment {
    Normalizer::default().normalize(fragment)
}

struct Walk {
    opts: Normalizer,
    out: String,
    /// Strip a list marker from the next non-blank text node.
    strip_marker: bool,
}

impl Walk {
    fn children(&mut self, parent: NodeRef<'_, Node>) {
        let kids: Vec<NodeRef<'_, Node>> = parent.children().collect();
        let mut i = 0;
        while i < kids.len() {
            if let Some((kind, run, next)) = marker_run(&kids, i) {
                self.marker_list(kind, &run);
                i = next;
                continue;
            }
            self.node(kids[i]);
            i += 1;
        }
    }

    fn node(&mut self, node: NodeRef<'_, Node>) {
        match node.value() {
            Node::Text(text) => self.text(text),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(node) {
                    self.element(el);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.strip_marker && !text.trim().is_empty() {
            self.strip_marker = false;
            self.out.push_str(&escape_text(lists::strip_marker(text)));
            return;
        }
        self.out.push_str(&escape_text(text));
    }

    fn element(&mut self, el: ElementRef<'_>) {
        let name = el.value().name();

        if marks::is_code_block(&el) {
            return self.code_block(el);
        }
        if name == "table" {
            return self.genuine_table(el);
        }
        if tables::is_editor_table(&el) {
            return self.editor_table(el);
        }
        if matches!(name, "ul" | "ol") {
            return self.copy_element(el);
        }
        if lists::is_list_container(&el) && self.editor_list(el) {
            return;
        }
        if marks::is_heading_marker(&el) {
            let tag = format!("h{}", marks::heading_level(&el));
            return self.swap(el, &tag, Vec::new());
        }
        if let Some(tag) = marks::inline_mark(&el) {
            let mut attrs = Vec::new();
            if tag == "a" {
                if let Some(href) = marks::link_target(&el) {
                    attrs.push(("href".to_string(), href.to_string()));
                }
            }
            return self.swap(el, tag, attrs);
        }
        match name {
            "li" => self.list_item(el, "li", Vec::new()),
            "td" | "th" => {
                let style = tables::merged_style(el.value().attr("style"), tables::CELL_STYLE);
                let attrs = replace_attr(el, "style", style);
                self.open(name, &attrs);
                self.children(*el);
                write_close_tag(&mut self.out, name);
            }
            _ => self.copy_element(el),
        }
    }

    fn copy_element(&mut self, el: ElementRef<'_>) {
        let name = el.value().name();
        let attrs: Vec<(String, String)> = el
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.open(name, &attrs);
        self.children(*el);
        write_close_tag(&mut self.out, name);
    }

    /// Emit `el`'s content under `tag`, carrying over emphasis styles.
    fn swap(&mut self, el: ElementRef<'_>, tag: &str, mut attrs: Vec<(String, String)>) {
        if self.opts.copy_styles {
            let styles = emphasis_subset(el.value().attr("style"));
            if !styles.is_empty() {
                attrs.push(("style".to_string(), styles.to_string()));
            }
        }
        self.open(tag, &attrs);
        self.children(*el);
        write_close_tag(&mut self.out, tag);
    }

    fn code_block(&mut self, el: ElementRef<'_>) {
        let text: String = el.text().collect();
        self.out.push_str("<pre><code>");
        self.out.push_str(&escape_text(&text));
        self.out.push_str("</code></pre>");
    }

    fn genuine_table(&mut self, el: ElementRef<'_>) {
        let style = tables::merged_style(el.value().attr("style"), tables::TABLE_STYLE);
        let attrs = replace_attr(el, "style", style);
        self.open("table", &attrs);
        self.children(*el);
        write_close_tag(&mut self.out, "table");
    }

    fn editor_table(&mut self, el: ElementRef<'_>) {
        let grid = tables::find_grid(el);
        if grid.is_empty() {
            debug!("table marker without rows, copied through");
            return self.copy_element(el);
        }
        let table_attrs = vec![("style".to_string(), tables::TABLE_STYLE.to_string())];
        let cell_attrs = vec![("style".to_string(), tables::CELL_STYLE.to_string())];
        self.open("table", &table_attrs);
        self.out.push_str("<tbody>");
        for row in &grid {
            self.out.push_str("<tr>");
            for cell in row {
                self.open("td", &cell_attrs);
                self.children(**cell);
                self.out.push_str("</td>");
            }
            self.out.push_str("</tr>");
        }
        self.out.push_str("</tbody>");
        write_close_tag(&mut self.out, "table");
    }

    /// Rebuild an editor list container. Returns false when no items were found.
    fn editor_list(&mut self, el: ElementRef<'_>) -> bool {
        let Some(items) = lists::find_items(el) else {
            return false;
        };
        let tag = if lists::is_ordered(&el, &items) { "ol" } else { "ul" };
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push('>');
        for item in &items {
            self.list_item(*item, "li", Vec::new());
        }
        write_close_tag(&mut self.out, tag);
        true
    }

    fn list_item(&mut self, item: ElementRef<'_>, tag: &str, attrs: Vec<(String, String)>) {
        self.open(tag, &attrs);
        self.strip_marker = true;
        self.children(*item);
        self.strip_marker = false;
        write_close_tag(&mut self.out, tag);
    }

    fn marker_list(&mut self, kind: MarkerKind, run: &[ElementRef<'_>]) {
        let tag = kind.list_tag();
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push('>');
        for item in run {
            self.list_item(*item, "li", Vec::new());
        }
        write_close_tag(&mut self.out, tag);
    }

    fn open(&mut self, tag: &str, attrs: &[(String, String)]) {
        write_open_tag(
            &mut self.out,
            tag,
            attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
    }
}

/// Attributes of `el` with `name` replaced by `value`.
fn replace_attr(el: ElementRef<'_>, name: &str, value: String) -> Vec<(String, String)> {
    let mut attrs: Vec<(String, String)> = el
        .value()
        .attrs()
        .filter(|(k, _)| *k != name)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    attrs.push((name.to_string(), value));
    attrs
}

/// A run of sibling marker paragraphs starting at `start`, all of one marker kind.
///
/// Whitespace-only text between the paragraphs is absorbed. Returns the kind,
/// the paragraphs and the index just past the run.
fn marker_run<'a>(
    kids: &[NodeRef<'a, Node>],
    start: usize,
) -> Option<(MarkerKind, Vec<ElementRef<'a>>, usize)> {
    let first = ElementRef::wrap(kids[start]).filter(is_plain_marker_block)?;
    let kind = lists::marker_kind(&lists::element_text(&first))?;
    let mut run = vec![first];
    let mut next = start + 1;
    let mut i = start + 1;
    while i < kids.len() {
        let node = kids[i];
        if let Node::Text(t) = node.value() {
            if t.trim().is_empty() {
                i += 1;
                continue;
            }
            break;
        }
        match ElementRef::wrap(node).filter(is_plain_marker_block) {
            Some(el) if lists::marker_kind(&lists::element_text(&el)) == Some(kind) => {
                run.push(el);
                i += 1;
                next = i;
            }
            _ => break,
        }
    }
    Some((kind, run, next))
}

/// Marker paragraph that no other rule claims.
fn is_plain_marker_block(el: &ElementRef<'_>) -> bool {
    lists::is_marker_block(el)
        && !marks::is_code_block(el)
        && !marks::is_heading_marker(el)
        && !tables::is_editor_table(el)
        && !lists::is_list_container(el)
}
