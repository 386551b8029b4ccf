// ABOUTME: Pseudo-list detection: item cascades, ordered detection and marker stripping.
// ABOUTME: Editor list containers and marker-prefixed paragraph runs become ul/ol with li items.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use crate::dom::select::{self, Strategy};

/// Editor list containers.
pub const LIST_CONTAINER_SELECTORS: &[&str] = &[
    ".lark-list",
    r#"[data-type="list"]"#,
    ".doc-list",
    r#"[role="list"]"#,
    ".lark-doc-list",
    "[data-list-type]",
];

/// Editor list items, tried one selector at a time.
pub const LIST_ITEM_SELECTORS: &[&str] = &[
    ".lark-list-item",
    r#"[data-type="list-item"]"#,
    ".doc-list-item",
    r#"[role="listitem"]"#,
    ".lark-doc-list-item",
];

static MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\d+\.|[•·▪▫‣⁃◦\-*+])\s").unwrap());
static MARKER_STRIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\d+\.|[•·▪▫‣⁃◦\-*+])\s+").unwrap());
static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s").unwrap());

/// Marker family of a line or item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Numeric,
    Bullet,
}

impl MarkerKind {
    pub fn list_tag(self) -> &'static str {
        match self {
            MarkerKind::Numeric => "ol",
            MarkerKind::Bullet => "ul",
        }
    }
}

/// Marker family of `text` after trimming leading whitespace.
pub fn marker_kind(text: &str) -> Option<MarkerKind> {
    let text = text.trim_start();
    if NUMERIC.is_match(text) {
        Some(MarkerKind::Numeric)
    } else if MARKER.is_match(text) {
        Some(MarkerKind::Bullet)
    } else {
        None
    }
}

/// Remove a leading list marker. Text without a marker is returned unchanged.
pub fn strip_marker(text: &str) -> &str {
    if marker_kind(text).is_none() {
        return text;
    }
    match MARKER_STRIP.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

pub fn is_list_container(el: &ElementRef) -> bool {
    select::first_matching(el, LIST_CONTAINER_SELECTORS).is_some()
}

/// `div`/`p` element whose text starts with a list marker.
pub fn is_marker_block(el: &ElementRef) -> bool {
    matches!(el.value().name(), "div" | "p") && marker_kind(&element_text(el)).is_some()
}

pub fn element_text(el: &ElementRef) -> String {
    el.text().collect()
}

fn genuine_items<'a>(scope: ElementRef<'a>) -> Option<Vec<ElementRef<'a>>> {
    Some(select::outermost(scope, select::select_all(scope, "li")))
}

fn editor_items<'a>(scope: ElementRef<'a>) -> Option<Vec<ElementRef<'a>>> {
    select::first_selector_match(scope, LIST_ITEM_SELECTORS).map(|found| select::outermost(scope, found))
}

fn marker_children<'a>(scope: ElementRef<'a>) -> Option<Vec<ElementRef<'a>>> {
    Some(
        scope
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "div" && is_marker_block(el))
            .collect(),
    )
}

/// Item lookup cascade: genuine `li`, editor item markers, then marker-prefixed divs.
pub const ITEM_STRATEGIES: &[Strategy] = &[genuine_items, editor_items, marker_children];

pub fn find_items<'a>(container: ElementRef<'a>) -> Option<Vec<ElementRef<'a>>> {
    select::first_some(container, ITEM_STRATEGIES)
}

/// `ordered` as a whole class or a hyphen-delimited part of one.
fn is_ordered_class(class: &str) -> bool {
    class
        .split('-')
        .any(|part| part.eq_ignore_ascii_case("ordered"))
}

/// Whether a list container should render as `ol`.
pub fn is_ordered(container: &ElementRef, items: &[ElementRef]) -> bool {
    let value = container.value();
    if value.name() == "ol" {
        return true;
    }
    if value.classes().any(is_ordered_class) {
        return true;
    }
    if value.attr("data-list-type") == Some("ordered") {
        return true;
    }
    if !select::select_all(*container, r#"[data-list-type="ordered"]"#).is_empty() {
        return true;
    }
    items
        .first()
        .is_some_and(|first| NUMERIC.is_match(element_text(first).trim_start()))
}
