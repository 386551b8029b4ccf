// ABOUTME: Heading, inline-mark and code-block marker tables for the normalizer.
// ABOUTME: Maps editor markers to canonical tags and reads heading levels and link targets.

use scraper::ElementRef;

use crate::dom::select;

pub const CODE_BLOCK_SELECTORS: &[&str] = &[
    r#"[data-type="code-block"]"#,
    ".lark-code-block",
    ".doc-code-block",
];

pub const HEADING_SELECTORS: &[&str] = &[r#"[data-type="heading"]"#, ".lark-heading", ".doc-heading"];

/// Inline editor markers and the canonical tag each becomes.
pub const INLINE_MARKS: &[(&str, &str)] = &[
    (r#"[data-type="bold"], .lark-text-bold"#, "strong"),
    (r#"[data-type="italic"], .lark-text-italic"#, "em"),
    (r#"[data-type="underline"], .lark-text-underline"#, "u"),
    (
        r#"[data-type="strikethrough"], .lark-text-strikethrough"#,
        "del",
    ),
    (r#"[data-type="code"], .lark-text-code, .inline-code"#, "code"),
    (r#"[data-type="link"], .lark-link"#, "a"),
];

pub fn is_code_block(el: &ElementRef) -> bool {
    select::first_matching(el, CODE_BLOCK_SELECTORS).is_some()
}

pub fn is_heading_marker(el: &ElementRef) -> bool {
    select::first_matching(el, HEADING_SELECTORS).is_some()
}

/// Heading level from `data-level` or `data-heading-level`, default 1, clamped to 1..=6.
pub fn heading_level(el: &ElementRef) -> u8 {
    let value = el.value();
    let raw = value
        .attr("data-level")
        .or_else(|| value.attr("data-heading-level"));
    let level = raw
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(1);
    level.clamp(1, 6) as u8
}

/// Canonical tag for an inline editor marker.
pub fn inline_mark(el: &ElementRef) -> Option<&'static str> {
    INLINE_MARKS
        .iter()
        .find(|(css, _)| select::matches(el, css))
        .map(|(_, tag)| *tag)
}

/// Link target of an editor link marker.
pub fn link_target<'a>(el: &ElementRef<'a>) -> Option<&'a str> {
    let value = el.value();
    ["href", "data-href", "data-url"]
        .iter()
        .filter_map(|name| value.attr(name))
        .find(|v| !v.trim().is_empty())
}
