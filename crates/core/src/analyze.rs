// ABOUTME: Structure analyzer producing a FormatDescriptor for a captured fragment.
// ABOUTME: Counts selector matches per style tag and detects inline colour declarations.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::dom::ContentFragment;

/// Rich-text features recognised in a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleTag {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Link,
    List,
    Table,
    Code,
    Color,
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StyleTag::Bold => "bold",
            StyleTag::Italic => "italic",
            StyleTag::Underline => "underline",
            StyleTag::Strikethrough => "strikethrough",
            StyleTag::Link => "link",
            StyleTag::List => "list",
            StyleTag::Table => "table",
            StyleTag::Code => "code",
            StyleTag::Color => "color",
        };
        write!(f, "{}", s)
    }
}

/// Selector probes per style tag. Editor markers are included because the
/// analyzer sees the fragment before any cleanup.
const FORMAT_PROBES: &[(&str, StyleTag)] = &[
    (
        r#"strong, b, [style*="font-weight: bold"], [style*="font-weight:bold"], [style*="font-weight: 700"], [style*="font-weight:700"], .lark-text-bold, [data-type="bold"]"#,
        StyleTag::Bold,
    ),
    (
        r#"em, i, [style*="font-style: italic"], [style*="font-style:italic"], .lark-text-italic, [data-type="italic"]"#,
        StyleTag::Italic,
    ),
    (
        r#"u, [style*="text-decoration: underline"], [style*="text-decoration:underline"], .lark-text-underline, [data-type="underline"]"#,
        StyleTag::Underline,
    ),
    (
        r#"s, strike, del, [style*="text-decoration: line-through"], [style*="text-decoration:line-through"], .lark-text-strikethrough, [data-type="strikethrough"]"#,
        StyleTag::Strikethrough,
    ),
    (r#"a[href], .lark-link, [data-type="link"]"#, StyleTag::Link),
    (
        r#"ul, ol, .lark-list, [data-type="list"], .doc-list, .lark-doc-list, [data-list-type]"#,
        StyleTag::List,
    ),
    (
        r#"table, .lark-table, [data-type="table"], .doc-table"#,
        StyleTag::Table,
    ),
    (
        r#"code, pre, .lark-text-code, [data-type="code"], [data-type="code-block"], .lark-code-block"#,
        StyleTag::Code,
    ),
];

/// Structural elements that make a selection worth the rich path without
/// adding a style tag of their own.
const STRUCTURE_PROBE: &str = r#"h1, h2, h3, h4, h5, h6, [data-type="heading"], .lark-heading, .doc-heading, li, tr, td"#;

/// Summary of the rich-text features present in a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDescriptor {
    pub has_formatting: bool,
    pub preserved_styles: BTreeSet<StyleTag>,
    pub element_counts: BTreeMap<StyleTag, usize>,
}

impl FormatDescriptor {
    pub fn has(&self, tag: StyleTag) -> bool {
        self.preserved_styles.contains(&tag)
    }

    fn record(&mut self, tag: StyleTag, count: usize) {
        if count == 0 {
            return;
        }
        self.has_formatting = true;
        self.preserved_styles.insert(tag);
        *self.element_counts.entry(tag).or_insert(0) += count;
    }
}

/// Inspect a fragment for formatting. Read-only.
pub fn analyze(fragment: &ContentFragment) -> FormatDescriptor {
    let mut descriptor = FormatDescriptor::default();

    for (css, tag) in FORMAT_PROBES {
        descriptor.record(*tag, fragment.count(css));
    }
    if fragment.count(STRUCTURE_PROBE) > 0 {
        descriptor.has_formatting = true;
    }

    let coloured = fragment
        .select("[style]")
        .into_iter()
        .filter(|el| {
            let style = el.value().attr("style").unwrap_or("").to_ascii_lowercase();
            style.contains("color:") || style.contains("color :") || style.contains("background")
        })
        .count();
    descriptor.record(StyleTag::Color, coloured);

    debug!(
        has_formatting = descriptor.has_formatting,
        styles = ?descriptor.preserved_styles,
        "analyzed fragment"
    );
    descriptor
}
