// ABOUTME: DOM representation and traversal utilities for captured selections.
// ABOUTME: Provides the fragment type, selector cascades, style handling and serialization.

//! DOM utilities for captured content.
//!
//! This module provides the arena-backed [`ContentFragment`], cached selector
//! lookups with first-match cascades, inline style parsing, and the rewrite
//! serializer every transforming stage is built on.

pub mod fragment;
pub mod select;
pub mod serialize;
pub mod style;

pub use fragment::ContentFragment;

/// Tags treated as block-level when an unsupported element is replaced.
pub const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "caption",
    "details",
    "dd",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "summary",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
];

pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}
