// ABOUTME: ContentFragment, the detached DOM subtree passed between pipeline stages.
// ABOUTME: Backed by scraper's ego-tree arena; stages read it and return new fragments.

use scraper::{ElementRef, Html, Node};

use super::select;
use super::serialize::{inner_html, rewrite_children, Rewrite};

/// An owned, detached copy of a DOM subtree.
///
/// Nodes are addressed through the `ego_tree` arena (`NodeId`), never through
/// live references. A fragment is never mutated: transforms serialize a
/// rewrite plan and re-parse it into a new fragment.
#[derive(Debug, Clone)]
pub struct ContentFragment {
    html: Html,
}

impl ContentFragment {
    /// Parse an HTML fragment in body context.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_fragment(html),
        }
    }

    /// The synthetic container element whose children are the fragment content.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Elements matching `css`. An invalid selector matches nothing.
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        select::select_all(self.root(), css)
    }

    pub fn count(&self, css: &str) -> usize {
        self.select(css).len()
    }

    /// Serialized content of the fragment.
    pub fn to_html(&self) -> String {
        inner_html(*self.root())
    }

    /// Raw text content of the fragment.
    pub fn text(&self) -> String {
        self.root().text().collect()
    }

    /// Whether the fragment has no elements and no non-whitespace text.
    pub fn is_blank(&self) -> bool {
        !self
            .root()
            .descendants()
            .skip(1)
            .any(|n| matches!(n.value(), Node::Element(_)))
            && self.text().trim().is_empty()
    }

    /// Run a rewrite pass over the fragment and re-parse the result.
    pub fn rewrite<R: Rewrite + ?Sized>(&self, rules: &R) -> ContentFragment {
        ContentFragment::parse(&rewrite_children(*self.root(), rules))
    }
}
