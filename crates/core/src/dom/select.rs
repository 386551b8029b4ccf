// ABOUTME: Pre-compiled CSS selector cache and ordered selector cascades.
// ABOUTME: Invalid selectors compile to None and count as "no match" for their strategy.

//! Selector caching and first-match cascades.
//!
//! Editor-specific markup is recognised through lists of selectors tried in
//! priority order. Each entry of a cascade is a strategy; the first strategy
//! that yields at least one element wins and later strategies are never merged
//! into its result.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use tracing::warn;

static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Selector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the result.
///
/// Returns `None` for an invalid selector; the failure is logged once and
/// cached so later lookups stay cheap.
pub fn get_or_compile(css: &str) -> Option<Selector> {
    {
        let cache = SELECTOR_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(err) => {
            warn!(selector = css, error = %err, "invalid selector treated as no match");
            None
        }
    };
    let mut cache = SELECTOR_CACHE.write().unwrap_or_else(|e| e.into_inner());
    if let Some(cached) = cache.get(css) {
        return cached.clone();
    }
    cache.insert(css.to_string(), compiled.clone());
    compiled
}

/// Descendants of `scope` (excluding `scope`) matching `css`. Invalid selectors match nothing.
pub fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match get_or_compile(css) {
        Some(sel) => scope.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Whether `el` itself matches `css`.
pub fn matches(el: &ElementRef, css: &str) -> bool {
    get_or_compile(css).is_some_and(|sel| sel.matches(el))
}

/// Index of the first selector in `selectors` that `el` matches.
pub fn first_matching(el: &ElementRef, selectors: &[&str]) -> Option<usize> {
    selectors.iter().position(|css| matches(el, css))
}

/// A single lookup strategy of a cascade.
pub type Strategy = for<'a> fn(ElementRef<'a>) -> Option<Vec<ElementRef<'a>>>;

/// Runs strategies in order; the first `Some` with at least one element wins.
pub fn first_some<'a>(scope: ElementRef<'a>, strategies: &[Strategy]) -> Option<Vec<ElementRef<'a>>> {
    strategies
        .iter()
        .filter_map(|strategy| strategy(scope))
        .find(|found| !found.is_empty())
}

/// Tries each selector in order and returns the matches of the first one that
/// yields at least one element.
pub fn first_selector_match<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Option<Vec<ElementRef<'a>>> {
    selectors
        .iter()
        .map(|css| select_all(scope, css))
        .find(|found| !found.is_empty())
}

/// Drops matches nested inside another match, relative to `scope`.
pub fn outermost<'a>(scope: ElementRef<'a>, found: Vec<ElementRef<'a>>) -> Vec<ElementRef<'a>> {
    let ids: HashSet<_> = found.iter().map(|el| el.id()).collect();
    found
        .into_iter()
        .filter(|el| {
            el.ancestors()
                .take_while(|a| a.id() != scope.id())
                .all(|a| !ids.contains(&a.id()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn root(doc: &Html) -> ElementRef<'_> {
        doc.root_element()
    }

    #[test]
    fn invalid_selector_is_cached_as_none() {
        assert!(get_or_compile("[[[invalid").is_none());
        assert!(get_or_compile("[[[invalid").is_none());
        assert!(get_or_compile("div.item").is_some());
    }

    #[test]
    fn first_selector_match_stops_at_first_hit() {
        let doc = Html::parse_fragment(r#"<p class="a">1</p><p class="b">2</p><p class="b">3</p>"#);
        let found = first_selector_match(root(&doc), &[".missing", "[[[bad", ".b", ".a"]).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn first_selector_match_none_when_nothing_matches() {
        let doc = Html::parse_fragment("<p>1</p>");
        assert!(first_selector_match(root(&doc), &[".x", "[[[bad"]).is_none());
    }

    #[test]
    fn outermost_skips_nested_matches() {
        let doc = Html::parse_fragment("<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>");
        let r = root(&doc);
        let all = select_all(r, "li");
        assert_eq!(all.len(), 3);
        assert_eq!(outermost(r, all).len(), 2);
    }

    #[test]
    fn first_some_skips_empty_results() {
        fn none<'a>(_: ElementRef<'a>) -> Option<Vec<ElementRef<'a>>> {
            None
        }
        fn empty<'a>(_: ElementRef<'a>) -> Option<Vec<ElementRef<'a>>> {
            Some(Vec::new())
        }
        fn paragraphs<'a>(scope: ElementRef<'a>) -> Option<Vec<ElementRef<'a>>> {
            Some(select_all(scope, "p"))
        }
        let doc = Html::parse_fragment("<p>1</p><p>2</p>");
        let found = first_some(root(&doc), &[none, empty, paragraphs]).unwrap();
        assert_eq!(found.len(), 2);
    }
}
