// ABOUTME: Attribute cleaner that strips proprietary editor attributes, classes and styles.
// ABOUTME: Style declarations are reduced to a whitelist plus what normalization adds; the pass is idempotent.

use scraper::ElementRef;

use crate::dom::serialize::{Action, Rewrite};
use crate::dom::style::{survives_cleanup, StyleDecls};
use crate::dom::ContentFragment;

/// Exact attribute names removed from every element.
const STRIPPED_ATTRS: &[&str] = &["contenteditable", "spellcheck", "role", "class"];

/// Attribute name prefixes removed from every element.
const STRIPPED_PREFIXES: &[&str] = &["data-", "aria-"];

#[derive(Debug, Clone, Copy)]
pub struct Cleaner {
    /// Keep the whitelisted subset of `style`; when false `style` is removed outright.
    pub keep_styles: bool,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self { keep_styles: true }
    }
}

impl Cleaner {
    pub fn new(keep_styles: bool) -> Self {
        Self { keep_styles }
    }

    pub fn clean(&self, fragment: &ContentFragment) -> ContentFragment {
        fragment.rewrite(self)
    }

    fn clean_attr(&self, name: &str, value: &str) -> Option<(String, String)> {
        let lower = name.to_ascii_lowercase();
        if STRIPPED_ATTRS.contains(&lower.as_str())
            || STRIPPED_PREFIXES.iter().any(|p| lower.starts_with(p))
        {
            return None;
        }
        if lower == "style" {
            if !self.keep_styles {
                return None;
            }
            let kept = StyleDecls::parse(value).retain(survives_cleanup);
            if kept.is_empty() {
                return None;
            }
            return Some((lower, kept.to_string()));
        }
        Some((name.to_string(), value.to_string()))
    }
}

impl Rewrite for Cleaner {
    fn element(&self, el: ElementRef<'_>) -> Action {
        let attrs = el
            .value()
            .attrs()
            .filter_map(|(k, v)| self.clean_attr(k, v))
            .collect();
        Action::Emit {
            tag: el.value().name().to_string(),
            attrs,
        }
    }
}

/// Clean with the whitelisted style subset preserved.
pub fn clean(fragment: &ContentFragment) -> ContentFragment {
    Cleaner::default().clean(fragment)
}
