// ABOUTME: Tag canonicalizer mapping every element onto the destination's tag vocabulary.
// ABOUTME: Synonyms are renamed, unknown tags become div/span, images keep a minimal attribute set.

use scraper::ElementRef;

use crate::dom::is_block_tag;
use crate::dom::serialize::{Action, Rewrite};
use crate::dom::ContentFragment;

/// Tags the destination renders.
pub const SUPPORTED_TAGS: &[&str] = &[
    "p", "br", "strong", "em", "u", "del", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "a",
    "code", "pre", "blockquote",
];

/// Generic containers used for anything outside the vocabulary.
pub const GENERIC_BLOCK: &str = "div";
pub const GENERIC_INLINE: &str = "span";

/// Synonym tags renamed to their canonical form.
pub const TAG_SYNONYMS: &[(&str, &str)] = &[("b", "strong"), ("i", "em"), ("s", "del"), ("strike", "del")];

/// Dropped together with their content.
pub const UNSAFE_TAGS: &[&str] = &["script", "style", "link", "meta", "title", "noscript"];

pub const IMAGE_ATTRS: &[&str] = &["src", "alt", "width", "height"];

/// Whether `tag` may appear in canonicalized output.
pub fn is_canonical_tag(tag: &str) -> bool {
    SUPPORTED_TAGS.contains(&tag) || tag == GENERIC_BLOCK || tag == GENERIC_INLINE || tag == "img"
}

/// Destination tag for a source tag name.
pub fn map_tag(tag: &str) -> &'static str {
    let tag_lower = tag.to_ascii_lowercase();
    if let Some((_, to)) = TAG_SYNONYMS.iter().find(|(from, _)| *from == tag_lower) {
        return *to;
    }
    if let Some(supported) = SUPPORTED_TAGS.iter().find(|t| **t == tag_lower) {
        return *supported;
    }
    if tag_lower == "img" {
        return "img";
    }
    if is_block_tag(&tag_lower) {
        GENERIC_BLOCK
    } else {
        GENERIC_INLINE
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Canonicalizer {
    /// Keep `style` attributes that survived cleanup.
    pub keep_styles: bool,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self { keep_styles: true }
    }
}

impl Canonicalizer {
    pub fn new(keep_styles: bool) -> Self {
        Self { keep_styles }
    }

    pub fn canonicalize(&self, fragment: &ContentFragment) -> ContentFragment {
        fragment.rewrite(self)
    }
}

impl Rewrite for Canonicalizer {
    fn element(&self, el: ElementRef<'_>) -> Action {
        let name = el.value().name();
        if UNSAFE_TAGS.contains(&name) {
            return Action::Drop;
        }
        let tag = map_tag(name);
        let attrs = el
            .value()
            .attrs()
            .filter(|(k, _)| match tag {
                "img" => IMAGE_ATTRS.contains(k),
                "a" => *k == "href" || (self.keep_styles && *k == "style"),
                _ => self.keep_styles && *k == "style",
            })
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Action::Emit {
            tag: tag.to_string(),
            attrs,
        }
    }
}

/// Canonicalize keeping surviving styles.
pub fn canonicalize(fragment: &ContentFragment) -> ContentFragment {
    Canonicalizer::default().canonicalize(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(html: &str) -> String {
        canonicalize(&ContentFragment::parse(html)).to_html()
    }

    #[test]
    fn renames_synonyms() {
        assert_eq!(
            run("<p><b>b</b><i>i</i><s>s</s><strike>k</strike></p>"),
            "<p><strong>b</strong><em>i</em><del>s</del><del>k</del></p>"
        );
    }

    #[test]
    fn unknown_tags_become_generic_containers() {
        assert_eq!(
            run("<section><mark>m</mark><h7>x</h7></section>"),
            "<div><span>m</span><span>x</span></div>"
        );
    }

    #[test]
    fn tables_flatten_to_blocks() {
        assert_eq!(
            run("<table><tr><td>a</td></tr></table>"),
            "<div><div><div><div>a</div></div></div></div>"
        );
    }

    #[test]
    fn images_keep_minimal_attributes() {
        assert_eq!(
            run(r#"<img src="a.png" alt="a" width="10" height="5" class="c" loading="lazy">"#),
            r#"<img alt="a" height="5" src="a.png" width="10" />"#
        );
    }

    #[test]
    fn links_keep_only_href() {
        assert_eq!(
            run(r#"<a href="https://x.test" target="_blank" rel="noopener">x</a>"#),
            r#"<a href="https://x.test">x</a>"#
        );
    }

    #[test]
    fn unsafe_tags_are_dropped() {
        assert_eq!(run("<p>a<script>alert(1)</script><style>p{}</style>b</p>"), "<p>ab</p>");
    }

    #[test]
    fn styles_follow_option() {
        let frag = ContentFragment::parse(r#"<span style="color: red">r</span>"#);
        assert_eq!(canonicalize(&frag).to_html(), r#"<span style="color: red">r</span>"#);
        assert_eq!(Canonicalizer::new(false).canonicalize(&frag).to_html(), "<span>r</span>");
    }

    #[test]
    fn output_stays_in_vocabulary() {
        let out = canonicalize(&ContentFragment::parse(
            "<article><header>h</header><figure><img src=x><figcaption>c</figcaption></figure><kbd>k</kbd><b>b</b></article>",
        ));
        for el in out.select("*") {
            assert!(is_canonical_tag(el.value().name()), "{}", el.value().name());
        }
    }
}
