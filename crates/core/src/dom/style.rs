// ABOUTME: Inline style attribute parsing, filtering and merging.
// ABOUTME: Keeps declaration order stable so serialized styles round-trip unchanged.

use std::fmt;

/// Declarations that survive attribute cleanup.
pub const CLEAN_STYLE_WHITELIST: &[&str] = &[
    "color",
    "background-color",
    "font-weight",
    "font-style",
    "text-decoration",
    "font-size",
    "text-align",
];

/// Declarations the normalizer writes onto rebuilt tables, headings and marks.
/// Cleanup runs after normalization, so these survive it as well.
pub const NORMALIZER_STYLES: &[&str] = &[
    "font-family",
    "border",
    "padding",
    "border-collapse",
    "width",
];

/// Whether `prop` survives attribute cleanup.
pub fn survives_cleanup(prop: &str) -> bool {
    CLEAN_STYLE_WHITELIST.contains(&prop) || NORMALIZER_STYLES.contains(&prop)
}

/// Declarations copied onto an element when its tag is swapped.
pub const EMPHASIS_STYLES: &[&str] = &[
    "font-weight",
    "font-style",
    "text-decoration",
    "color",
    "background-color",
    "font-size",
    "font-family",
];

/// An ordered list of `property: value` declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDecls(Vec<(String, String)>);

impl StyleDecls {
    /// Parse a `style` attribute value. Malformed declarations are skipped.
    pub fn parse(style: &str) -> Self {
        let mut decls: Vec<(String, String)> = Vec::new();
        for part in style.split(';') {
            let Some((prop, value)) = part.split_once(':') else {
                continue;
            };
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim();
            if prop.is_empty() || value.is_empty() {
                continue;
            }
            match decls.iter_mut().find(|(p, _)| *p == prop) {
                Some(existing) => existing.1 = value.to_string(),
                None => decls.push((prop, value.to_string())),
            }
        }
        Self(decls)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, prop: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(p, _)| p == prop)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Keep only the listed properties.
    pub fn retain_only(mut self, allowed: &[&str]) -> Self {
        self.0.retain(|(p, _)| allowed.contains(&p.as_str()));
        self
    }

    /// Keep the properties accepted by `keep`.
    pub fn retain(mut self, keep: impl Fn(&str) -> bool) -> Self {
        self.0.retain(|(p, _)| keep(p));
        self
    }

    /// Set a declaration, replacing any existing value for the property.
    pub fn set(&mut self, prop: &str, value: &str) {
        match self.0.iter_mut().find(|(p, _)| p == prop) {
            Some(existing) => existing.1 = value.to_string(),
            None => self.0.push((prop.to_string(), value.to_string())),
        }
    }

    /// Merge `other` on top of `self`; later values win.
    pub fn merge(mut self, other: &StyleDecls) -> Self {
        for (p, v) in other.iter() {
            self.set(p, v);
        }
        self
    }
}

impl fmt::Display for StyleDecls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(p, v)| format!("{}: {}", p, v))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

/// Whether a declaration carries visible emphasis worth keeping on a swapped tag.
pub fn is_significant(prop: &str, value: &str) -> bool {
    let value = value.to_ascii_lowercase();
    match prop {
        "font-weight" => ["bold", "700", "800", "900"]
            .iter()
            .any(|v| value.contains(v)),
        "font-style" => value.contains("italic"),
        "text-decoration" => value.contains("underline") || value.contains("line-through"),
        "color" => !matches!(
            value.replace(' ', "").as_str(),
            "rgb(0,0,0)" | "rgba(0,0,0,1)" | "#000" | "#000000" | "black"
        ),
        "background-color" => !matches!(
            value.replace(' ', "").as_str(),
            "rgba(0,0,0,0)" | "transparent"
        ),
        _ => !matches!(value.as_str(), "initial" | "inherit"),
    }
}

/// The emphasis subset of an inline style, filtered to significant values.
pub fn emphasis_subset(style: Option<&str>) -> StyleDecls {
    let Some(style) = style else {
        return StyleDecls::default();
    };
    let mut out = StyleDecls::default();
    for (p, v) in StyleDecls::parse(style).retain_only(EMPHASIS_STYLES).iter() {
        if is_significant(p, v) {
            out.set(p, v);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        let decls = StyleDecls::parse("color: red;  FONT-WEIGHT:bold ; ;margin:0");
        assert_eq!(decls.to_string(), "color: red; font-weight: bold; margin: 0");
        assert_eq!(StyleDecls::parse(&decls.to_string()), decls);
    }

    #[test]
    fn retain_only_drops_unlisted() {
        let decls = StyleDecls::parse("color: red; margin: 0; text-align: center")
            .retain_only(CLEAN_STYLE_WHITELIST);
        assert_eq!(decls.to_string(), "color: red; text-align: center");
    }

    #[test]
    fn cleanup_keeps_normalizer_declarations() {
        let decls = StyleDecls::parse("border: 1px solid #ddd; margin: 0; padding: 8px; color: red")
            .retain(survives_cleanup);
        assert_eq!(decls.to_string(), "border: 1px solid #ddd; padding: 8px; color: red");
    }

    #[test]
    fn merge_overrides_existing() {
        let base = StyleDecls::parse("padding: 1px; color: red");
        let merged = base.merge(&StyleDecls::parse("padding: 2px"));
        assert_eq!(merged.to_string(), "padding: 2px; color: red");
    }

    #[test]
    fn emphasis_subset_filters_insignificant_values() {
        let decls = emphasis_subset(Some(
            "font-weight: 400; font-style: italic; color: rgb(0, 0, 0); font-family: serif",
        ));
        assert_eq!(decls.to_string(), "font-style: italic; font-family: serif");
    }
}
