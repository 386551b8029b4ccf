// ABOUTME: Minimal RTF rendition of the copied text for destinations that prefer text/rtf.
// ABOUTME: Wraps the text in bold/italic/underline groups according to the format descriptor.

use crate::analyze::{FormatDescriptor, StyleTag};

const HEADER: &str = r"{\rtf1\ansi\ansicpg1252\deff0{\fonttbl{\f0\fswiss Helvetica;}}\f0\fs24 ";

/// Render `text` as a single-font RTF document.
pub fn to_rtf(text: &str, descriptor: &FormatDescriptor) -> String {
    let groups: Vec<&str> = [
        (StyleTag::Bold, r"\b"),
        (StyleTag::Italic, r"\i"),
        (StyleTag::Underline, r"\ul"),
    ]
    .iter()
    .filter(|(tag, _)| descriptor.has(*tag))
    .map(|(_, word)| *word)
    .collect();

    let mut out = String::from(HEADER);
    for word in &groups {
        out.push('{');
        out.push_str(word);
        out.push(' ');
    }
    out.push_str(&escape_rtf(text));
    for _ in &groups {
        out.push('}');
    }
    out.push('}');
    out
}

/// Escape RTF control characters, newlines and non-ASCII text.
pub fn escape_rtf(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str(r"\\"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '\n' => out.push_str("\\par\n"),
            '\r' => {}
            '\t' => out.push_str(r"\tab "),
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{}?", *unit as i16));
                }
            }
        }
    }
    out
}
