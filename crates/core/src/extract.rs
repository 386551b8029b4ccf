// ABOUTME: Selection model and the extractor that captures it as a detached fragment.
// ABOUTME: Decides between the rich-text and image sub-paths by a simple image presence test.

use tracing::debug;

use crate::dom::ContentFragment;

/// One range of the user's selection: its cloned markup and text serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionRange {
    pub html: String,
    pub text: String,
}

impl SelectionRange {
    pub fn new(html: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            text: text.into(),
        }
    }
}

/// The active window selection as handed to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ranges: Vec<SelectionRange>,
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(range: SelectionRange) -> Self {
        Self {
            ranges: vec![range],
        }
    }

    /// Selection of plain text with no markup.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::single(SelectionRange::new(crate::dom::serialize::escape_text(&text), text))
    }

    pub fn push(&mut self, range: SelectionRange) {
        self.ranges.push(range);
    }

    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn range(&self, index: usize) -> Option<&SelectionRange> {
        self.ranges.get(index)
    }

    /// Text serialization of the whole selection.
    pub fn to_text(&self) -> String {
        self.ranges.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A captured, non-empty selection.
#[derive(Debug, Clone)]
pub struct Captured {
    pub plain_text: String,
    pub fragment: ContentFragment,
    pub contains_image: bool,
}

/// Result of capturing the selection.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// Nothing to copy; the pipeline performs no clipboard write.
    Empty,
    Captured(Captured),
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        matches!(self, Extraction::Empty)
    }
}

/// Capture the first range of the selection as a detached fragment.
pub fn extract(selection: &Selection) -> Extraction {
    if selection.range_count() == 0 {
        debug!("selection has no ranges");
        return Extraction::Empty;
    }
    let Some(range) = selection.range(0) else {
        return Extraction::Empty;
    };

    let fragment = ContentFragment::parse(&range.html);
    let contains_image = fragment.count("img") >= 1;
    let plain_text = selection.to_text();

    if !contains_image && plain_text.is_empty() && fragment.is_blank() {
        debug!("selection is empty");
        return Extraction::Empty;
    }

    debug!(
        chars = plain_text.chars().count(),
        contains_image, "captured selection"
    );
    Extraction::Captured(Captured {
        plain_text,
        fragment,
        contains_image,
    })
}
