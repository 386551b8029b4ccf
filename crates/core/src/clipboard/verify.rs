// ABOUTME: Post-write diagnostics: a delayed clipboard re-read and a format quality assessment.
// ABOUTME: Purely informational; never retries or blocks the write.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::ClipboardApi;
use crate::analyze::{FormatDescriptor, StyleTag};
use crate::dom::ContentFragment;

/// Selector showing that a detected style survived into the written HTML.
fn survival_probe(tag: StyleTag) -> &'static str {
    match tag {
        StyleTag::Bold => "strong, b",
        StyleTag::Italic => "em, i",
        StyleTag::Underline => "u",
        StyleTag::Strikethrough => "del, s, strike",
        StyleTag::Link => "a[href]",
        StyleTag::List => "ul, ol",
        StyleTag::Table => "table",
        StyleTag::Code => "code, pre",
        StyleTag::Color => r#"[style*="color"]"#,
    }
}

/// Which detected styles have a matching element in the written HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    /// Percentage of detected styles that survived, 100 when nothing was detected.
    pub score: u8,
    pub preserved: BTreeSet<StyleTag>,
    pub lost: BTreeSet<StyleTag>,
}

pub fn assess_quality(descriptor: &FormatDescriptor, html: &str) -> QualityReport {
    if !descriptor.has_formatting || descriptor.preserved_styles.is_empty() {
        return QualityReport {
            score: 100,
            ..Default::default()
        };
    }
    let written = ContentFragment::parse(html);
    let (preserved, lost): (BTreeSet<StyleTag>, BTreeSet<StyleTag>) = descriptor
        .preserved_styles
        .iter()
        .partition(|tag| written.count(survival_probe(**tag)) > 0);
    let total = descriptor.preserved_styles.len();
    let score = ((preserved.len() * 100) as f64 / total as f64).round() as u8;
    QualityReport {
        score,
        preserved,
        lost,
    }
}

/// Re-read the clipboard after `delay` and log whether HTML content is present.
///
/// Returns the handle of the detached task; callers are free to drop it.
/// Outside a tokio runtime nothing is spawned and `None` is returned.
pub fn spawn_verification(
    api: Arc<dyn ClipboardApi>,
    delay: Duration,
    expect_formatting: bool,
    report: Option<QualityReport>,
) -> Option<JoinHandle<Option<bool>>> {
    let Ok(runtime) = Handle::try_current() else {
        debug!("no tokio runtime, clipboard verification skipped");
        return None;
    };
    Some(runtime.spawn(async move {
        tokio::time::sleep(delay).await;
        let html = match api.read_html().await {
            Ok(html) => html,
            Err(err) => {
                warn!(error = %err, "clipboard re-read failed");
                return None;
            }
        };
        let present = html.as_deref().is_some_and(|h| !h.trim().is_empty());
        if expect_formatting && !present {
            warn!("formatted copy left no html on the clipboard");
        } else {
            info!(present, "clipboard verified");
        }
        if let Some(report) = report {
            debug!(score = report.score, lost = ?report.lost, "format quality");
        }
        Some(present)
    }))
}
