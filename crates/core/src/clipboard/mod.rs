// ABOUTME: Clipboard payload model and the tiered clipboard writer.
// ABOUTME: Tries the multi-format API, then the copy-event carrier, then a scratch-element copy command.

//! Clipboard writing.
//!
//! A [`ClipboardPayload`] maps MIME types to bytes. [`ClipboardWriter::commit`]
//! offers it through three capability tiers in strict order and stops at the
//! first one that succeeds:
//!
//! 1. [`Tier::Modern`]: the asynchronous multi-format [`ClipboardApi`], one atomic write.
//! 2. [`Tier::EventData`]: the carrier of the copy/cut event being handled, entries
//!    written one at a time, first failure aborts the tier.
//! 3. [`Tier::Scratch`]: an off-screen scratch element and the legacy copy command.

pub mod image;
pub mod verify;

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::dom::serialize::escape_text;
use crate::error::CopyError;
use crate::page::{PageDocument, ScratchGuard};

pub const MIME_PLAIN: &str = "text/plain";
pub const MIME_HTML: &str = "text/html";
pub const MIME_RTF: &str = "text/rtf";

/// MIME type to content, offered to the clipboard as one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardPayload {
    entries: BTreeMap<String, Bytes>,
}

impl ClipboardPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mime: impl Into<String>, data: impl Into<Bytes>) {
        self.entries.insert(mime.into(), data.into());
    }

    pub fn with(mut self, mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.insert(mime, data);
        self
    }

    pub fn get(&self, mime: &str) -> Option<&Bytes> {
        self.entries.get(mime)
    }

    /// Entry decoded as UTF-8, for textual MIME types.
    pub fn get_str(&self, mime: &str) -> Option<&str> {
        self.get(mime).and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn plain_text(&self) -> Option<&str> {
        self.get_str(MIME_PLAIN)
    }

    pub fn html(&self) -> Option<&str> {
        self.get_str(MIME_HTML)
    }

    pub fn rtf(&self) -> Option<&str> {
        self.get_str(MIME_RTF)
    }

    /// The first `image/*` entry.
    pub fn image(&self) -> Option<(&str, &Bytes)> {
        self.entries
            .iter()
            .find(|(mime, _)| mime.starts_with("image/"))
            .map(|(mime, data)| (mime.as_str(), data))
    }

    pub fn contains(&self, mime: &str) -> bool {
        self.entries.contains_key(mime)
    }

    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bytes)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The asynchronous multi-format clipboard.
#[async_trait]
pub trait ClipboardApi: Send + Sync {
    /// Commit every entry of `payload` as one clipboard item.
    async fn write(&self, payload: &ClipboardPayload) -> Result<()>;

    /// Current `text/html` content, if any.
    async fn read_html(&self) -> Result<Option<String>>;
}

/// Clipboard-data carrier of an in-flight copy or cut event.
pub trait CopyEventData {
    /// Whether the event is still being dispatched and accepts data.
    fn is_active(&self) -> bool;

    fn set_data(&mut self, mime: &str, data: &str) -> Result<()>;

    /// Suppress the event's default action.
    fn prevent_default(&mut self);
}

/// Capability tier that committed a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Modern,
    EventData,
    Scratch,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Modern => "modern clipboard api",
            Tier::EventData => "copy event data",
            Tier::Scratch => "scratch element copy command",
        };
        write!(f, "{}", s)
    }
}

/// Commits payloads through the clipboard tiers.
#[derive(Clone, Copy, Default)]
pub struct ClipboardWriter<'a> {
    api: Option<&'a dyn ClipboardApi>,
}

impl<'a> ClipboardWriter<'a> {
    pub fn new(api: Option<&'a dyn ClipboardApi>) -> Self {
        Self { api }
    }

    /// Offer `payload` to each tier in order until one succeeds.
    ///
    /// Exhausting every tier is logged and returned as a clipboard error.
    pub async fn commit(
        &self,
        payload: &ClipboardPayload,
        event: Option<&mut dyn CopyEventData>,
        doc: &mut dyn PageDocument,
    ) -> std::result::Result<Tier, CopyError> {
        match self.api {
            Some(api) => match api.write(payload).await {
                Ok(()) => return Ok(self.committed(Tier::Modern)),
                Err(err) => warn!(tier = %Tier::Modern, error = %err, "clipboard tier failed"),
            },
            None => debug!(tier = %Tier::Modern, "tier unavailable"),
        }

        match event {
            Some(event) if event.is_active() => match write_event_data(payload, event) {
                Ok(()) => return Ok(self.committed(Tier::EventData)),
                Err(err) => warn!(tier = %Tier::EventData, error = %err, "clipboard tier failed"),
            },
            _ => debug!(tier = %Tier::EventData, "tier unavailable"),
        }

        match scratch_copy(payload, doc) {
            Ok(()) => return Ok(self.committed(Tier::Scratch)),
            Err(err) => warn!(tier = %Tier::Scratch, error = %err, "clipboard tier failed"),
        }

        error!("all clipboard tiers failed");
        Err(CopyError::clipboard(
            "commit",
            Some(anyhow!("all clipboard tiers failed")),
        ))
    }

    fn committed(&self, tier: Tier) -> Tier {
        info!(tier = %tier, "clipboard written");
        tier
    }
}

/// Write plain text then HTML into the event carrier; first failure aborts.
fn write_event_data(payload: &ClipboardPayload, event: &mut dyn CopyEventData) -> Result<()> {
    let mut written = 0;
    for mime in [MIME_PLAIN, MIME_HTML] {
        if let Some(data) = payload.get_str(mime) {
            event.set_data(mime, data)?;
            written += 1;
        }
    }
    if written == 0 {
        bail!("payload has no textual entries");
    }
    event.prevent_default();
    Ok(())
}

/// Copy through an off-screen scratch element. The element is removed on every path.
fn scratch_copy(payload: &ClipboardPayload, doc: &mut dyn PageDocument) -> Result<()> {
    let content = match (payload.html(), payload.plain_text()) {
        (Some(html), _) => html.to_string(),
        (None, Some(text)) => escape_text(text),
        (None, None) => bail!("payload has no textual entries"),
    };
    let mut scratch = ScratchGuard::create(doc, &content)?;
    scratch.select_all()?;
    if !scratch.exec_copy()? {
        bail!("copy command refused");
    }
    Ok(())
}
