// ABOUTME: Message model for the extension host: inbound requests, responses and outbound notifications.
// ABOUTME: Notifications go over an unbounded channel; send failures are swallowed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::CopyError;
use crate::options::SettingsPatch;

/// Longest stack text carried by an error report.
pub const MAX_STACK_CHARS: usize = 500;

/// Requests the host sends to the page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostMessage {
    Ping,
    GetTabStatus,
    SettingsUpdated {
        #[serde(default)]
        settings: SettingsPatch,
    },
    #[serde(other)]
    Unknown,
}

impl HostMessage {
    pub fn from_json(json: &str) -> Result<Self, CopyError> {
        serde_json::from_str(json).map_err(|e| CopyError::host("decode message", Some(e.into())))
    }
}

/// Replies to [`HostMessage`] requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HostResponse {
    Pong {
        pong: bool,
        active: bool,
    },
    TabStatus {
        #[serde(rename = "isActive")]
        is_active: bool,
        url: Option<String>,
        timestamp: i64,
    },
    Ack {
        success: bool,
    },
}

/// What was copied, reported with `COPY_SUCCESS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopySummary {
    /// `text` or `image`.
    pub kind: String,
    /// Unicode scalar values of copied text.
    pub chars: usize,
    pub images: usize,
    pub formats: Vec<String>,
    pub tier: String,
    pub url: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub message: String,
    pub url: Option<String>,
    pub timestamp: i64,
    pub stack: String,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>, stack: &str, url: Option<String>) -> Self {
        Self {
            message: message.into(),
            url,
            timestamp: now_millis(),
            stack: truncate_chars(stack, MAX_STACK_CHARS),
        }
    }

    pub fn from_error(err: &CopyError, url: Option<String>) -> Self {
        Self::new(err.to_string(), &err.chain(), url)
    }
}

/// Messages the page sends to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    ContentScriptActivated { url: Option<String>, timestamp: i64 },
    CopySuccess { data: CopySummary },
    ErrorReport { error: ErrorReport },
}

/// Best-effort sender of [`Notification`]s.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn new(tx: mpsc::UnboundedSender<Notification>) -> Self {
        Self { tx }
    }

    /// A notifier together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Send without waiting. A closed channel is ignored.
    pub fn notify(&self, notification: Notification) {
        trace!(?notification, "notify host");
        if self.tx.send(notification).is_err() {
            debug!("host channel closed, notification dropped");
        }
    }
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
