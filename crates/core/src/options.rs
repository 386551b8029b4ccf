// ABOUTME: Configuration for the copy pipeline: persisted Settings, runtime Options and CopierBuilder.
// ABOUTME: CopierBuilder provides a fluent API for constructing Copier instances.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clipboard::image::DEFAULT_IMAGE_TIMEOUT;
use crate::clipboard::ClipboardApi;
use crate::copier::Copier;
use crate::host::Notifier;

/// Extension settings as stored by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enabled: bool,
    pub preserve_format: bool,
    pub auto_activate: bool,
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            preserve_format: true,
            auto_activate: true,
            debug_mode: false,
        }
    }
}

impl Settings {
    /// Parse settings JSON. Unknown keys are ignored, missing keys defaulted.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Overlay the fields present in `patch`.
    pub fn merge(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.enabled {
            self.enabled = v;
        }
        if let Some(v) = patch.preserve_format {
            self.preserve_format = v;
        }
        if let Some(v) = patch.auto_activate {
            self.auto_activate = v;
        }
        if let Some(v) = patch.debug_mode {
            self.debug_mode = v;
        }
    }
}

/// A partial settings update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_format: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_activate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_mode: Option<bool>,
}

/// Which clipboard artifact to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Text,
    Rtf,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Html => "html",
            OutputFormat::Text => "text",
            OutputFormat::Rtf => "rtf",
            OutputFormat::Json => "json",
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => OutputFormat::Text,
            "rtf" => OutputFormat::Rtf,
            "json" => OutputFormat::Json,
            _ => OutputFormat::Html,
        }
    }
}

/// Runtime options for a [`Copier`].
#[derive(Debug, Clone)]
pub struct Options {
    pub settings: Settings,
    /// Address of the page the selection comes from.
    pub page_url: Option<String>,
    /// Bound on single-image binary capture.
    pub image_timeout: Duration,
    /// Re-read the clipboard after a modern-tier write.
    pub verify: bool,
    pub verify_delay: Duration,
    pub http_client: Option<reqwest::Client>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            page_url: None,
            image_timeout: DEFAULT_IMAGE_TIMEOUT,
            verify: true,
            verify_delay: Duration::from_millis(100),
            http_client: None,
        }
    }
}

/// Builder for constructing Copier instances with custom configuration.
#[derive(Clone, Default)]
pub struct CopierBuilder {
    opts: Options,
    clipboard: Option<Arc<dyn ClipboardApi>>,
    notifier: Option<Notifier>,
}

impl CopierBuilder {
    /// Create a new CopierBuilder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.opts.settings = settings;
        self
    }

    /// Toggle format preservation.
    pub fn preserve_format(mut self, preserve: bool) -> Self {
        self.opts.settings.preserve_format = preserve;
        self
    }

    pub fn page_url(mut self, url: impl Into<String>) -> Self {
        self.opts.page_url = Some(url.into());
        self
    }

    /// Set the single-image capture timeout.
    pub fn image_timeout(mut self, timeout: Duration) -> Self {
        self.opts.image_timeout = timeout;
        self
    }

    /// Enable or disable the post-write clipboard re-read.
    pub fn verify(mut self, verify: bool) -> Self {
        self.opts.verify = verify;
        self
    }

    pub fn verify_delay(mut self, delay: Duration) -> Self {
        self.opts.verify_delay = delay;
        self
    }

    /// Use a custom HTTP client for networked images.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Asynchronous multi-format clipboard used as the first write tier.
    pub fn clipboard(mut self, api: Arc<dyn ClipboardApi>) -> Self {
        self.clipboard = Some(api);
        self
    }

    /// Channel for outbound host notifications.
    pub fn notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the Copier with the configured options.
    pub fn build(self) -> Copier {
        Copier::new(self.opts, self.clipboard, self.notifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn settings_defaults_and_unknown_keys() {
        let s = Settings::from_json(r#"{"preserveFormat": false, "theme": "dark"}"#).unwrap();
        assert_eq!(
            s,
            Settings {
                preserve_format: false,
                ..Settings::default()
            }
        );
    }

    #[test]
    fn settings_serialize_camel_case() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert_eq!(
            json,
            r#"{"enabled":true,"preserveFormat":true,"autoActivate":true,"debugMode":false}"#
        );
    }

    #[test]
    fn patch_merges_present_fields_only() {
        let mut s = Settings::default();
        let patch: SettingsPatch = serde_json::from_str(r#"{"debugMode": true}"#).unwrap();
        s.merge(&patch);
        assert!(s.debug_mode);
        assert!(s.preserve_format);
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!(OutputFormat::from("TXT"), OutputFormat::Text);
        assert_eq!(OutputFormat::from("rtf"), OutputFormat::Rtf);
        assert_eq!(OutputFormat::from("whatever"), OutputFormat::Html);
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn builder_defaults() {
        let copier = CopierBuilder::new().page_url("https://a.feishu.cn/docx/1").build();
        assert_eq!(copier.options().image_timeout, Duration::from_millis(5000));
        assert_eq!(copier.options().verify_delay, Duration::from_millis(100));
        assert!(copier.settings().preserve_format);
    }
}
