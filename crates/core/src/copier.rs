// ABOUTME: Copier orchestrating activation, host messages and the copy pipeline end to end.
// ABOUTME: Each transform stage is isolated; a failing stage passes its input through unchanged.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::analyze::{analyze, FormatDescriptor};
use crate::canonical::Canonicalizer;
use crate::clean::Cleaner;
use crate::clipboard::image::{collect_images, image_html, multi_image_html, ImageCapture};
use crate::clipboard::verify::{assess_quality, spawn_verification};
use crate::clipboard::{
    ClipboardApi, ClipboardPayload, ClipboardWriter, CopyEventData, Tier, MIME_HTML, MIME_PLAIN,
    MIME_RTF,
};
use crate::dom::ContentFragment;
use crate::error::CopyError;
use crate::extract::{extract, Captured, Extraction, Selection};
use crate::guard::{is_supported_page, RestrictionGuard, SyntheticEvent, Verdict};
use crate::host::{
    now_millis, CopySummary, ErrorReport, HostMessage, HostResponse, Notification, Notifier,
};
use crate::normalize::Normalizer;
use crate::options::{CopierBuilder, Options, Settings};
use crate::output::{plain_wrapper, Assembled, Assembler};
use crate::page::PageDocument;

/// Which sub-path produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyKind {
    Text,
    Image,
}

/// A payload ready for the clipboard writer.
#[derive(Debug, Clone)]
pub struct PreparedCopy {
    pub kind: CopyKind,
    pub payload: ClipboardPayload,
    pub descriptor: FormatDescriptor,
    /// Unicode scalar values of the selection text.
    pub chars: usize,
    pub images: usize,
}

impl PreparedCopy {
    /// Success message shown on the page.
    pub fn toast(&self) -> String {
        match self.kind {
            CopyKind::Text => format!("已复制 {} 个字符", self.chars),
            CopyKind::Image => format!("已复制 {} 张图片", self.images),
        }
    }
}

/// Result of one copy gesture.
#[derive(Debug, Clone)]
pub enum CopyOutcome {
    /// Copying is disabled in settings.
    Disabled,
    /// Nothing was selected; the clipboard was not touched.
    Empty,
    Copied { tier: Tier, prepared: PreparedCopy },
    /// Every clipboard tier failed.
    Failed { prepared: PreparedCopy },
}

/// The page-side copy pipeline.
pub struct Copier {
    opts: Options,
    clipboard: Option<Arc<dyn ClipboardApi>>,
    notifier: Option<Notifier>,
    guard: Option<RestrictionGuard>,
    images: ImageCapture,
}

impl Copier {
    pub fn new(
        opts: Options,
        clipboard: Option<Arc<dyn ClipboardApi>>,
        notifier: Option<Notifier>,
    ) -> Self {
        let client = opts.http_client.clone().unwrap_or_default();
        let images = ImageCapture::new(client, opts.image_timeout);
        Self {
            opts,
            clipboard,
            notifier,
            guard: None,
            images,
        }
    }

    /// Start configuring a Copier.
    pub fn builder() -> CopierBuilder {
        CopierBuilder::new()
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn settings(&self) -> &Settings {
        &self.opts.settings
    }

    pub fn is_active(&self) -> bool {
        self.guard.is_some()
    }

    fn page_url(&self) -> Option<String> {
        self.opts.page_url.clone()
    }

    /// Install the restriction guard when the page is a supported document page.
    pub fn activate(&mut self, doc: &mut dyn PageDocument) -> bool {
        if self.is_active() {
            return true;
        }
        if !self.opts.settings.enabled {
            debug!("copy unlock disabled in settings");
            return false;
        }
        let url = self
            .opts
            .page_url
            .clone()
            .or_else(|| doc.url().map(str::to_string));
        if !url.as_deref().is_some_and(is_supported_page) {
            debug!(url = ?url, "page not supported");
            return false;
        }
        if self.opts.page_url.is_none() {
            self.opts.page_url = url.clone();
        }
        self.guard = Some(RestrictionGuard::install(doc));
        info!(url = ?url, "activated");
        self.notify(Notification::ContentScriptActivated {
            url,
            timestamp: now_millis(),
        });
        true
    }

    /// Activate only when settings ask for activation on page load.
    pub fn auto_activate(&mut self, doc: &mut dyn PageDocument) -> bool {
        if !self.opts.settings.auto_activate {
            debug!("auto activation off");
            return false;
        }
        self.activate(doc)
    }

    /// Run an event through the guard. Inactive pages pass everything.
    pub fn inspect_event(&self, event: &mut SyntheticEvent) -> Verdict {
        match &self.guard {
            Some(guard) => guard.inspect(event),
            None => Verdict::Pass,
        }
    }

    /// Answer a host request. Settings updates are merged and acknowledged.
    pub fn handle_message(&mut self, message: HostMessage) -> Option<HostResponse> {
        match message {
            HostMessage::Ping => Some(HostResponse::Pong {
                pong: true,
                active: self.is_active(),
            }),
            HostMessage::GetTabStatus => Some(HostResponse::TabStatus {
                is_active: self.is_active(),
                url: self.page_url(),
                timestamp: now_millis(),
            }),
            HostMessage::SettingsUpdated { settings } => {
                self.opts.settings.merge(&settings);
                info!(settings = ?self.opts.settings, "settings updated");
                Some(HostResponse::Ack { success: true })
            }
            HostMessage::Unknown => {
                warn!("unknown host message type");
                None
            }
        }
    }

    /// Build the clipboard payload for `selection` without writing it.
    pub async fn prepare(&self, selection: &Selection) -> Option<PreparedCopy> {
        match extract(selection) {
            Extraction::Empty => None,
            Extraction::Captured(captured) if captured.contains_image => {
                Some(self.prepare_images(captured).await)
            }
            Extraction::Captured(captured) => Some(self.prepare_text(captured)),
        }
    }

    fn prepare_text(&self, captured: Captured) -> PreparedCopy {
        let preserve = self.opts.settings.preserve_format;
        let Captured {
            plain_text,
            fragment,
            ..
        } = captured;

        let descriptor = self
            .isolated("analyze", || analyze(&fragment))
            .unwrap_or_default();
        let normalized = self
            .isolated("normalize", || Normalizer::new(preserve).normalize(&fragment))
            .unwrap_or(fragment);
        let cleaned = self
            .isolated("clean", || Cleaner::new(preserve).clean(&normalized))
            .unwrap_or(normalized);
        let canonical: ContentFragment = self
            .isolated("canonicalize", || {
                Canonicalizer::new(preserve).canonicalize(&cleaned)
            })
            .unwrap_or(cleaned);
        let assembled = self
            .isolated("assemble", || {
                Assembler::new(preserve).assemble(&canonical, &descriptor, &plain_text)
            })
            .unwrap_or_else(|| Assembled {
                html: plain_wrapper(&plain_text),
                plain_text: plain_text.clone(),
                rtf: None,
            });

        let mut payload = ClipboardPayload::new()
            .with(MIME_PLAIN, assembled.plain_text)
            .with(MIME_HTML, assembled.html);
        if let Some(rtf) = assembled.rtf {
            payload.insert(MIME_RTF, rtf);
        }
        PreparedCopy {
            kind: CopyKind::Text,
            payload,
            descriptor,
            chars: plain_text.chars().count(),
            images: 0,
        }
    }

    async fn prepare_images(&self, captured: Captured) -> PreparedCopy {
        let base = self.opts.page_url.as_deref().and_then(|u| Url::parse(u).ok());
        let images = collect_images(&captured.fragment, base.as_ref());
        let mut payload = ClipboardPayload::new().with(MIME_PLAIN, captured.plain_text.clone());

        if let [single] = images.as_slice() {
            payload.insert(MIME_HTML, image_html(single));
            match self.images.capture(single).await {
                Ok(blob) => payload.insert(blob.mime, blob.bytes),
                Err(err) => {
                    debug!(error = %err, "binary capture skipped, html only");
                }
            }
        } else {
            debug!(count = images.len(), "multiple images, html only");
            payload.insert(MIME_HTML, Bytes::from(multi_image_html(&images)));
        }

        PreparedCopy {
            kind: CopyKind::Image,
            payload,
            descriptor: FormatDescriptor::default(),
            chars: captured.plain_text.chars().count(),
            images: images.len(),
        }
    }

    /// Run the whole pipeline for one copy gesture.
    ///
    /// `event` is the carrier of the copy event being handled, if any.
    /// Post-write verification needs a tokio runtime and is skipped without one.
    pub async fn copy(
        &self,
        selection: &Selection,
        event: Option<&mut dyn CopyEventData>,
        doc: &mut dyn PageDocument,
    ) -> CopyOutcome {
        if !self.opts.settings.enabled {
            debug!("copy ignored, disabled");
            return CopyOutcome::Disabled;
        }
        let Some(prepared) = self.prepare(selection).await else {
            debug!("empty selection, clipboard untouched");
            return CopyOutcome::Empty;
        };

        let writer = ClipboardWriter::new(self.clipboard.as_deref());
        match writer.commit(&prepared.payload, event, doc).await {
            Ok(tier) => {
                doc.show_toast(&prepared.toast());
                self.notify(Notification::CopySuccess {
                    data: self.summary(&prepared, tier),
                });
                if tier == Tier::Modern {
                    self.verify(&prepared);
                }
                CopyOutcome::Copied { tier, prepared }
            }
            Err(err) => {
                self.report(&err);
                CopyOutcome::Failed { prepared }
            }
        }
    }

    fn verify(&self, prepared: &PreparedCopy) {
        if !self.opts.verify {
            return;
        }
        let Some(api) = self.clipboard.clone() else {
            return;
        };
        let html = prepared.payload.html().unwrap_or("");
        let report = assess_quality(&prepared.descriptor, html);
        let expect = prepared.kind == CopyKind::Image || prepared.descriptor.has_formatting;
        drop(spawn_verification(
            api,
            self.opts.verify_delay,
            expect,
            Some(report),
        ));
    }

    fn summary(&self, prepared: &PreparedCopy, tier: Tier) -> CopySummary {
        CopySummary {
            kind: match prepared.kind {
                CopyKind::Text => "text".to_string(),
                CopyKind::Image => "image".to_string(),
            },
            chars: prepared.chars,
            images: prepared.images,
            formats: prepared
                .descriptor
                .preserved_styles
                .iter()
                .map(|t| t.to_string())
                .collect(),
            tier: tier.to_string(),
            url: self.page_url(),
            timestamp: now_millis(),
        }
    }

    fn report(&self, err: &CopyError) {
        error!(error = %err, "copy failed");
        self.notify(Notification::ErrorReport {
            error: ErrorReport::from_error(err, self.page_url()),
        });
    }

    fn notify(&self, notification: Notification) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(notification);
        }
    }

    /// Run a stage, turning a panic into a logged, reported skip.
    fn isolated<T>(&self, stage: &'static str, f: impl FnOnce() -> T) -> Option<T> {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(out) => Some(out),
            Err(payload) => {
                let err = CopyError::transform(
                    stage,
                    Some(anyhow::anyhow!(panic_message(payload.as_ref()))),
                );
                warn!(stage, error = %err, "stage failed, input passed through");
                self.notify(Notification::ErrorReport {
                    error: ErrorReport::from_error(&err, self.page_url()),
                });
                None
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "stage panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::SelectionRange;
    use crate::options::SettingsPatch;
    use crate::page::MemoryDocument;
    use pretty_assertions::assert_eq;

    #[test]
    fn isolated_stage_passes_through_on_panic() {
        let (notifier, mut rx) = Notifier::channel();
        let copier = CopierBuilder::new().notifier(notifier).build();
        let out: Option<u8> = copier.isolated("boom", || panic!("kaput"));
        assert_eq!(out, None);
        match rx.try_recv() {
            Ok(Notification::ErrorReport { error }) => assert!(error.message.contains("boom")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn activation_requires_supported_page() {
        let mut doc = MemoryDocument::new().with_url("https://example.com/docx/1");
        let mut copier = CopierBuilder::new().build();
        assert!(!copier.activate(&mut doc));
        assert_eq!(doc.stylesheet_count(), 0);

        let mut doc = MemoryDocument::new().with_url("https://a.feishu.cn/docx/1");
        assert!(copier.activate(&mut doc));
        assert!(copier.activate(&mut doc));
        assert_eq!(doc.stylesheet_count(), 1);
    }

    #[test]
    fn auto_activate_follows_settings() {
        let mut doc = MemoryDocument::new().with_url("https://a.feishu.cn/wiki/1");
        let mut copier = CopierBuilder::new()
            .settings(Settings {
                auto_activate: false,
                ..Settings::default()
            })
            .build();
        assert!(!copier.auto_activate(&mut doc));
        assert!(!copier.is_active());
    }

    #[test]
    fn messages_answer_and_update_settings() {
        let mut copier = CopierBuilder::new().page_url("https://a.feishu.cn/docx/1").build();
        assert_eq!(
            copier.handle_message(HostMessage::Ping),
            Some(HostResponse::Pong {
                pong: true,
                active: false
            })
        );
        let resp = copier.handle_message(HostMessage::SettingsUpdated {
            settings: SettingsPatch {
                preserve_format: Some(false),
                ..Default::default()
            },
        });
        assert_eq!(resp, Some(HostResponse::Ack { success: true }));
        assert!(!copier.settings().preserve_format);
        assert_eq!(copier.handle_message(HostMessage::Unknown), None);
    }

    #[tokio::test]
    async fn disabled_copier_does_nothing() {
        let copier = CopierBuilder::new()
            .settings(Settings {
                enabled: false,
                ..Settings::default()
            })
            .build();
        let mut doc = MemoryDocument::new();
        let out = copier
            .copy(&Selection::plain("x"), None, &mut doc)
            .await;
        assert!(matches!(out, CopyOutcome::Disabled));
        assert!(doc.copied().is_empty());
    }

    #[tokio::test]
    async fn toast_counts_characters() {
        let copier = CopierBuilder::new().build();
        let mut doc = MemoryDocument::new();
        let sel = Selection::single(SelectionRange::new("<p>飞书 ok</p>", "飞书 ok"));
        let out = copier.copy(&sel, None, &mut doc).await;
        assert!(matches!(out, CopyOutcome::Copied { tier: Tier::Scratch, .. }));
        assert_eq!(doc.toasts(), ["已复制 5 个字符".to_string()]);
    }
}
