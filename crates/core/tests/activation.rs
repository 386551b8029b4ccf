// ABOUTME: Tests for page activation, event suppression and host messaging through the Copier.
// ABOUTME: Also drives a copy through the copy-event data carrier.

use anyhow::{bail, Result};
use larkcopy_core::guard::STYLESHEET_ID;
use larkcopy_core::{
    Copier, CopyEventData, CopyOutcome, EventTarget, HostMessage, HostResponse, MemoryDocument,
    Notification, Notifier, Selection, SelectionRange, SyntheticEvent, Tier, Verdict,
};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct CopyEvent {
    data: Vec<(String, String)>,
    prevented: bool,
    reject_html: bool,
}

impl CopyEventData for CopyEvent {
    fn is_active(&self) -> bool {
        true
    }

    fn set_data(&mut self, mime: &str, data: &str) -> Result<()> {
        if self.reject_html && mime == "text/html" {
            bail!("html not accepted");
        }
        self.data.push((mime.to_string(), data.to_string()));
        Ok(())
    }

    fn prevent_default(&mut self) {
        self.prevented = true;
    }
}

#[test]
fn activation_on_document_page() {
    let (notifier, mut rx) = Notifier::channel();
    let mut copier = Copier::builder().notifier(notifier).build();
    let mut doc = MemoryDocument::new().with_url("https://team.larksuite.com/docx/AbC");

    assert!(copier.auto_activate(&mut doc));
    assert!(doc.stylesheet(STYLESHEET_ID).is_some());
    match rx.try_recv() {
        Ok(Notification::ContentScriptActivated { url, .. }) => {
            assert_eq!(url.as_deref(), Some("https://team.larksuite.com/docx/AbC"));
        }
        other => panic!("unexpected {:?}", other),
    }

    let mut blocked = SyntheticEvent::new("copy").prevented();
    assert_eq!(copier.inspect_event(&mut blocked), Verdict::Suppressed);
    let mut ordinary = SyntheticEvent::new("mouseup").with_target(EventTarget::default());
    assert_eq!(copier.inspect_event(&mut ordinary), Verdict::Pass);

    match copier.handle_message(HostMessage::GetTabStatus) {
        Some(HostResponse::TabStatus { is_active, url, .. }) => {
            assert!(is_active);
            assert_eq!(url.as_deref(), Some("https://team.larksuite.com/docx/AbC"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn inactive_copier_lets_events_through() {
    let mut copier = Copier::builder().build();
    let mut doc = MemoryDocument::new().with_url("https://example.com/docx/1");
    assert!(!copier.activate(&mut doc));
    let mut ev = SyntheticEvent::new("copy").prevented();
    assert_eq!(copier.inspect_event(&mut ev), Verdict::Pass);
    assert!(!ev.is_propagation_stopped());
}

#[test]
fn settings_update_from_json_message() {
    let mut copier = Copier::builder().build();
    let msg = HostMessage::from_json(
        r#"{"type":"SETTINGS_UPDATED","settings":{"enabled":false,"debugMode":true}}"#,
    )
    .unwrap();
    assert_eq!(
        copier.handle_message(msg),
        Some(HostResponse::Ack { success: true })
    );
    assert!(!copier.settings().enabled);
    assert!(copier.settings().debug_mode);
    assert!(copier.settings().preserve_format);
}

#[tokio::test]
async fn copy_event_carrier_receives_plain_then_html() {
    let copier = Copier::builder().build();
    let mut doc = MemoryDocument::new();
    let mut event = CopyEvent::default();
    let sel = Selection::single(SelectionRange::new("<em>hi</em>", "hi"));

    let out = copier.copy(&sel, Some(&mut event), &mut doc).await;
    assert!(matches!(out, CopyOutcome::Copied { tier: Tier::EventData, .. }));
    assert!(event.prevented);
    assert_eq!(
        event.data,
        vec![
            ("text/plain".to_string(), "hi".to_string()),
            ("text/html".to_string(), "<em>hi</em>".to_string()),
        ]
    );
    assert!(doc.copied().is_empty());
}

#[tokio::test]
async fn rejected_carrier_falls_back_to_scratch() {
    let (notifier, mut rx) = Notifier::channel();
    let copier = Copier::builder().notifier(notifier).build();
    let mut doc = MemoryDocument::new();
    let mut event = CopyEvent {
        reject_html: true,
        ..Default::default()
    };

    let out = copier
        .copy(&Selection::plain("text"), Some(&mut event), &mut doc)
        .await;
    assert!(matches!(out, CopyOutcome::Copied { tier: Tier::Scratch, .. }));
    assert!(!event.prevented);
    assert_eq!(doc.copied(), ["<p>text</p>".to_string()]);
    assert_eq!(doc.scratch_count(), 0);
    assert!(matches!(rx.try_recv(), Ok(Notification::CopySuccess { .. })));
}

#[tokio::test]
async fn exhausted_tiers_report_error() {
    let (notifier, mut rx) = Notifier::channel();
    let copier = Copier::builder()
        .page_url("https://a.feishu.cn/docx/1")
        .notifier(notifier)
        .build();
    let mut doc =
        MemoryDocument::new().with_copy_command(larkcopy_core::CopyCommand::Refuse);

    let out = copier.copy(&Selection::plain("x"), None, &mut doc).await;
    assert!(matches!(out, CopyOutcome::Failed { .. }));
    assert_eq!(doc.scratch_count(), 0);
    assert!(doc.toasts().is_empty());
    match rx.try_recv() {
        Ok(Notification::ErrorReport { error }) => {
            assert!(error.message.contains("clipboard"), "{}", error.message);
            assert_eq!(error.url.as_deref(), Some("https://a.feishu.cn/docx/1"));
        }
        other => panic!("unexpected {:?}", other),
    }
}
