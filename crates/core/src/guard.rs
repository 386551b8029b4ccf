// ABOUTME: Restriction guard that neutralizes copy-blocking events and CSS on supported pages.
// ABOUTME: Inspects capturing-phase events and stops restrictive ones; never patches shared behaviour.

use tracing::{debug, info};
use url::Url;

use crate::page::PageDocument;

/// Id of the single injected override stylesheet.
pub const STYLESHEET_ID: &str = "larkcopy-overrides";

/// Event types inspected by the guard.
pub const GUARDED_EVENTS: &[&str] = &[
    "copy",
    "cut",
    "paste",
    "selectstart",
    "select",
    "contextmenu",
    "mousedown",
    "mouseup",
    "keydown",
    "keyup",
    "keypress",
];

const SUPPORTED_HOSTS: &[&str] = &["feishu.cn", "larksuite.com"];
const SUPPORTED_PATHS: &[&str] = &["/docs/", "/docx/", "/sheets/", "/base/", "/wiki/"];

/// Re-enables text selection across the page.
pub const OVERRIDE_CSS: &str = r#"* {
  -webkit-user-select: text !important;
  -moz-user-select: text !important;
  user-select: text !important;
  -webkit-touch-callout: default !important;
}
input, textarea, select, button {
  -webkit-user-select: auto !important;
  -moz-user-select: auto !important;
  user-select: auto !important;
}
[contenteditable="false"],
.lark-doc-content,
.lark-doc-editor,
.doc-content,
.editor-content {
  -webkit-user-select: text !important;
  user-select: text !important;
}
"#;

/// Whether `url` is an editor document page.
pub fn is_supported_page(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let host_ok = SUPPORTED_HOSTS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)));
    host_ok && SUPPORTED_PATHS.iter().any(|p| parsed.path().contains(p))
}

/// The element an event was dispatched to, reduced to what the guard reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTarget {
    /// Inline `user-select` value.
    pub user_select: Option<String>,
    /// `unselectable` attribute value.
    pub unselectable: Option<String>,
}

/// An event as observed in the capturing phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticEvent {
    pub kind: String,
    pub default_prevented: bool,
    pub target: EventTarget,
    propagation_stopped: bool,
}

impl SyntheticEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            default_prevented: false,
            target: EventTarget::default(),
            propagation_stopped: false,
        }
    }

    pub fn prevented(mut self) -> Self {
        self.default_prevented = true;
        self
    }

    pub fn with_target(mut self, target: EventTarget) -> Self {
        self.target = target;
        self
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Suppressed,
}

/// Capturing listener installed once per page.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestrictionGuard;

impl RestrictionGuard {
    /// Inject the override stylesheet and return the guard.
    pub fn install(doc: &mut dyn PageDocument) -> Self {
        doc.upsert_stylesheet(STYLESHEET_ID, OVERRIDE_CSS);
        info!(events = GUARDED_EVENTS.len(), "restriction guard installed");
        Self
    }

    pub fn is_restrictive(event: &SyntheticEvent) -> bool {
        match event.kind.as_str() {
            "copy" | "cut" | "selectstart" => {
                event.default_prevented
                    || event
                        .target
                        .user_select
                        .as_deref()
                        .is_some_and(|v| v.trim().eq_ignore_ascii_case("none"))
                    || event.target.unselectable.as_deref() == Some("on")
            }
            "contextmenu" => event.default_prevented,
            _ => false,
        }
    }

    /// Stop propagation of restrictive events; everything else passes untouched.
    pub fn inspect(&self, event: &mut SyntheticEvent) -> Verdict {
        if !GUARDED_EVENTS.contains(&event.kind.as_str()) || !Self::is_restrictive(event) {
            return Verdict::Pass;
        }
        event.stop_propagation();
        debug!(kind = %event.kind, "restrictive event suppressed");
        Verdict::Suppressed
    }
}
