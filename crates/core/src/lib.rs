// ABOUTME: Main library entry point for the larkcopy copy-unlock pipeline.
// ABOUTME: Re-exports the public API: Copier, CopierBuilder, Selection, ClipboardPayload, CopyError, Settings.

//! larkcopy - restores copying on Feishu/Lark document pages.
//!
//! A selection captured from the editor is normalized from editor-specific
//! markup into portable HTML, cleaned, canonicalized and written to the
//! clipboard as HTML, plain text and RTF (or as an image). Writing falls back
//! through the asynchronous clipboard, the copy event's data carrier and a
//! hidden scratch element.
//!
//! # Example
//!
//! ```no_run
//! use larkcopy_core::{Copier, MemoryDocument, Selection, SelectionRange};
//!
//! #[tokio::main]
//! async fn main() {
//!     let copier = Copier::builder().page_url("https://x.feishu.cn/docx/abc").build();
//!     let mut doc = MemoryDocument::new();
//!     let selection = Selection::single(SelectionRange::new(
//!         r#"<span class="lark-text-bold">hi</span>"#,
//!         "hi",
//!     ));
//!     let outcome = copier.copy(&selection, None, &mut doc).await;
//!     println!("{:?}", outcome);
//! }
//! ```

pub mod analyze;
pub mod canonical;
pub mod clean;
pub mod clipboard;
pub mod copier;
pub mod dom;
pub mod error;
pub mod extract;
pub mod guard;
pub mod host;
pub mod normalize;
pub mod options;
pub mod output;
pub mod page;

pub use crate::analyze::{analyze, FormatDescriptor, StyleTag};
pub use crate::clipboard::image::{ImageBlob, ImageCapture, ImageRef};
pub use crate::clipboard::verify::{assess_quality, QualityReport};
pub use crate::clipboard::{
    ClipboardApi, ClipboardPayload, ClipboardWriter, CopyEventData, Tier, MIME_HTML, MIME_PLAIN,
    MIME_RTF,
};
pub use crate::copier::{Copier, CopyKind, CopyOutcome, PreparedCopy};
pub use crate::dom::ContentFragment;
pub use crate::error::{CopyError, ErrorCode};
pub use crate::extract::{Selection, SelectionRange};
pub use crate::guard::{is_supported_page, EventTarget, RestrictionGuard, SyntheticEvent, Verdict};
pub use crate::host::{HostMessage, HostResponse, Notification, Notifier};
pub use crate::options::{CopierBuilder, Options, OutputFormat, Settings, SettingsPatch};
pub use crate::output::{Assembled, Assembler};
pub use crate::page::{CopyCommand, MemoryDocument, PageDocument};
