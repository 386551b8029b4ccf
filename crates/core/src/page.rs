// ABOUTME: The live page as seen by the pipeline: stylesheet injection, scratch elements and toasts.
// ABOUTME: MemoryDocument is an in-memory page; ScratchGuard removes its scratch element on drop.

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use tracing::{debug, trace};

/// Inline style placing a scratch element off-screen.
pub const SCRATCH_STYLE: &str =
    "position: fixed; left: -9999px; top: 0; opacity: 0; pointer-events: none";

/// Handle to a scratch element created in a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScratchId(pub u64);

/// The only mutations the pipeline performs on the live document.
pub trait PageDocument {
    /// Page address, when known.
    fn url(&self) -> Option<&str>;

    /// Insert or overwrite the stylesheet with `id`. Never duplicates.
    fn upsert_stylesheet(&mut self, id: &str, css: &str);

    /// Create an off-screen, editable element holding `html`.
    fn create_scratch(&mut self, html: &str) -> Result<ScratchId>;

    /// Select the full contents of a scratch element.
    fn select_scratch(&mut self, id: ScratchId) -> Result<()>;

    /// Run the legacy synchronous copy command on the current selection.
    /// `Ok(false)` is a refused command.
    fn exec_copy(&mut self) -> Result<bool>;

    fn remove_scratch(&mut self, id: ScratchId);

    fn show_toast(&mut self, message: &str);
}

/// A scratch element that is removed from the page when dropped.
pub struct ScratchGuard<'d> {
    doc: &'d mut dyn PageDocument,
    id: ScratchId,
}

impl<'d> ScratchGuard<'d> {
    pub fn create(doc: &'d mut dyn PageDocument, html: &str) -> Result<Self> {
        let id = doc.create_scratch(html)?;
        trace!(id = id.0, "scratch element created");
        Ok(Self { doc, id })
    }

    pub fn id(&self) -> ScratchId {
        self.id
    }

    pub fn select_all(&mut self) -> Result<()> {
        self.doc.select_scratch(self.id)
    }

    pub fn exec_copy(&mut self) -> Result<bool> {
        self.doc.exec_copy()
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        self.doc.remove_scratch(self.id);
        trace!(id = self.id.0, "scratch element removed");
    }
}

/// Behaviour of the legacy copy command in a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CopyCommand {
    #[default]
    Succeed,
    /// The command returns false.
    Refuse,
    /// The command throws.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchElement {
    pub html: String,
    pub style: String,
    pub editable: bool,
}

/// In-memory page used by tests and the command line.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    url: Option<String>,
    stylesheets: BTreeMap<String, String>,
    scratch: BTreeMap<ScratchId, ScratchElement>,
    next_scratch: u64,
    selected: Option<ScratchId>,
    copy_command: CopyCommand,
    copied: Vec<String>,
    toasts: Vec<String>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_copy_command(mut self, behaviour: CopyCommand) -> Self {
        self.copy_command = behaviour;
        self
    }

    pub fn stylesheet(&self, id: &str) -> Option<&str> {
        self.stylesheets.get(id).map(String::as_str)
    }

    pub fn stylesheet_count(&self) -> usize {
        self.stylesheets.len()
    }

    pub fn scratch_count(&self) -> usize {
        self.scratch.len()
    }

    pub fn scratch(&self, id: ScratchId) -> Option<&ScratchElement> {
        self.scratch.get(&id)
    }

    /// Content captured by successful legacy copy commands, oldest first.
    pub fn copied(&self) -> &[String] {
        &self.copied
    }

    pub fn toasts(&self) -> &[String] {
        &self.toasts
    }
}

impl PageDocument for MemoryDocument {
    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn upsert_stylesheet(&mut self, id: &str, css: &str) {
        self.stylesheets.insert(id.to_string(), css.to_string());
    }

    fn create_scratch(&mut self, html: &str) -> Result<ScratchId> {
        self.next_scratch += 1;
        let id = ScratchId(self.next_scratch);
        self.scratch.insert(
            id,
            ScratchElement {
                html: html.to_string(),
                style: SCRATCH_STYLE.to_string(),
                editable: true,
            },
        );
        Ok(id)
    }

    fn select_scratch(&mut self, id: ScratchId) -> Result<()> {
        if !self.scratch.contains_key(&id) {
            bail!("scratch element {} is not attached", id.0);
        }
        self.selected = Some(id);
        Ok(())
    }

    fn exec_copy(&mut self) -> Result<bool> {
        match self.copy_command {
            CopyCommand::Fail => Err(anyhow!("copy command threw")),
            CopyCommand::Refuse => Ok(false),
            CopyCommand::Succeed => {
                let Some(el) = self.selected.and_then(|id| self.scratch.get(&id)) else {
                    return Ok(false);
                };
                self.copied.push(el.html.clone());
                Ok(true)
            }
        }
    }

    fn remove_scratch(&mut self, id: ScratchId) {
        self.scratch.remove(&id);
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    fn show_toast(&mut self, message: &str) {
        debug!(message, "toast");
        self.toasts.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_upsert_is_idempotent() {
        let mut doc = MemoryDocument::new();
        doc.upsert_stylesheet("s", "a {}");
        doc.upsert_stylesheet("s", "b {}");
        assert_eq!(doc.stylesheet_count(), 1);
        assert_eq!(doc.stylesheet("s"), Some("b {}"));
    }

    #[test]
    fn guard_removes_scratch_on_drop() {
        let mut doc = MemoryDocument::new();
        {
            let mut guard = ScratchGuard::create(&mut doc, "<p>x</p>").unwrap();
            guard.select_all().unwrap();
            assert!(guard.exec_copy().unwrap());
        }
        assert_eq!(doc.scratch_count(), 0);
        assert_eq!(doc.copied(), ["<p>x</p>".to_string()]);
    }

    #[test]
    fn guard_removes_scratch_on_error_path() {
        fn attempt(doc: &mut MemoryDocument) -> Result<bool> {
            let mut guard = ScratchGuard::create(doc, "x")?;
            guard.select_all()?;
            guard.exec_copy()
        }
        let mut doc = MemoryDocument::new().with_copy_command(CopyCommand::Fail);
        assert!(attempt(&mut doc).is_err());
        assert_eq!(doc.scratch_count(), 0);
        assert!(doc.copied().is_empty());
    }
}
