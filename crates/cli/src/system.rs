// ABOUTME: System clipboard backend for the command line, built on arboard.
// ABOUTME: Implements the asynchronous clipboard API by running arboard calls on the blocking pool.

use std::borrow::Cow;

use anyhow::{anyhow, Context, Result};
use arboard::{Clipboard, ImageData};
use async_trait::async_trait;
use larkcopy_core::{ClipboardApi, ClipboardPayload};
use tracing::debug;

/// The desktop clipboard.
///
/// Image entries are decoded to RGBA because arboard only accepts raw pixels.
/// When a payload carries an image, the image wins over the textual entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[async_trait]
impl ClipboardApi for SystemClipboard {
    async fn write(&self, payload: &ClipboardPayload) -> Result<()> {
        let payload = payload.clone();
        tokio::task::spawn_blocking(move || write_blocking(&payload))
            .await
            .context("clipboard task panicked")?
    }

    async fn read_html(&self) -> Result<Option<String>> {
        tokio::task::spawn_blocking(|| {
            let mut clipboard = Clipboard::new().context("failed to open clipboard")?;
            Ok(clipboard.get().html().ok())
        })
        .await
        .context("clipboard task panicked")?
    }
}

fn write_blocking(payload: &ClipboardPayload) -> Result<()> {
    let mut clipboard = Clipboard::new().context("failed to open clipboard")?;

    if let Some((mime, bytes)) = payload.image() {
        let rgba = image::load_from_memory(bytes)
            .with_context(|| format!("undecodable {} entry", mime))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        debug!(width, height, "writing image");
        return clipboard
            .set_image(ImageData {
                width: width as usize,
                height: height as usize,
                bytes: Cow::Owned(rgba.into_raw()),
            })
            .map_err(|e| anyhow!("image write failed: {}", e));
    }

    let text = payload.plain_text().unwrap_or("");
    match payload.html() {
        Some(html) => clipboard
            .set_html(html, Some(text))
            .map_err(|e| anyhow!("html write failed: {}", e)),
        None => clipboard
            .set_text(text)
            .map_err(|e| anyhow!("text write failed: {}", e)),
    }
}
