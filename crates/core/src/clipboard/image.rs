// ABOUTME: Image sub-path: standard <img> markup and best-effort binary capture of a single image.
// ABOUTME: Data URLs are decoded directly; networked images are fetched and re-encoded as PNG under a timeout.

use std::io::Cursor;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use image::ImageFormat;
use tracing::{debug, warn};
use url::Url;

use crate::dom::serialize::write_open_tag;
use crate::dom::ContentFragment;
use crate::error::CopyError;

/// Largest image body accepted for binary capture (10 MB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_millis(5000);

/// An image found in the selection, reduced to its standard attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRef {
    pub src: String,
    pub alt: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

impl ImageRef {
    pub fn is_data_url(&self) -> bool {
        self.src.starts_with("data:")
    }
}

/// Images of a fragment in document order. Relative sources resolve against `base`.
pub fn collect_images(fragment: &ContentFragment, base: Option<&Url>) -> Vec<ImageRef> {
    fragment
        .select("img")
        .into_iter()
        .map(|el| {
            let value = el.value();
            let non_empty = |name: &str| {
                value
                    .attr(name)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            };
            let raw = value.attr("src").unwrap_or("").trim();
            ImageRef {
                src: resolve_src(raw, base),
                alt: non_empty("alt"),
                width: non_empty("width"),
                height: non_empty("height"),
            }
        })
        .collect()
}

fn resolve_src(raw: &str, base: Option<&Url>) -> String {
    if raw.is_empty() || raw.starts_with("data:") {
        return raw.to_string();
    }
    match Url::parse(raw) {
        Ok(url) => url.to_string(),
        Err(_) => base
            .and_then(|b| b.join(raw).ok())
            .map(|u| u.to_string())
            .unwrap_or_else(|| raw.to_string()),
    }
}

/// `<img>` carrying only src, alt, width and height.
pub fn image_html(img: &ImageRef) -> String {
    let mut attrs: Vec<(&str, &str)> = vec![("src", img.src.as_str())];
    for (name, value) in [("alt", &img.alt), ("width", &img.width), ("height", &img.height)] {
        if let Some(v) = value {
            attrs.push((name, v.as_str()));
        }
    }
    let mut out = String::new();
    write_open_tag(&mut out, "img", attrs);
    out
}

/// One standard `<img>` per line.
pub fn multi_image_html(images: &[ImageRef]) -> String {
    images
        .iter()
        .map(|img| image_html(img) + "\n")
        .collect()
}

/// Raw bytes of a captured image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub mime: String,
    pub bytes: Bytes,
}

/// Decode a base64 `data:image/...` URL.
pub fn decode_data_url(src: &str) -> Result<ImageBlob> {
    let rest = src
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("not a data url"))?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("data url has no payload"))?;
    let mut parts = header.split(';');
    let mime = match parts.next().map(str::trim) {
        Some(m) if !m.is_empty() => m.to_ascii_lowercase(),
        _ => "image/png".to_string(),
    };
    if !mime.starts_with("image/") {
        bail!("data url is not an image: {}", mime);
    }
    if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        bail!("only base64 data urls are supported");
    }
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .context("invalid base64 in data url")?;
    Ok(ImageBlob {
        mime,
        bytes: Bytes::from(bytes),
    })
}

/// Decode any supported raster format and re-encode it as PNG.
pub fn reencode_png(bytes: &[u8]) -> Result<Bytes> {
    let decoded = image::load_from_memory(bytes).context("unsupported image data")?;
    let mut out = Cursor::new(Vec::new());
    decoded
        .write_to(&mut out, ImageFormat::Png)
        .context("png encode failed")?;
    Ok(Bytes::from(out.into_inner()))
}

/// Binary capture of a single image, bounded by a timeout.
#[derive(Debug, Clone)]
pub struct ImageCapture {
    client: reqwest::Client,
    timeout: Duration,
}

impl ImageCapture {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Capture `img` as raw bytes. Timeouts and failures are image errors.
    pub async fn capture(&self, img: &ImageRef) -> Result<ImageBlob, CopyError> {
        match tokio::time::timeout(self.timeout, self.capture_inner(img)).await {
            Ok(Ok(blob)) => {
                debug!(mime = %blob.mime, bytes = blob.bytes.len(), "image captured");
                Ok(blob)
            }
            Ok(Err(err)) => {
                warn!(src = %truncate_src(&img.src), error = %err, "image capture failed");
                Err(CopyError::image("capture", Some(err)))
            }
            Err(_) => {
                warn!(src = %truncate_src(&img.src), timeout_ms = self.timeout.as_millis() as u64, "image capture timed out");
                Err(CopyError::image(
                    "capture",
                    Some(anyhow!("timed out after {}ms", self.timeout.as_millis())),
                ))
            }
        }
    }

    async fn capture_inner(&self, img: &ImageRef) -> Result<ImageBlob> {
        if img.is_data_url() {
            return decode_data_url(&img.src);
        }
        if img.src.is_empty() {
            bail!("image has no source");
        }
        let url = Url::parse(&img.src).with_context(|| format!("invalid image url {}", img.src))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("image request failed")?
            .error_for_status()
            .context("image request rejected")?;
        if let Some(len) = response.content_length() {
            if len as usize > MAX_IMAGE_BYTES {
                bail!("image too large: {} bytes", len);
            }
        }
        let body = response.bytes().await.context("image body read failed")?;
        if body.len() > MAX_IMAGE_BYTES {
            bail!("image too large: {} bytes", body.len());
        }
        Ok(ImageBlob {
            mime: "image/png".to_string(),
            bytes: reencode_png(&body)?,
        })
    }
}

fn truncate_src(src: &str) -> String {
    if src.chars().count() <= 80 {
        return src.to_string();
    }
    let head: String = src.chars().take(80).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collects_standard_attributes() {
        let frag = ContentFragment::parse(
            r#"<p><img src="/a.png" alt="A" width="10" class="x" data-id="1"><img src="data:image/gif;base64,R0lG"></p>"#,
        );
        let base = Url::parse("https://example.feishu.cn/docx/abc").unwrap();
        let images = collect_images(&frag, Some(&base));
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].src, "https://example.feishu.cn/a.png");
        assert_eq!(images[0].alt.as_deref(), Some("A"));
        assert_eq!(images[0].width.as_deref(), Some("10"));
        assert_eq!(images[0].height, None);
        assert!(images[1].is_data_url());
    }

    #[test]
    fn image_html_has_only_standard_attributes() {
        let img = ImageRef {
            src: "a.png".into(),
            alt: Some("a \"quoted\"".into()),
            width: None,
            height: Some("4".into()),
        };
        assert_eq!(
            image_html(&img),
            r#"<img src="a.png" alt="a &quot;quoted&quot;" height="4" />"#
        );
    }

    #[test]
    fn multi_image_html_one_per_line() {
        let imgs = vec![
            ImageRef {
                src: "a.png".into(),
                ..Default::default()
            },
            ImageRef {
                src: "b.png".into(),
                ..Default::default()
            },
        ];
        assert_eq!(
            multi_image_html(&imgs),
            "<img src=\"a.png\" />\n<img src=\"b.png\" />\n"
        );
    }

    #[test]
    fn decodes_base64_data_url() {
        let blob = decode_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(blob.mime, "image/png");
        assert_eq!(&blob.bytes[..], b"hello");
    }

    #[test]
    fn rejects_bad_data_urls() {
        assert!(decode_data_url("data:text/plain;base64,aGk=").is_err());
        assert!(decode_data_url("data:image/png,raw").is_err());
        assert!(decode_data_url("data:image/png;base64,***").is_err());
    }

    #[test]
    fn reencodes_to_png() {
        let mut bmp = Cursor::new(Vec::new());
        image::RgbImage::new(2, 2)
            .write_to(&mut bmp, ImageFormat::Bmp)
            .unwrap();
        let png = reencode_png(bmp.get_ref()).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn data_url_capture_skips_network() {
        let capture = ImageCapture::new(reqwest::Client::new(), DEFAULT_IMAGE_TIMEOUT);
        let img = ImageRef {
            src: "data:image/jpeg;base64,AAEC".into(),
            ..Default::default()
        };
        let blob = capture.capture(&img).await.unwrap();
        assert_eq!(blob.mime, "image/jpeg");
        assert_eq!(&blob.bytes[..], &[0u8, 1, 2][..]);
    }
}
