use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RelayError;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const RIFF_MAGIC: &[u8] = b"RIFF";
const WEBP_MAGIC: &[u8] = b"WEBP";
const GIF_MAGIC: &[u8] = b"GIF8";

/// Image formats we are willing to rehost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum ImageMime {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/webp")]
    Webp,
    #[serde(rename = "image/gif")]
    Gif,
}

impl ImageMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Png => "image/png",
            ImageMime::Webp => "image/webp",
            ImageMime::Gif => "image/gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "jpg",
            ImageMime::Png => "png",
            ImageMime::Webp => "webp",
            ImageMime::Gif => "gif",
        }
    }

    /// Map a declared content type onto the allow-list.
    /// Parameters (`; charset=...`) are ignored and the comparison is case-insensitive.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageMime::Jpeg),
            "image/png" | "image/x-png" => Some(ImageMime::Png),
            "image/webp" => Some(ImageMime::Webp),
            "image/gif" => Some(ImageMime::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identify an image by its leading magic bytes.
///
/// Returns `None` for anything that is not JPEG, PNG, WEBP or GIF, including
/// buffers too short to hold a full signature.
pub fn sniff_image(bytes: &[u8]) -> Option<ImageMime> {
    if bytes.starts_with(JPEG_MAGIC) {
        return Some(ImageMime::Jpeg);
    }
    if bytes.starts_with(PNG_MAGIC) {
        return Some(ImageMime::Png);
    }
    if bytes.starts_with(RIFF_MAGIC) && bytes.get(8..12) == Some(WEBP_MAGIC) {
        return Some(ImageMime::Webp);
    }
    if bytes.starts_with(GIF_MAGIC) {
        return Some(ImageMime::Gif);
    }
    None
}

/// Resolve the type we will upload the bytes as.
///
/// Sniffed bytes always win. A declared type is only consulted when sniffing
/// fails, and only if it claims an `image/` subtype from the allow-list.
pub fn effective_mime(bytes: &[u8], declared: Option<&str>) -> Result<ImageMime, RelayError> {
    if let Some(mime) = sniff_image(bytes) {
        return Ok(mime);
    }

    let declared = declared.map(str::trim).filter(|d| !d.is_empty());
    match declared {
        Some(d) if d.to_ascii_lowercase().starts_with("image/") => {
            ImageMime::from_content_type(d).ok_or_else(|| RelayError::UnsupportedMedia {
                mime: d.to_string(),
            })
        }
        Some(d) => Err(RelayError::UnsupportedMedia {
            mime: d.to_string(),
        }),
        None => Err(RelayError::UnsupportedMedia {
            mime: "unknown".to_string(),
        }),
    }
}
