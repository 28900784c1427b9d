use serde::{Deserialize, Serialize};

pub mod error;
pub mod mime;
pub mod naming;
pub mod options;
pub mod task_id;

pub use error::RelayError;
pub use mime::{effective_mime, sniff_image, ImageMime};
pub use task_id::{find_task_id, TaskIdPattern};

// --- Inputs ---

/// A file sent inline as base64, optionally as a `data:` URL.
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct InlineFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "contentType", alias = "type")]
    pub content_type: Option<String>,
    pub data: String,
}

impl InlineFile {
    /// Split a `data:<mime>;base64,<payload>` URL. Plain base64 is returned as is.
    /// The mime embedded in a data URL is used when no content type was declared.
    pub fn payload(&self) -> (&str, Option<&str>) {
        let declared = self.content_type.as_deref().filter(|s| !s.trim().is_empty());
        let data = self.data.trim();
        if let Some(rest) = data.strip_prefix("data:") {
            if let Some((meta, body)) = rest.split_once(',') {
                let embedded = meta
                    .split(';')
                    .next()
                    .filter(|m| !m.is_empty());
                return (body, declared.or(embedded));
            }
        }
        (data, declared)
    }
}

/// Where an image to rehost comes from.
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
#[serde(untagged)]
pub enum ImageSource {
    Url(String),
    Remote { url: String },
    Inline(InlineFile),
}

// --- Outputs ---

/// Result of a successful fetch/upload/verify cycle.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct RehostOutcome {
    pub url: String,
    pub mime: ImageMime,
    pub size: usize,
    pub file_name: String,
    /// 1 when the first upload verified, 2 after the single retry.
    pub attempts: u8,
}

/// Signed direct-upload target handed to browsers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct SignedUpload {
    pub upload_url: String,
    pub public_url: String,
    pub bucket: String,
    pub object_path: String,
}
