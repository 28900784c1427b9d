use anyhow::Result;
use async_trait::async_trait;
use mediarelay_common::ImageMime;
use serde_json::Value;

pub mod kie;
pub mod mock;
pub mod rehost;
pub mod supabase;

pub use rehost::{RehostConfig, Rehoster, VerifiedImage};

/// Where a rehosted file ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedObject {
    pub public_url: String,
    /// Storage key, for backends that have one.
    pub object_path: Option<String>,
}

/// First-party storage a downstream API can fetch from.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Short backend name used in logs and error bodies.
    fn name(&self) -> &'static str;

    /// Store `bytes` under `file_name` and return the public URL.
    /// `file_name` is already unique; hosts must not reuse an earlier object.
    async fn upload(&self, bytes: &[u8], file_name: &str, mime: ImageMime)
        -> Result<UploadedObject>;
}

/// Raw reply of a job-creation call. Non-JSON bodies are wrapped as `{"raw": text}`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Value,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub(crate) fn from_text(status: u16, text: &str) -> Self {
        let body = serde_json::from_str(text)
            .unwrap_or_else(|_| serde_json::json!({ "raw": text }));
        Self { status, body }
    }
}

/// Asynchronous generation API that accepts task submissions.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn create_task(&self, payload: &Value) -> Result<UpstreamReply>;
}
