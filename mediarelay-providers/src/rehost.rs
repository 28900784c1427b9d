//! Fetch, sniff, upload and verify images before handing them to a
//! generation API.
//!
//! Per file: `fetching -> sniffing -> {rejected | uploading} -> verifying ->
//! {done | retried-once -> {done | failed}}`. Only a failed verification is
//! retried, and only once, under a new file name.

use crate::ImageHost;
use base64::Engine;
use mediarelay_common::naming::unique_file_name;
use mediarelay_common::{effective_mime, ImageSource, InlineFile, RehostOutcome, RelayError};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const MAX_ATTEMPTS: u8 = 2;

#[derive(Debug, Clone)]
pub struct RehostConfig {
    pub max_files: usize,
    pub max_file_bytes: usize,
    pub fetch_timeout: Duration,
    pub verify_timeout: Duration,
}

impl Default for RehostConfig {
    fn default() -> Self {
        Self {
            max_files: 4,
            max_file_bytes: 10 * 1024 * 1024,
            fetch_timeout: Duration::from_secs(30),
            verify_timeout: Duration::from_secs(10),
        }
    }
}

/// What the verification GET saw at a rehosted URL.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedImage {
    pub content_type: String,
    /// Length of the first non-empty chunk; the rest of the body is not read.
    pub sampled_bytes: usize,
}

pub struct Rehoster {
    fetch_client: Client,
    verify_client: Client,
    host: Arc<dyn ImageHost>,
    config: RehostConfig,
}

fn file_name_from_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|segs| segs.filter(|s| !s.is_empty()).last())
        .map(|s| urlencoding::decode(s).map(|d| d.into_owned()).unwrap_or_else(|_| s.to_string()))
        .unwrap_or_else(|| "image".to_string())
}

enum CappedBody {
    Complete(Vec<u8>),
    TooLarge,
}

/// Read a body chunk by chunk, stopping as soon as it grows past `max` bytes.
async fn read_capped(mut resp: reqwest::Response, max: usize) -> reqwest::Result<CappedBody> {
    let mut buf = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        if buf.len() + chunk.len() > max {
            return Ok(CappedBody::TooLarge);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(CappedBody::Complete(buf))
}

/// Length of the first non-empty chunk, 0 when the body is empty.
async fn first_chunk_len(mut resp: reqwest::Response) -> reqwest::Result<usize> {
    while let Some(chunk) = resp.chunk().await? {
        if !chunk.is_empty() {
            return Ok(chunk.len());
        }
    }
    Ok(0)
}

fn header_str(resp: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
}

impl Rehoster {
    pub fn new(host: Arc<dyn ImageHost>, config: RehostConfig) -> anyhow::Result<Self> {
        let fetch_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.fetch_timeout)
            .build()?;
        let verify_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.verify_timeout)
            .build()?;
        Ok(Self {
            fetch_client,
            verify_client,
            host,
            config,
        })
    }

    pub fn host_name(&self) -> &'static str {
        self.host.name()
    }

    /// Rehost every source in input order. The first failure aborts the batch.
    pub async fn rehost_all(&self, sources: &[ImageSource]) -> Result<Vec<RehostOutcome>, RelayError> {
        if sources.len() > self.config.max_files {
            return Err(RelayError::malformed(format!(
                "too many files: {} (max {})",
                sources.len(),
                self.config.max_files
            )));
        }

        let mut out = Vec::with_capacity(sources.len());
        for (idx, source) in sources.iter().enumerate() {
            let outcome = match source {
                ImageSource::Url(url) | ImageSource::Remote { url } => self.rehost_url(url).await,
                ImageSource::Inline(file) => self.rehost_inline(file).await,
            };
            match outcome {
                Ok(o) => out.push(o),
                Err(e) => {
                    tracing::warn!(index = idx, error = %e, "rehost aborted");
                    return Err(e);
                }
            }
        }
        Ok(out)
    }

    pub async fn rehost_url(&self, url: &str) -> Result<RehostOutcome, RelayError> {
        let url = url.trim();
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| RelayError::malformed(format!("invalid url {:?}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RelayError::malformed(format!("unsupported url scheme: {}", parsed.scheme())));
        }

        tracing::info!(url = %parsed, "fetching source image");
        let resp = self
            .fetch_client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|e| RelayError::FetchFailed {
                url: url.to_string(),
                reason: if e.is_timeout() {
                    "timed out".to_string()
                } else {
                    e.to_string()
                },
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::FetchFailed {
                url: url.to_string(),
                reason: format!("status {}", status.as_u16()),
            });
        }
        if let Some(len) = resp.content_length() {
            if len > self.config.max_file_bytes as u64 {
                return Err(RelayError::PayloadTooLarge {
                    max: self.config.max_file_bytes,
                });
            }
        }

        let declared = header_str(&resp, reqwest::header::CONTENT_TYPE);
        let bytes = match read_capped(resp, self.config.max_file_bytes).await {
            Ok(CappedBody::Complete(bytes)) => bytes,
            Ok(CappedBody::TooLarge) => {
                tracing::warn!(url = %parsed, max = self.config.max_file_bytes, "source body over limit");
                return Err(RelayError::PayloadTooLarge {
                    max: self.config.max_file_bytes,
                });
            }
            Err(e) => {
                return Err(RelayError::FetchFailed {
                    url: url.to_string(),
                    reason: format!("body read failed: {}", e),
                })
            }
        };

        self.rehost_bytes(&bytes, &file_name_from_url(&parsed), declared.as_deref())
            .await
    }

    pub async fn rehost_inline(&self, file: &InlineFile) -> Result<RehostOutcome, RelayError> {
        let (payload, declared) = file.payload();
        if payload.is_empty() {
            return Err(RelayError::malformed("file payload is empty"));
        }
        // base64 inflates by 4/3; reject before decoding anything absurd
        if payload.len() / 4 * 3 > self.config.max_file_bytes + 3 {
            return Err(RelayError::PayloadTooLarge {
                max: self.config.max_file_bytes,
            });
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| RelayError::malformed(format!("file data is not valid base64: {}", e)))?;

        let name = file.name.as_deref().unwrap_or("image");
        self.rehost_bytes(&bytes, name, declared).await
    }

    pub async fn rehost_bytes(
        &self,
        bytes: &[u8],
        name: &str,
        declared: Option<&str>,
    ) -> Result<RehostOutcome, RelayError> {
        if bytes.is_empty() {
            return Err(RelayError::malformed("file is empty"));
        }
        if bytes.len() > self.config.max_file_bytes {
            return Err(RelayError::PayloadTooLarge {
                max: self.config.max_file_bytes,
            });
        }

        let mime = match effective_mime(bytes, declared) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(name, declared = ?declared, error = %e, "rejected file");
                return Err(e);
            }
        };

        let mut attempt = 1;
        loop {
            let file_name = unique_file_name(name, mime.extension());
            tracing::info!(
                host = self.host.name(),
                file_name = %file_name,
                mime = %mime,
                size = bytes.len(),
                attempt,
                "uploading"
            );

            let uploaded = self
                .host
                .upload(bytes, &file_name, mime)
                .await
                .map_err(|e| RelayError::upstream(self.host.name(), None, json!(format!("{:#}", e))))?;
            tracing::debug!(
                url = %uploaded.public_url,
                object_path = uploaded.object_path.as_deref().unwrap_or("-"),
                "uploaded"
            );

            match self.verify(&uploaded.public_url).await {
                Ok(seen) => {
                    tracing::info!(
                        url = %uploaded.public_url,
                        content_type = %seen.content_type,
                        sampled_bytes = seen.sampled_bytes,
                        attempt,
                        "rehost verified"
                    );
                    return Ok(RehostOutcome {
                        url: uploaded.public_url,
                        mime,
                        size: bytes.len(),
                        file_name,
                        attempts: attempt,
                    });
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(error = %e, attempt, "verification failed, retrying under a new name");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// The URL must answer 2xx with an `image/*` content type and a non-empty body.
    pub async fn verify(&self, url: &str) -> Result<VerifiedImage, RelayError> {
        let fail = |reason: String| RelayError::VerificationFailed {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .verify_client
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| {
                fail(if e.is_timeout() {
                    "timed out".to_string()
                } else {
                    e.to_string()
                })
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(fail(format!("status {}", status.as_u16())));
        }
        let content_type = header_str(&resp, reqwest::header::CONTENT_TYPE).unwrap_or_default();
        if !content_type.to_ascii_lowercase().starts_with("image/") {
            return Err(fail(format!("content-type {:?} is not an image", content_type)));
        }
        let sampled_bytes = first_chunk_len(resp)
            .await
            .map_err(|e| fail(format!("body read failed: {}", e)))?;
        if sampled_bytes == 0 {
            return Err(fail("empty body".to_string()));
        }

        Ok(VerifiedImage {
            content_type,
            sampled_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_from_urls() {
        let u = reqwest::Url::parse("https://cdn.example/a/b/My%20Cat.png?x=1").unwrap();
        assert_eq!(file_name_from_url(&u), "My Cat.png");
        let u = reqwest::Url::parse("https://cdn.example/").unwrap();
        assert_eq!(file_name_from_url(&u), "image");
        let u = reqwest::Url::parse("https://cdn.example/dir/").unwrap();
        assert_eq!(file_name_from_url(&u), "dir");
    }
}
