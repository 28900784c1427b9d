use crate::{ImageHost, UploadedObject};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use mediarelay_common::naming::{dated_object_path, extension_for_content_type, unique_file_name};
use mediarelay_common::{ImageMime, SignedUpload};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub bucket: String,
    pub service_key: String,
    pub sign_expires_secs: u64,
    pub path_prefix: String,
}

/// Supabase Storage through signed upload URLs.
pub struct SupabaseStorageHost {
    client: Client,
    config: SupabaseConfig,
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl SupabaseStorageHost {
    pub fn new(mut config: SupabaseConfig) -> Result<Self> {
        config.url = config.url.trim().trim_end_matches('/').to_string();
        config.service_key = config.service_key.trim().to_string();
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build Supabase http client")?;
        Ok(Self { client, config })
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    pub fn public_url(&self, object_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url,
            urlencoding::encode(&self.config.bucket),
            encode_path(object_path)
        )
    }

    /// The signing endpoint answers with a path that may or may not carry the
    /// `/storage/v1` prefix; full URLs are passed through.
    fn absolutize(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            return signed.to_string();
        }
        let path = if signed.starts_with("/storage/v1/") {
            signed.to_string()
        } else if signed.starts_with('/') {
            format!("/storage/v1{}", signed)
        } else {
            format!("/storage/v1/{}", signed)
        };
        format!("{}{}", self.config.url, path)
    }

    async fn sign_object(&self, object_path: &str, content_type: &str) -> Result<String> {
        let url = format!(
            "{}/storage/v1/object/upload/sign/{}/{}",
            self.config.url,
            urlencoding::encode(&self.config.bucket),
            encode_path(object_path)
        );
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.service_key)
            .json(&json!({
                "contentType": content_type,
                "upsert": true,
                "expiresIn": self.config.sign_expires_secs,
            }))
            .send()
            .await
            .context("Supabase sign request failed")?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!("Supabase sign returned {}: {}", status, text));
        }
        let data: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        let signed = ["signedUrl", "signedURL", "url"]
            .iter()
            .find_map(|k| data.get(*k).and_then(Value::as_str))
            .ok_or_else(|| anyhow!("Supabase sign reply has no signed url: {}", text))?;
        Ok(self.absolutize(signed))
    }

    /// Reserve a fresh object and return where a client should PUT it.
    pub async fn sign_upload(&self, file_name: &str, content_type: &str) -> Result<SignedUpload> {
        let content_type = if content_type.trim().is_empty() {
            "application/octet-stream"
        } else {
            content_type.trim()
        };
        let name = unique_file_name(file_name, extension_for_content_type(content_type));
        let object_path = dated_object_path(&self.config.path_prefix, &name, chrono::Utc::now());
        let upload_url = self.sign_object(&object_path, content_type).await?;

        Ok(SignedUpload {
            upload_url,
            public_url: self.public_url(&object_path),
            bucket: self.config.bucket.clone(),
            object_path,
        })
    }
}

#[async_trait]
impl ImageHost for SupabaseStorageHost {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn upload(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime: ImageMime,
    ) -> Result<UploadedObject> {
        let object_path = dated_object_path(&self.config.path_prefix, file_name, chrono::Utc::now());
        let upload_url = self.sign_object(&object_path, mime.as_str()).await?;

        let resp = self
            .client
            .put(&upload_url)
            .header(reqwest::header::CONTENT_TYPE, mime.as_str())
            .body(bytes.to_vec())
            .send()
            .await
            .context("Supabase object upload failed")?;

        let status = resp.status();
        // 409: object already there, which with upsert only happens on a replayed PUT
        if !status.is_success() && status != reqwest::StatusCode::CONFLICT {
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Supabase upload returned {}: {}", status, text));
        }

        Ok(UploadedObject {
            public_url: self.public_url(&object_path),
            object_path: Some(object_path),
        })
    }
}
