use crate::{ImageHost, TaskApi, UploadedObject, UpstreamReply};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use mediarelay_common::ImageMime;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.kie.ai";
pub const DEFAULT_UPLOAD_URL: &str = "https://kieai.redpandaai.co/api/file-base64-upload";
pub const DEFAULT_UPLOAD_PATH: &str = "images/user-uploads";

fn bearer_headers(api_key: &str) -> Result<reqwest::header::HeaderMap> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::AUTHORIZATION,
        reqwest::header::HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .context("KIE api key is not a valid header value")?,
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    Ok(headers)
}

fn build_client(timeout: Duration) -> Result<Client> {
    // Without an overall timeout a stalled upstream would hold the request forever.
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(timeout)
        .build()
        .context("failed to build KIE http client")
}

/// KIE's base64 file uploader.
pub struct KieUploadHost {
    client: Client,
    api_key: String,
    upload_url: String,
    upload_path: String,
}

impl KieUploadHost {
    pub fn new(api_key: String, upload_url: String, upload_path: String) -> Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_secs(60))?,
            api_key: api_key.trim().to_string(),
            upload_url,
            upload_path: upload_path.trim_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ImageHost for KieUploadHost {
    fn name(&self) -> &'static str {
        "kie_upload"
    }

    async fn upload(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime: ImageMime,
    ) -> Result<UploadedObject> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let body = json!({
            "base64Data": format!("data:{};base64,{}", mime.as_str(), encoded),
            "uploadPath": self.upload_path,
            "fileName": file_name,
        });

        let resp = self
            .client
            .post(&self.upload_url)
            .headers(bearer_headers(&self.api_key)?)
            .json(&body)
            .send()
            .await
            .context("KIE upload request failed")?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!("KIE upload returned {}: {}", status, text));
        }

        let reply: Value = serde_json::from_str(&text)
            .with_context(|| format!("KIE upload returned non-JSON body: {}", text))?;
        let public_url = reply
            .pointer("/data/downloadUrl")
            .and_then(Value::as_str)
            .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
            .ok_or_else(|| anyhow!("KIE upload reply has no downloadUrl: {}", reply))?;

        Ok(UploadedObject {
            public_url: public_url.to_string(),
            object_path: Some(format!("{}/{}", self.upload_path, file_name)),
        })
    }
}

/// KIE job creation (`/api/v1/jobs/createTask`).
pub struct KieTaskClient {
    client: Client,
    api_key: String,
    create_url: String,
}

impl KieTaskClient {
    pub fn new(api_key: String, base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_secs(30))?,
            api_key: api_key.trim().to_string(),
            create_url: format!("{}/api/v1/jobs/createTask", base_url.trim_end_matches('/')),
        })
    }

    pub fn create_url(&self) -> &str {
        &self.create_url
    }
}

#[async_trait]
impl TaskApi for KieTaskClient {
    async fn create_task(&self, payload: &Value) -> Result<UpstreamReply> {
        let resp = self
            .client
            .post(&self.create_url)
            .headers(bearer_headers(&self.api_key)?)
            .json(payload)
            .send()
            .await
            .context("KIE createTask request failed")?;

        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        tracing::debug!(status, "KIE createTask replied");
        Ok(UpstreamReply::from_text(status, &text))
    }
}
