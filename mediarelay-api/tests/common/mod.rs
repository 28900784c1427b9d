// Common test utilities and fixtures
#![allow(dead_code)]

use axum_test::TestServer;
use mediarelay_api::app::{create_cors, AppState};
use mediarelay_api::routes::create_router;
use mediarelay_api::Settings;
use mediarelay_providers::kie::KieTaskClient;
use mediarelay_providers::mock::MockImageHost;
use mediarelay_providers::supabase::SupabaseStorageHost;
use mediarelay_providers::TaskApi;
use mockito::{Matcher, ServerGuard};
use std::collections::HashMap;
use std::sync::Arc;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub fn png_bytes() -> Vec<u8> {
    let mut v = PNG_SIGNATURE.to_vec();
    v.extend_from_slice(b"\x00\x00\x00\rIHDR test image");
    v
}

pub fn jpeg_bytes() -> Vec<u8> {
    let mut v = vec![0xFF, 0xD8, 0xFF, 0xDB];
    v.extend_from_slice(b"quantisation tables");
    v
}

pub fn b64(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Running app plus the mock HTTP server standing in for every upstream:
/// the image host (`/hosted/...`), source images, the task API and storage.
pub struct TestApp {
    pub server: TestServer,
    pub host: Arc<MockImageHost>,
    pub upstream: ServerGuard,
}

impl TestApp {
    pub fn hosted_prefix(&self) -> String {
        format!("{}/hosted/", self.upstream.url())
    }

    /// Make every rehosted file fetchable as a PNG.
    pub async fn serve_hosted_images(&mut self) -> mockito::Mock {
        self.upstream
            .mock("GET", Matcher::Regex(r"^/hosted/.+$".to_string()))
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(png_bytes())
            .create_async()
            .await
    }

    pub async fn serve_source(&mut self, path: &str, content_type: &str, body: Vec<u8>) {
        self.upstream
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", content_type)
            .with_body(body)
            .create_async()
            .await;
    }
}

/// Start the app against the mock upload backend. `env` entries override the
/// defaults; an empty value unsets a key.
pub async fn spawn_app(env: &[(&str, &str)]) -> TestApp {
    let upstream = mockito::Server::new_async().await;

    let mut vars: HashMap<String, String> = HashMap::from([
        ("UPLOAD_BACKEND".to_string(), "mock".to_string()),
        ("MOCK_HOST_BASE_URL".to_string(), format!("{}/hosted", upstream.url())),
        ("KIE_API_KEY".to_string(), "test-key".to_string()),
        ("KIE_BASE_URL".to_string(), upstream.url()),
        ("VERIFY_TIMEOUT_SECS".to_string(), "5".to_string()),
        ("FETCH_TIMEOUT_SECS".to_string(), "5".to_string()),
    ]);
    for (k, v) in env {
        vars.insert(k.to_string(), v.replace("{upstream}", &upstream.url()));
    }
    let settings = Settings::from_lookup(|k| vars.get(k).cloned()).unwrap();

    let host = Arc::new(MockImageHost::new(
        settings.mock_host_base_url.clone().unwrap(),
    ));
    let tasks: Option<Arc<dyn TaskApi>> = settings.kie_api_key.clone().map(|key| {
        Arc::new(KieTaskClient::new(key, &settings.kie_base_url).unwrap()) as Arc<dyn TaskApi>
    });
    let storage = settings
        .supabase
        .clone()
        .map(|cfg| Arc::new(SupabaseStorageHost::new(cfg).unwrap()));

    let state = AppState::new(settings, host.clone(), tasks, storage).unwrap();
    let app = create_router(state.clone())
        .layer(create_cors())
        .with_state(state);

    TestApp {
        server: TestServer::new(app).unwrap(),
        host,
        upstream,
    }
}
