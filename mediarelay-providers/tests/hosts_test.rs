// Integration tests for the KIE and Supabase upload hosts against a mock HTTP server

use base64::Engine;
use mediarelay_common::ImageMime;
use mediarelay_providers::kie::KieUploadHost;
use mediarelay_providers::supabase::{SupabaseConfig, SupabaseStorageHost};
use mediarelay_providers::ImageHost;
use mockito::Matcher;
use serde_json::json;

const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x01, 0x02];

fn kie_host(server: &mockito::ServerGuard) -> KieUploadHost {
    KieUploadHost::new(
        "kie-key".into(),
        format!("{}/api/file-base64-upload", server.url()),
        "/images/user-uploads/".into(),
    )
    .unwrap()
}

fn supabase_host(server: &mockito::ServerGuard) -> SupabaseStorageHost {
    SupabaseStorageHost::new(SupabaseConfig {
        url: format!("{}/", server.url()),
        bucket: "media".into(),
        service_key: "service-key".into(),
        sign_expires_secs: 600,
        path_prefix: "uploads".into(),
    })
    .unwrap()
}

const SIGN_PATH: &str = r"^/storage/v1/object/upload/sign/media/uploads/\d{4}/\d{2}/\d{2}/cat-1\.png$";

#[tokio::test]
async fn kie_upload_posts_data_url_and_returns_download_url() {
    let mut server = mockito::Server::new_async().await;
    let encoded = base64::engine::general_purpose::STANDARD.encode(PNG);
    let upload = server
        .mock("POST", "/api/file-base64-upload")
        .match_header("authorization", "Bearer kie-key")
        .match_body(Matcher::PartialJson(json!({
            "base64Data": format!("data:image/png;base64,{}", encoded),
            "uploadPath": "images/user-uploads",
            "fileName": "cat-1.png"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {"downloadUrl": "https://files.kie.example/cat-1.png"}}"#)
        .expect(1)
        .create_async()
        .await;

    let out = kie_host(&server)
        .upload(PNG, "cat-1.png", ImageMime::Png)
        .await
        .unwrap();

    assert_eq!(out.public_url, "https://files.kie.example/cat-1.png");
    assert_eq!(out.object_path.as_deref(), Some("images/user-uploads/cat-1.png"));
    upload.assert_async().await;
}

#[tokio::test]
async fn kie_upload_error_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/file-base64-upload")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let err = kie_host(&server)
        .upload(PNG, "cat-1.png", ImageMime::Png)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn kie_upload_reply_without_usable_url() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/file-base64-upload")
        .with_status(200)
        .with_body(r#"{"success": true, "data": {}}"#)
        .create_async()
        .await;
    let host = kie_host(&server);

    let err = host.upload(PNG, "a.png", ImageMime::Png).await.unwrap_err();
    assert!(err.to_string().contains("downloadUrl"));

    server.reset_async().await;
    server
        .mock("POST", "/api/file-base64-upload")
        .with_status(200)
        .with_body(r#"{"data": {"downloadUrl": "/relative/a.png"}}"#)
        .create_async()
        .await;
    assert!(host.upload(PNG, "a.png", ImageMime::Png).await.is_err());
}

#[tokio::test]
async fn supabase_upload_signs_then_puts() {
    let mut server = mockito::Server::new_async().await;
    let sign = server
        .mock("POST", Matcher::Regex(SIGN_PATH.to_string()))
        .match_header("authorization", "Bearer service-key")
        .match_body(Matcher::PartialJson(json!({
            "contentType": "image/png",
            "upsert": true,
            "expiresIn": 600
        })))
        .with_status(200)
        .with_body(r#"{"signedURL": "/object/upload/sign/media/uploads/cat-1.png?token=t0k"}"#)
        .expect(1)
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/storage/v1/object/upload/sign/media/uploads/cat-1.png?token=t0k")
        .match_header("content-type", "image/png")
        .with_status(200)
        .with_body(r#"{"Key": "media/uploads/cat-1.png"}"#)
        .expect(1)
        .create_async()
        .await;

    let out = supabase_host(&server)
        .upload(PNG, "cat-1.png", ImageMime::Png)
        .await
        .unwrap();

    let public_prefix = format!("{}/storage/v1/object/public/media/uploads/", server.url());
    assert!(out.public_url.starts_with(&public_prefix));
    assert!(out.public_url.ends_with("/cat-1.png"));
    let object_path = out.object_path.unwrap();
    assert!(object_path.starts_with("uploads/"));
    assert!(object_path.ends_with("/cat-1.png"));
    sign.assert_async().await;
    put.assert_async().await;
}

#[tokio::test]
async fn supabase_put_conflict_counts_as_stored() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", Matcher::Regex(SIGN_PATH.to_string()))
        .with_status(200)
        .with_body(r#"{"url": "/storage/v1/object/upload/sign/media/x?token=t"}"#)
        .create_async()
        .await;
    server
        .mock("PUT", "/storage/v1/object/upload/sign/media/x?token=t")
        .with_status(409)
        .with_body(r#"{"error": "Duplicate"}"#)
        .create_async()
        .await;

    let out = supabase_host(&server)
        .upload(PNG, "cat-1.png", ImageMime::Png)
        .await
        .unwrap();
    assert!(out.public_url.ends_with("/cat-1.png"));
}

#[tokio::test]
async fn supabase_put_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", Matcher::Regex(SIGN_PATH.to_string()))
        .with_status(200)
        .with_body(r#"{"signedUrl": "/object/upload/sign/media/x?token=t"}"#)
        .create_async()
        .await;
    server
        .mock("PUT", "/storage/v1/object/upload/sign/media/x?token=t")
        .with_status(500)
        .with_body("storage down")
        .create_async()
        .await;

    let err = supabase_host(&server)
        .upload(PNG, "cat-1.png", ImageMime::Png)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn supabase_sign_failures_skip_the_put() {
    let mut server = mockito::Server::new_async().await;
    let put = server
        .mock("PUT", Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    server
        .mock("POST", Matcher::Regex(SIGN_PATH.to_string()))
        .with_status(200)
        .with_body(r#"{"token": "t"}"#)
        .create_async()
        .await;
    let host = supabase_host(&server);

    let err = host.upload(PNG, "cat-1.png", ImageMime::Png).await.unwrap_err();
    assert!(err.to_string().contains("no signed url"));

    server
        .mock("POST", Matcher::Regex(r"^/storage/v1/object/upload/sign/media/uploads/.+/other\.png$".to_string()))
        .with_status(403)
        .with_body(r#"{"error": "Unauthorized"}"#)
        .create_async()
        .await;
    let err = host.upload(PNG, "other.png", ImageMime::Png).await.unwrap_err();
    assert!(err.to_string().contains("403"));
    put.assert_async().await;
}
