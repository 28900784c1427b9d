// Upload, rehost and direct-upload signing handlers
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use mediarelay_common::{ImageSource, InlineFile, RehostOutcome, RelayError, SignedUpload};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::app::AppState;
use crate::error::ApiError;

// --- DTOs ---

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UploadRequest {
    #[serde(default)]
    pub files: Vec<InlineFile>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RehostRequest {
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct RehostResponse {
    pub ok: bool,
    pub urls: Vec<String>,
    pub files: Vec<RehostOutcome>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignUploadRequest {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub mime: String,
}

impl From<Vec<RehostOutcome>> for RehostResponse {
    fn from(files: Vec<RehostOutcome>) -> Self {
        Self {
            ok: true,
            urls: files.iter().map(|f| f.url.clone()).collect(),
            files,
        }
    }
}

// --- Handlers ---

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Media",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Files rehosted and verified, in input order", body = RehostResponse),
        (status = 400, description = "Missing, malformed or too many files"),
        (status = 413, description = "A file exceeds the size limit"),
        (status = 415, description = "A file is not JPEG, PNG, WEBP or GIF"),
        (status = 502, description = "Upload host failed or the rehosted URL did not verify")
    )
)]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<RehostResponse>, ApiError> {
    let Json(req) = payload?;
    if req.files.is_empty() {
        return Err(RelayError::malformed("no files").into());
    }

    let sources: Vec<ImageSource> = req.files.into_iter().map(ImageSource::Inline).collect();
    let files = state.rehoster.rehost_all(&sources).await?;
    Ok(Json(files.into()))
}

#[utoipa::path(
    post,
    path = "/rehost",
    tag = "Media",
    request_body = RehostRequest,
    responses(
        (status = 200, description = "Remote images fetched, rehosted and verified", body = RehostResponse),
        (status = 400, description = "Missing or invalid URLs"),
        (status = 415, description = "A source is not JPEG, PNG, WEBP or GIF"),
        (status = 502, description = "Fetch, upload or verification failed")
    )
)]
pub async fn rehost_urls(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RehostRequest>, JsonRejection>,
) -> Result<Json<RehostResponse>, ApiError> {
    let Json(req) = payload?;
    let sources: Vec<ImageSource> = req
        .urls
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .map(ImageSource::Url)
        .collect();
    if sources.is_empty() {
        return Err(RelayError::malformed("no urls").into());
    }

    let files = state.rehoster.rehost_all(&sources).await?;
    Ok(Json(files.into()))
}

#[utoipa::path(
    post,
    path = "/sign-upload",
    tag = "Media",
    request_body = SignUploadRequest,
    responses(
        (status = 200, description = "Signed PUT target and the public URL it will serve from", body = SignedUpload),
        (status = 500, description = "Storage signing is not configured"),
        (status = 502, description = "Storage refused to sign")
    )
)]
pub async fn sign_upload(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignUploadRequest>, JsonRejection>,
) -> Result<Json<SignedUpload>, ApiError> {
    let Json(req) = payload?;
    let Some(storage) = state.storage.as_ref() else {
        return Err(RelayError::MissingConfiguration("SUPABASE_URL".to_string()).into());
    };

    let signed = storage
        .sign_upload(&req.filename, &req.mime.to_ascii_lowercase())
        .await
        .map_err(|e| RelayError::upstream("supabase", None, serde_json::json!(format!("{:#}", e))))?;

    tracing::info!(object_path = %signed.object_path, bucket = %signed.bucket, "signed direct upload");
    Ok(Json(signed))
}
