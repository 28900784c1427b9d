// Task submission: rehost the images, then hand the job to the generation API
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use mediarelay_common::options::{normalize_aspect_ratio, normalize_resolution};
use mediarelay_common::{find_task_id, ImageSource, RelayError, TaskIdPattern};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::app::AppState;
use crate::error::ApiError;

const DEFAULT_IMAGE_FIELD: &str = "image_urls";
const INPUT_NOT_OBJECT: &str = "input must be a JSON object";

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTaskRequest {
    pub model: String,
    /// Model input passed through to the upstream API.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub input: Value,
    #[serde(default)]
    pub images: Vec<ImageSource>,
    /// Input key that receives the rehosted URLs.
    #[serde(default)]
    pub image_field: Option<String>,
    #[serde(default, alias = "callBackUrl")]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateTaskResponse {
    pub ok: bool,
    pub submitted: bool,
    pub run_id: String,
    pub task_id: String,
    pub image_urls: Vec<String>,
}

/// Assemble the upstream payload. Generation options given at the top level
/// are normalised and override same-named keys in `input`.
fn build_payload(
    req: &CreateTaskRequest,
    image_urls: &[String],
    callback_url: Option<&str>,
) -> Result<Value, RelayError> {
    let mut input = match &req.input {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        _ => return Err(RelayError::malformed(INPUT_NOT_OBJECT)),
    };

    if !image_urls.is_empty() {
        let field = req
            .image_field
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_IMAGE_FIELD);
        input.insert(field.to_string(), json!(image_urls));
    }
    if let Some(ar) = req.aspect_ratio.as_deref() {
        input.insert("aspect_ratio".to_string(), json!(normalize_aspect_ratio(ar)));
    }
    if let Some(res) = req.resolution.as_deref() {
        input.insert("resolution".to_string(), json!(normalize_resolution(res)));
    }

    let mut payload = json!({
        "model": req.model.trim(),
        "input": Value::Object(input),
    });
    if let Some(cb) = callback_url {
        payload["callBackUrl"] = json!(cb);
    }
    Ok(payload)
}

#[utoipa::path(
    post,
    path = "/tasks",
    tag = "Tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task accepted upstream", body = CreateTaskResponse),
        (status = 400, description = "Malformed request"),
        (status = 415, description = "An image is not JPEG, PNG, WEBP or GIF"),
        (status = 500, description = "Task API not configured"),
        (status = 502, description = "Rehost failed, or the upstream reply carried no task id")
    )
)]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), ApiError> {
    let Json(req) = payload?;
    if req.model.trim().is_empty() {
        return Err(RelayError::malformed("missing model").into());
    }
    if !matches!(req.input, Value::Object(_) | Value::Null) {
        return Err(RelayError::malformed(INPUT_NOT_OBJECT).into());
    }
    let Some(tasks) = state.tasks.clone() else {
        return Err(RelayError::MissingConfiguration("KIE_API_KEY".to_string()).into());
    };

    let run_id = uuid::Uuid::new_v4().simple().to_string();
    tracing::info!(run_id = %run_id, model = %req.model, images = req.images.len(), "task submission");

    let rehosted = state.rehoster.rehost_all(&req.images).await?;
    let image_urls: Vec<String> = rehosted.into_iter().map(|o| o.url).collect();

    let callback_url = req
        .callback_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or(state.settings.callback_url.as_deref());
    let upstream_payload = build_payload(&req, &image_urls, callback_url)?;

    let reply = tasks.create_task(&upstream_payload).await.map_err(|e| {
        RelayError::upstream("task_api", None, json!(format!("{:#}", e)))
    })?;
    if !reply.is_success() {
        return Err(RelayError::upstream("task_api", Some(reply.status), reply.body).into());
    }

    let Some(task_id) = find_task_id(&reply.body, &TaskIdPattern::default()) else {
        return Err(RelayError::MissingTaskId { body: reply.body }.into());
    };
    tracing::info!(run_id = %run_id, task_id = %task_id, "task submitted");

    Ok((
        StatusCode::CREATED,
        Json(CreateTaskResponse {
            ok: true,
            submitted: true,
            run_id,
            task_id,
            image_urls,
        }),
    ))
}
