use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mediarelay_common::RelayError;
use serde_json::json;

/// HTTP face of [`RelayError`].
#[derive(Debug)]
pub struct ApiError(pub RelayError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RelayError::MissingConfiguration(_) | RelayError::InvalidConfiguration { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            RelayError::UnsupportedMedia { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RelayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::UpstreamFailure {
                status: Some(code), ..
            } => StatusCode::from_u16(*code)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            RelayError::FetchFailed { .. }
            | RelayError::UpstreamFailure { .. }
            | RelayError::MissingTaskId { .. }
            | RelayError::VerificationFailed { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        ApiError(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(RelayError::MalformedInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.code(), "request failed");
        } else {
            tracing::warn!(error = %self.0, code = self.0.code(), "request rejected");
        }

        let mut body = json!({
            "ok": false,
            "error": self.0.code(),
            "message": self.0.to_string(),
        });
        match &self.0 {
            RelayError::UpstreamFailure {
                service,
                status,
                detail,
            } => {
                body["service"] = json!(service);
                body["upstream_status"] = json!(status);
                body["detail"] = detail.clone();
            }
            RelayError::MissingTaskId { body: upstream } => {
                body["detail"] = upstream.clone();
            }
            RelayError::UnsupportedMedia { mime } => {
                body["mime"] = json!(mime);
                body["allowed"] = json!(["image/jpeg", "image/png", "image/webp", "image/gif"]);
            }
            RelayError::FetchFailed { url, .. } | RelayError::VerificationFailed { url, .. } => {
                body["url"] = json!(url);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}
