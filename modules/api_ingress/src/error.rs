use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::request_id::XRequestId;

/// Host-level failures that never reach a module handler.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("no route for {0}")]
    NotFound(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

/// `AppError` paired with the request id it happened under.
pub struct AppErrorResponse {
    pub error: AppError,
    pub request_id: Option<String>,
}

impl IntoResponse for AppErrorResponse {
    fn into_response(self) -> Response {
        let (status, code) = match &self.error {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        };

        tracing::warn!(
            request_id = self.request_id.as_deref().unwrap_or("n/a"),
            error = %self.error,
            status = status.as_u16(),
            "request failed"
        );

        let body = ErrorBody {
            code,
            message: self.error.to_string(),
            request_id: self.request_id,
        };
        (status, Json(body)).into_response()
    }
}

/// Router fallback for unknown paths.
pub async fn not_found(uri: Uri, rid: Option<Extension<XRequestId>>) -> AppErrorResponse {
    AppErrorResponse {
        error: AppError::NotFound(uri.path().to_string()),
        request_id: rid.map(|Extension(XRequestId(id))| id),
    }
}
