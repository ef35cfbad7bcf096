//! Mapping from core errors to HTTP responses.
//!
//! Every failure is returned as `{"detail": ...}`. The detail is a string, except for
//! validation failures where it is the list of field violations.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pms_core::PatientError;
use serde_json::{json, Value};

/// Error body returned by every failing endpoint.
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorRes {
    /// Human-readable message, or a list of `{field, message}` objects for validation failures
    #[schema(value_type = Object)]
    pub detail: Value,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: Value::String(detail.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<PatientError> for ApiError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "Patient not found"),
            PatientError::Conflict(_) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "Patient with this ID already exists",
            ),
            PatientError::Validation(errors) => ApiError {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                detail: Value::Array(
                    errors
                        .violations()
                        .iter()
                        .map(|v| json!({ "field": v.field, "message": v.message }))
                        .collect(),
                ),
            },
            PatientError::InvalidArgument(message) => {
                ApiError::new(StatusCode::BAD_REQUEST, message)
            }
            e @ (PatientError::StorageUnavailable { .. }
            | PatientError::StorageWrite(_)
            | PatientError::Serialization(_)
            | PatientError::InvalidConfig(_)) => {
                tracing::error!("Patient storage error: {:?}", e);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.detail }));
        (self.status, body).into_response()
    }
}
