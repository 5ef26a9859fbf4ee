//! Error -> HTTP response mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use monigate_core::error::{ClientCode, MonigateError};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Handler-facing error. Internal detail is logged, never returned.
#[derive(Debug)]
pub struct ApiError(pub MonigateError);

impl From<MonigateError> for ApiError {
    fn from(e: MonigateError) -> Self {
        Self(e)
    }
}

pub fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::BadRequest => StatusCode::BAD_REQUEST,
        ClientCode::Unauthenticated => StatusCode::UNAUTHORIZED,
        ClientCode::Forbidden => StatusCode::FORBIDDEN,
        ClientCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        status_for(self.0.client_code())
    }

    fn public_message(&self) -> String {
        match &self.0 {
            MonigateError::Unauthenticated => "authentication required: missing or invalid API token".into(),
            MonigateError::Forbidden => "insufficient permissions for this resource".into(),
            MonigateError::RateLimited => "too many requests, please try again later".into(),
            MonigateError::BadRequest(m) => m.clone(),
            e if e.is_client_safe() => e.to_string(),
            _ => "internal server error".into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.client_code().as_str(), "request failed");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Body returned when a handler panics.
pub fn unhandled_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal server error",
            "message": "an unexpected error occurred",
        })),
    )
        .into_response()
}
