use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chart_core::ChartError;
use serde_json::json;

/// Unified error type for hub API responses.
#[derive(Debug)]
pub enum HubError {
    Db(String),
    /// Chart pipeline rejected data read from the store.
    Chart(ChartError),
    BadRequest(String),
    Unauthorized,
    WebhooksDisabled,
    Internal(String),
}

impl std::fmt::Display for HubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(msg) => write!(f, "db_error: {msg}"),
            Self::Chart(e) => write!(f, "chart_error: {e}"),
            Self::BadRequest(msg) => write!(f, "bad_request: {msg}"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::WebhooksDisabled => write!(f, "webhooks_disabled"),
            Self::Internal(msg) => write!(f, "internal_error: {msg}"),
        }
    }
}

impl std::error::Error for HubError {}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let (status, error_str) = match &self {
            Self::Db(msg) => (StatusCode::INTERNAL_SERVER_ERROR, format!("db_error:{msg}")),
            Self::Chart(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("chart_error:{e}")),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            Self::WebhooksDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "webhooks_disabled".to_string(),
            ),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        if status.is_server_error() {
            tracing::error!("{self}");
        }

        let body = json!({ "error": error_str });
        (status, axum::Json(body)).into_response()
    }
}

impl From<rusqlite::Error> for HubError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Db(e.to_string())
    }
}

impl From<r2d2::Error> for HubError {
    fn from(e: r2d2::Error) -> Self {
        Self::Db(e.to_string())
    }
}

impl From<ChartError> for HubError {
    fn from(e: ChartError) -> Self {
        Self::Chart(e)
    }
}

impl From<tokio::task::JoinError> for HubError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {e}"))
    }
}
