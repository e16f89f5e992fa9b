//! JSON error responses.

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, warn};

use crate::roleplay::DialogueError;
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 `{error}`
    #[error("{0}")]
    BadRequest(String),
    /// 404 `{error}`
    #[error("{0}")]
    NotFound(String),
    /// 413 `{error}`
    #[error("{0}")]
    TooLarge(String),
    /// 404 `{error, path}` for unmatched routes.
    #[error("route not found: {0}")]
    RouteNotFound(String),
    /// 404 / 409 / 500 `{error, kind}` depending on the dialogue error.
    #[error("{0}")]
    Dialogue(DialogueError),
    /// 500 `{error, details}`
    #[error("{context}: {cause:#}")]
    Service {
        context: &'static str,
        cause: anyhow::Error,
    },
}

impl ApiError {
    pub fn missing_fields(fields: &str) -> Self {
        ApiError::BadRequest(format!("Missing required fields: {fields}"))
    }

    pub fn service(context: &'static str, cause: anyhow::Error) -> Self {
        ApiError::Service { context, cause }
    }

    /// Convert a session error, using `context` if a service call failed.
    pub fn session(err: SessionError, context: &'static str) -> Self {
        match err {
            SessionError::EmptyMessage => ApiError::BadRequest(err.to_string()),
            SessionError::Profile(e) => ApiError::BadRequest(e.to_string()),
            SessionError::UnknownExercise(_) => ApiError::NotFound(err.to_string()),
            SessionError::Dialogue(e) => ApiError::Dialogue(e),
            SessionError::Service(cause) => ApiError::Service { context, cause },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound(_) | ApiError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Dialogue(e) => match e {
                DialogueError::InvalidEdge { .. } | DialogueError::NoActiveScenario => {
                    StatusCode::CONFLICT
                }
                DialogueError::UnknownScenario(_) => StatusCode::NOT_FOUND,
                DialogueError::BrokenGraph { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Service { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::session(err, "Service call failed")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::TooLarge(err.body_text())
        } else {
            ApiError::BadRequest(err.body_text())
        }
    }
}

impl ApiError {
    /// Status and JSON body, logging server-side failures.
    pub fn into_parts(self) -> (StatusCode, Value) {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(msg) => {
                warn!(error = %msg, "Rejected request");
                json!({ "error": msg })
            }
            ApiError::NotFound(msg) | ApiError::TooLarge(msg) => json!({ "error": msg }),
            ApiError::RouteNotFound(path) => json!({ "error": "Route not found", "path": path }),
            ApiError::Dialogue(e) => {
                if status.is_server_error() {
                    error!(error = %e, "Dialogue graph error");
                }
                json!({ "error": e.to_string(), "kind": e.kind() })
            }
            ApiError::Service { context, cause } => {
                let details = format!("{cause:#}");
                error!(error = %details, "{context}");
                json!({ "error": context, "details": details })
            }
        };
        (status, body)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_parts();
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn dialogue_errors_carry_kind() {
        let (status, body) = body_json(ApiError::Dialogue(DialogueError::InvalidEdge {
            node_id: "market-1".into(),
            response_id: "r9".into(),
        }))
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "invalid_edge");

        let (status, body) = body_json(ApiError::Dialogue(DialogueError::BrokenGraph {
            scenario_id: "x".into(),
            index: 4,
        }))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "broken_graph");
    }

    #[tokio::test]
    async fn service_error_has_details() {
        let source = anyhow::anyhow!("backend down").context("calling chat");
        let (status, body) = body_json(ApiError::service("Failed to process chat message", source)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to process chat message");
        assert_eq!(body["details"], "calling chat: backend down");
    }

    #[test]
    fn display_includes_cause() {
        let err = ApiError::service("Translation failed", anyhow::anyhow!("timed out"));
        assert_eq!(err.to_string(), "Translation failed: timed out");
        assert_eq!(
            ApiError::RouteNotFound("/nope".into()).to_string(),
            "route not found: /nope"
        );
    }

    #[test]
    fn session_errors_map_to_status() {
        assert_eq!(
            ApiError::from(SessionError::EmptyMessage).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(SessionError::UnknownExercise("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(SessionError::Dialogue(DialogueError::NoActiveScenario)).status(),
            StatusCode::CONFLICT
        );
    }
}
