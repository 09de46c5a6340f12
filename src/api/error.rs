//! Mapping of service errors onto HTTP responses.

use crate::error::TubechatError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

/// An error returned from a handler, rendered as `{"error", "kind"}` JSON.
#[derive(Debug)]
pub struct ApiError(pub TubechatError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        status_for(&self.0)
    }
}

/// HTTP status for an error kind.
pub fn status_for(err: &TubechatError) -> StatusCode {
    match err {
        TubechatError::InvalidUrl(_) | TubechatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        TubechatError::TranscriptUnavailable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        TubechatError::UserNotFound(_) | TubechatError::VideoNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        TubechatError::AlreadyExists(_) => StatusCode::CONFLICT,
        TubechatError::Youtube(_)
        | TubechatError::Embedding(_)
        | TubechatError::VectorStore(_)
        | TubechatError::Generation(_)
        | TubechatError::OpenAI(_)
        | TubechatError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<TubechatError> for ApiError {
    fn from(err: TubechatError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(TubechatError::InvalidInput(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(TubechatError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_client_error() {
            warn!(kind = self.0.kind(), "Request rejected: {}", self.0);
        } else {
            error!(kind = self.0.kind(), "Request failed: {}", self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&TubechatError::InvalidUrl("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&TubechatError::TranscriptUnavailable {
                video_id: "v".into(),
                reason: "r".into()
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&TubechatError::VideoNotFound {
                user_id: 1,
                video_id: "v".into()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&TubechatError::AlreadyExists("e".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&TubechatError::OpenAI("down".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&TubechatError::IngestFailure("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
