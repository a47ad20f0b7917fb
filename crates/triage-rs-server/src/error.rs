use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::warn;
use serde_json::json;
use triage_rs_core::TriageError;
use triage_rs_protocol::SkillError;

/// Errors returned by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Target is not `<node_id>.<skill>` for this node, or names no skill.
    #[error("unknown target: {0}")]
    UnknownTarget(String),
    /// Request body was not `{"input": {...}}`.
    #[error("invalid request body: {0}")]
    BadRequest(String),
    /// The skill itself failed.
    #[error(transparent)]
    Triage(#[from] TriageError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownTarget(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Triage(err) => triage_status(err),
        }
    }
}

fn triage_status(err: &TriageError) -> StatusCode {
    match err {
        TriageError::Skill(SkillError::SkillNotFound(_)) => StatusCode::NOT_FOUND,
        TriageError::Skill(SkillError::InvalidArguments(_)) | TriageError::Validation(_) => {
            StatusCode::BAD_REQUEST
        }
        TriageError::NotFound { .. } | TriageError::MissingContext { .. } => StatusCode::NOT_FOUND,
        TriageError::Ai(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("request failed (status={}, error={})", status.as_u16(), self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use triage_rs_core::AiError;
    use triage_rs_protocol::ValidationError;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (ApiError::UnknownTarget("x".to_string()), StatusCode::NOT_FOUND),
            (
                ApiError::Triage(SkillError::InvalidArguments("bad".to_string()).into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Triage(ValidationError::Malformed("bad".to_string()).into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Triage(TriageError::MissingContext {
                    patient_id: "P001".to_string(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Triage(AiError::EmptyResponse.into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Triage(
                    AiError::InvalidOutput(ValidationError::Malformed("bad".to_string())).into(),
                ),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Triage(TriageError::Notify("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }
    }
}
