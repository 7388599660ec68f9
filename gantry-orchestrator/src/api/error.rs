//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gantry_canary::HookError;
use gantry_core::DefinitionError;
use gantry_runner::GateError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    BadGateway(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::BadGateway(msg) => {
                tracing::error!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<DefinitionError> for ApiError {
    fn from(err: DefinitionError) -> Self {
        ApiError::BadRequest(format!("Invalid pipeline definition: {}", err))
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::NotFound(id) => ApiError::NotFound(format!("Approval {} not found", id)),
            GateError::Resolve(e) => ApiError::Conflict(e.to_string()),
            GateError::Abandoned(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<HookError> for ApiError {
    fn from(err: HookError) -> Self {
        match err {
            HookError::Reporting(_) => ApiError::BadGateway(err.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::domain::approval::{ApprovalError, ApprovalState};
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::BadGateway("x".into()), StatusCode::BAD_GATEWAY),
            (
                ApiError::InternalError("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_gate_error_mapping() {
        let id = Uuid::new_v4();
        assert!(matches!(
            ApiError::from(GateError::NotFound(id)),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(GateError::Resolve(ApprovalError::AlreadyResolved {
                id,
                state: ApprovalState::Approved,
            })),
            ApiError::Conflict(_)
        ));
    }

    #[test]
    fn test_hook_error_mapping() {
        assert!(matches!(
            ApiError::from(HookError::Reporting("down".into())),
            ApiError::BadGateway(_)
        ));
    }
}
