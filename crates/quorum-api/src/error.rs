use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quorum_core::error::{CoreError, ErrorContext};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(ErrorContext),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Machine-readable error code string.
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Value {
        match self {
            ApiError::Validation(ctx) => json!(ctx),
            _ => Value::Null,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let details = self.details();

        let message = match &self {
            ApiError::Internal(err) => {
                tracing::error!("API internal error: {err:#}");
                "internal server error".to_string()
            }
            ApiError::ServiceUnavailable(reason) => {
                tracing::warn!("API request gave up: {reason}");
                "service busy, try again".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "code": code,
            "message": message,
            "error": message,
            "details": details,
        });

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(ctx) => ApiError::Validation(ctx),
            err @ CoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            err @ CoreError::InvalidOption { .. } => ApiError::BadRequest(err.to_string()),
            err @ (CoreError::ClosedPoll { .. } | CoreError::AlreadyClosed { .. }) => {
                ApiError::Conflict(err.to_string())
            }
            err @ CoreError::Forbidden => ApiError::Forbidden(err.to_string()),
            err @ CoreError::ConcurrencyExhausted { .. } => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            CoreError::Storage(err) => ApiError::Internal(anyhow::Error::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_db::StoreError;

    #[test]
    fn core_errors_map_to_status_codes() {
        let cases = [
            (CoreError::validation("question", "empty"), StatusCode::BAD_REQUEST),
            (CoreError::NotFound { id: "p".into() }, StatusCode::NOT_FOUND),
            (CoreError::ClosedPoll { id: "p".into() }, StatusCode::CONFLICT),
            (CoreError::AlreadyClosed { id: "p".into() }, StatusCode::CONFLICT),
            (
                CoreError::InvalidOption {
                    number: 9,
                    available: 2,
                },
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::Forbidden, StatusCode::FORBIDDEN),
            (
                CoreError::ConcurrencyExhausted {
                    id: "p".into(),
                    attempts: 5,
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                CoreError::Storage(StoreError::Timeout),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (core, status) in cases {
            assert_eq!(ApiError::from(core).status_code(), status);
        }
    }

    #[test]
    fn validation_errors_carry_details() {
        let err = ApiError::from(CoreError::validation("option", "not a number"));
        assert_eq!(
            err.details(),
            json!({ "field": "option", "message": "not a number" })
        );
        assert_eq!(ApiError::Forbidden("no".into()).details(), Value::Null);
    }
}
