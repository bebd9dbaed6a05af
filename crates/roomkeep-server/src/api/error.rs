//! Mapping of domain errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use roomkeep_core::error::RoomkeepError;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    Domain(RoomkeepError),
    Invalid(garde::Report),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<RoomkeepError> for ApiError {
    fn from(err: RoomkeepError) -> Self {
        Self::Domain(err)
    }
}

impl From<garde::Report> for ApiError {
    fn from(report: garde::Report) -> Self {
        Self::Invalid(report)
    }
}

impl ApiError {
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Domain(RoomkeepError::AuthenticationFailed {
            reason: reason.into(),
        })
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Domain(RoomkeepError::AuthorizationDenied {
            reason: reason.into(),
        })
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Domain(err) => match err {
                RoomkeepError::NotFound { .. } => StatusCode::NOT_FOUND,
                RoomkeepError::AlreadyExists { .. } | RoomkeepError::RoomUnavailable { .. } => {
                    StatusCode::CONFLICT
                }
                RoomkeepError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                RoomkeepError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
                RoomkeepError::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
                RoomkeepError::Database(_)
                | RoomkeepError::Crypto(_)
                | RoomkeepError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            _ if status.is_server_error() => {
                error!(error = ?self, "request failed");
                "internal server error".to_string()
            }
            ApiError::Invalid(report) => report.to_string(),
            ApiError::Domain(err) => err.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn status_of(err: RoomkeepError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(
            status_of(RoomkeepError::not_found("room", Uuid::nil())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RoomkeepError::AlreadyExists {
                entity: "user".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(RoomkeepError::RoomUnavailable {
                room_id: Uuid::nil()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(RoomkeepError::validation("bad")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(RoomkeepError::AuthenticationFailed {
                reason: "x".into()
            }),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(RoomkeepError::AuthorizationDenied {
                reason: "x".into()
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(RoomkeepError::Database("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
