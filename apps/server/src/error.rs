use axum::{
    extract::rejection::JsonRejection,
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use botpilot_core::automation::AutomationError;
use botpilot_core::errors::{DatabaseError, Error as CoreError, ValidationError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("Invalid request body: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    code: u16,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_seconds: Option<u64>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        let e = match self {
            ApiError::Core(e) => e,
            ApiError::BadRequest(_) => return StatusCode::BAD_REQUEST,
        };
        match e {
            CoreError::Validation(ValidationError::InvalidAccountId(_)) => StatusCode::BAD_REQUEST,
            CoreError::Validation(ValidationError::UnknownAccount(_)) => StatusCode::NOT_FOUND,
            CoreError::Automation(AutomationError::DuplicateQueued { .. }) => StatusCode::CONFLICT,
            CoreError::Automation(AutomationError::CooldownActive { .. }) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            CoreError::Automation(AutomationError::QueueUnavailable) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CoreError::Database(DatabaseError::NotFound(_)) => StatusCode::NOT_FOUND,
            CoreError::Database(_) | CoreError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn remaining_seconds(&self) -> Option<u64> {
        match self {
            ApiError::Core(CoreError::Automation(AutomationError::CooldownActive {
                remaining_seconds,
                ..
            })) => Some(*remaining_seconds),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let remaining_seconds = self.remaining_seconds();
        let body = Json(ErrorBody {
            success: false,
            code: status.as_u16(),
            error: self.to_string(),
            remaining_seconds,
        });

        let mut response = (status, body).into_response();
        if let Some(seconds) = remaining_seconds {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn cooldown_maps_to_429_with_retry_after() {
        let err = ApiError::from(CoreError::from(AutomationError::CooldownActive {
            account_id: "acc1".into(),
            remaining_seconds: 42,
            cooldown_until: Utc::now(),
        }));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "42");
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (
                CoreError::from(ValidationError::InvalidAccountId("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::from(ValidationError::UnknownAccount("x".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                CoreError::from(AutomationError::DuplicateQueued {
                    account_id: "x".into(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                CoreError::from(AutomationError::QueueUnavailable),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                CoreError::Unexpected("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn bad_request_has_standard_body() {
        let response = ApiError::BadRequest("missing field `accountId`".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(RETRY_AFTER).is_none());
    }
}
