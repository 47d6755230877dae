use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Non-success outcomes from the AI gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    RateLimited,
    PaymentRequired,
    Status(u16),
    Transport(String),
}

impl UpstreamFailure {
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            402 => Self::PaymentRequired,
            other => Self::Status(other),
        }
    }
}

impl std::fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamFailure::RateLimited => {
                write!(f, "Too many requests. Please try again shortly.")
            }
            UpstreamFailure::PaymentRequired => {
                write!(f, "AI usage limit reached. Please add credits to continue.")
            }
            UpstreamFailure::Status(status) => write!(f, "AI service error: {}", status),
            UpstreamFailure::Transport(message) => {
                write!(f, "AI service unreachable: {}", message)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Upstream(UpstreamFailure),
    #[error("{0}")]
    NotFound(String),
    #[error("Storage unavailable: {0}")]
    TransientIo(String),
    #[error("Failed to start stream: {0}")]
    StreamStart(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(UpstreamFailure::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(UpstreamFailure::PaymentRequired) => StatusCode::PAYMENT_REQUIRED,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::TransientIo(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::StreamStart(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            other => AppError::TransientIo(other.to_string()),
        }
    }
}

impl From<async_openai::error::OpenAIError> for AppError {
    fn from(e: async_openai::error::OpenAIError) -> Self {
        AppError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_sub_kinds_map_to_distinct_statuses() {
        assert_eq!(
            AppError::Upstream(UpstreamFailure::from_status(429)).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Upstream(UpstreamFailure::from_status(402)).status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            AppError::Upstream(UpstreamFailure::from_status(500)).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn upstream_messages_are_user_facing() {
        let rate_limited = AppError::Upstream(UpstreamFailure::RateLimited).to_string();
        let payment = AppError::Upstream(UpstreamFailure::PaymentRequired).to_string();
        assert!(rate_limited.contains("Too many requests"));
        assert!(payment.contains("add credits"));
        assert_ne!(rate_limited, payment);
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn error_body_is_json() {
        let response = AppError::Validation("Missing category".into()).error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
