use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use tradepost_core::{MarketError, ValidationError};

/// Failure of a request, rendered as `{"message": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Market(#[from] MarketError),

    #[error("Too many attempts, try again in {0}s")]
    RateLimited(u64),

    #[error("Malformed request: {0}")]
    Malformed(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Market(e.into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Malformed(_) => StatusCode::BAD_REQUEST,
            ApiError::Market(e) => match e {
                MarketError::Validation(_) => StatusCode::BAD_REQUEST,
                MarketError::InvalidCredentials
                | MarketError::SessionNotFound
                | MarketError::SessionExpired(_) => StatusCode::UNAUTHORIZED,
                MarketError::Forbidden(_) | MarketError::NotSeller => StatusCode::FORBIDDEN,
                MarketError::NotFound(..) | MarketError::UserNotFound(_) => StatusCode::NOT_FOUND,
                MarketError::UserAlreadyExists(_) => StatusCode::CONFLICT,
                MarketError::Hashing(_) | MarketError::Persistence(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }

        let body = Json(ErrorResponse {
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}
