//! # Domain errors
//! Closed error taxonomy shared by the orchestrator, the dividend query service
//! and the HTTP boundary.
//!
//! Every failure leaving a service is a [`ScrapError`]: a stable [`ErrorCode`]
//! plus a human-readable message. Layer errors (store, cache, provider, index)
//! are converted through the `From` impls below; anything that is not a known
//! domain condition collapses into `INTERNAL_SERVER_ERROR` with a generic
//! message so infrastructure detail never reaches a client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheError;
use crate::index::IndexError;
use crate::scrape::ScrapeError;
use crate::store::StoreError;

/// Stable error kinds. Serialized in SCREAMING_SNAKE_CASE on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InternalServerError,
    InvalidRequest,
    AccessDenied,
    FailToConnectRedisServer,
    CompanyNotFound,
    CompanyAlreadySaved,
    AlreadyExistUser,
    IdNotFound,
    PasswordUnMatch,
    InvalidTicker,
}

impl ErrorCode {
    /// HTTP status a client sees for this kind.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::CompanyAlreadySaved
            | ErrorCode::CompanyNotFound
            | ErrorCode::InvalidRequest
            | ErrorCode::InvalidTicker
            | ErrorCode::AlreadyExistUser
            | ErrorCode::IdNotFound
            | ErrorCode::PasswordUnMatch => StatusCode::BAD_REQUEST,
            ErrorCode::AccessDenied => StatusCode::FORBIDDEN,
            ErrorCode::FailToConnectRedisServer | ErrorCode::InternalServerError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Default message used when no more specific one is attached.
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::InternalServerError => "An internal server error occurred.",
            ErrorCode::InvalidRequest => "The request is invalid.",
            ErrorCode::AccessDenied => "Access is denied.",
            ErrorCode::FailToConnectRedisServer => "Failed to connect to the cache server.",
            ErrorCode::CompanyNotFound => "The company does not exist.",
            ErrorCode::CompanyAlreadySaved => "The company is already saved.",
            ErrorCode::AlreadyExistUser => "The user id is already in use.",
            ErrorCode::IdNotFound => "The user id does not exist.",
            ErrorCode::PasswordUnMatch => "The password does not match.",
            ErrorCode::InvalidTicker => "ticker is empty",
        }
    }

    /// Wire name, e.g. `COMPANY_NOT_FOUND`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::AccessDenied => "ACCESS_DENIED",
            ErrorCode::FailToConnectRedisServer => "FAIL_TO_CONNECT_REDIS_SERVER",
            ErrorCode::CompanyNotFound => "COMPANY_NOT_FOUND",
            ErrorCode::CompanyAlreadySaved => "COMPANY_ALREADY_SAVED",
            ErrorCode::AlreadyExistUser => "ALREADY_EXIST_USER",
            ErrorCode::IdNotFound => "ID_NOT_FOUND",
            ErrorCode::PasswordUnMatch => "PASSWORD_UN_MATCH",
            ErrorCode::InvalidTicker => "INVALID_TICKER",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed domain failure returned by every service operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ScrapError {
    pub code: ErrorCode,
    pub message: String,
}

impl ScrapError {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.description().to_string(),
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error_code: self.code,
            error_message: self.message.clone(),
            http_status_code: self.status().as_u16(),
        }
    }
}

pub type ScrapResult<T> = Result<T, ScrapError>;

/// Body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub error_message: String,
    pub http_status_code: u16,
}

impl IntoResponse for ScrapError {
    fn into_response(self) -> Response {
        tracing::error!(code = %self.code, message = %self.message, "{} is occurred.", self.code);
        (self.status(), Json(self.to_response())).into_response()
    }
}

// ---- layer conversions ----

impl From<StoreError> for ScrapError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Integrity(detail) => {
                tracing::warn!(%detail, "store integrity violation");
                ScrapError::new(ErrorCode::InvalidRequest)
            }
            StoreError::Unavailable(detail) => {
                tracing::error!(%detail, "store unavailable");
                ScrapError::new(ErrorCode::InternalServerError)
            }
        }
    }
}

impl From<CacheError> for ScrapError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Connection(detail) => {
                tracing::error!(%detail, "cache connection failure");
                ScrapError::new(ErrorCode::FailToConnectRedisServer)
            }
            other => {
                tracing::error!(error = %other, "cache failure");
                ScrapError::new(ErrorCode::InternalServerError)
            }
        }
    }
}

impl From<ScrapeError> for ScrapError {
    fn from(e: ScrapeError) -> Self {
        match e {
            ScrapeError::UnknownTicker(ticker) => {
                tracing::warn!(%ticker, "provider does not know ticker");
                ScrapError::new(ErrorCode::CompanyNotFound)
            }
            other => {
                tracing::error!(error = %other, "scrape provider failure");
                ScrapError::new(ErrorCode::InternalServerError)
            }
        }
    }
}

impl From<IndexError> for ScrapError {
    fn from(e: IndexError) -> Self {
        tracing::error!(error = %e, "prefix index rejected update");
        ScrapError::new(ErrorCode::InternalServerError)
    }
}
