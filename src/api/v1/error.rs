use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let error = if let Some(err) = err.find::<ApiError>() {
        err.clone()
    } else if err.is_not_found() {
        ApiError::new(ApiErrorCode::NotFound, "route")
    } else if err.find::<reject::MissingHeader>().is_some() {
        ApiError::new(ApiErrorCode::InvalidToken, "missing bearer token")
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        ApiError::new(ApiErrorCode::BadRequest, e.to_string())
    } else if let Some(e) = err.find::<reject::InvalidQuery>() {
        ApiError::new(ApiErrorCode::BadRequest, e.to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiError::new(ApiErrorCode::MethodNotAllowed, "method not allowed")
    } else {
        ApiError::internal(format!("unhandled rejection: {err:?}"))
    };

    let status = error.code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(error));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApiErrorCode {
    NotFound,
    Conflict,
    InvalidOperation,
    InvalidToken,
    TokenExpired,
    BadRequest,
    MethodNotAllowed,
    InternalError,
}

impl ApiErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::Conflict => StatusCode::CONFLICT,
            ApiErrorCode::InvalidOperation | ApiErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidToken | ApiErrorCode::TokenExpired => StatusCode::UNAUTHORIZED,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error half of the response envelope. `message` carries the short reason
/// the core attached, e.g. `request_outstanding`.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Store details stay in the log, not in the response.
    pub fn internal<E: std::fmt::Display>(error: E) -> Self {
        warn!("Internal error: {}", error);
        Self::new(ApiErrorCode::InternalError, "internal error")
    }
}

impl reject::Reject for ApiError {}

impl From<RelationError> for ApiError {
    fn from(error: RelationError) -> Self {
        match error {
            RelationError::NotFound(what) => ApiError::new(ApiErrorCode::NotFound, what),
            RelationError::Conflict(why) => ApiError::new(ApiErrorCode::Conflict, why),
            RelationError::InvalidOperation(why) => {
                ApiError::new(ApiErrorCode::InvalidOperation, why)
            }
            RelationError::Contended(e) | RelationError::Store(e) => ApiError::internal(e),
        }
    }
}

impl From<FeedError> for ApiError {
    fn from(error: FeedError) -> Self {
        match error {
            FeedError::NotFound(what) => ApiError::new(ApiErrorCode::NotFound, what),
            FeedError::Conflict(why) => ApiError::new(ApiErrorCode::Conflict, why),
            FeedError::Store(e) => ApiError::internal(e),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Invalid => ApiError::new(ApiErrorCode::InvalidToken, "token invalid"),
            TokenError::Expired => ApiError::new(ApiErrorCode::TokenExpired, "token expired"),
        }
    }
}
