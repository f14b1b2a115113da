use crate::application_port::*;
use crate::logger::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;
use warp::{Rejection, reject};

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

/// Rejections are checked most specific first. Every route that matched the path but not the
/// method leaves a `MethodNotAllowed` in the combined rejection, so that one goes last.
pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, message) = if let Some(code) = err.find::<ApiErrorCode>() {
        (code.status(), code.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(message) = malformed_body(&err) {
        (StatusCode::BAD_REQUEST, message.to_string())
    } else if err.find::<reject::MissingHeader>().is_some() {
        (
            StatusCode::UNAUTHORIZED,
            ApiErrorCode::InvalidAccessToken.to_string(),
        )
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        error!(rejection = ?err, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };

    let json = warp::reply::json(&ErrorEnvelope { error: message });
    Ok(warp::reply::with_status(json, status))
}

fn malformed_body(err: &Rejection) -> Option<&'static str> {
    if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        Some("failed to decode request")
    } else if err.find::<reject::PayloadTooLarge>().is_some() {
        Some("request body too large")
    } else if err.find::<reject::LengthRequired>().is_some() {
        Some("content length required")
    } else if err.find::<reject::UnsupportedMediaType>().is_some() {
        Some("expected an application/json body")
    } else {
        None
    }
}

#[derive(Debug, Clone, Error)]
pub enum ApiErrorCode {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("invalid access token")]
    InvalidAccessToken,
    #[error("credential store unavailable")]
    StoreUnavailable,
    #[error("failed to generate access token")]
    SigningFailed,
    #[error("failed to generate refresh token")]
    RefreshTokenFailed,
    #[error("request timed out")]
    RequestTimeout,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidRefreshToken | ApiErrorCode::InvalidAccessToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiErrorCode::StoreUnavailable
            | ApiErrorCode::SigningFailed
            | ApiErrorCode::RefreshTokenFailed
            | ApiErrorCode::RequestTimeout => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Validation(msg) => ApiErrorCode::InvalidRequest(msg),
            AuthError::Unauthorized => ApiErrorCode::InvalidRefreshToken,
            AuthError::Persistence(_) => ApiErrorCode::StoreUnavailable,
            AuthError::Signing(_) => ApiErrorCode::SigningFailed,
            AuthError::Entropy(_) | AuthError::Hashing(_) => ApiErrorCode::RefreshTokenFailed,
        }
    }
}
