use super::error::*;
use crate::application_port::{AuthError, AuthService};
use crate::domain_model::UserId;
use crate::logger::*;
use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, info_span};
use warp::{self, reject};

fn request_id() -> String {
    nanoid!(12)
}

/// Runs `call` under the request deadline. Expiry drops the call; a rotation dropped before its
/// final `save` leaves the stored token untouched.
async fn within<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, AuthError>>,
) -> Result<T, warp::Rejection> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(ApiErrorCode::from).map_err(reject::custom),
        Err(_) => {
            error!(?timeout, "request deadline exceeded");
            Err(reject::custom(ApiErrorCode::RequestTimeout))
        }
    }
}

pub async fn issue(
    guid: String,
    auth_service: Arc<dyn AuthService>,
    timeout: Duration,
) -> Result<impl warp::Reply, warp::Rejection> {
    let span = info_span!("request", op = "api.v1.issue", request_id = %request_id());
    let pair = within(timeout, auth_service.issue_for_user(&guid))
        .instrument(span)
        .await?;

    Ok(warp::reply::json(&pair))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    body: RefreshRequest,
    auth_service: Arc<dyn AuthService>,
    timeout: Duration,
) -> Result<impl warp::Reply, warp::Rejection> {
    let span = info_span!("request", op = "api.v1.refresh", request_id = %request_id());
    let pair = within(timeout, auth_service.rotate(&body.refresh_token))
        .instrument(span)
        .await?;

    Ok(warp::reply::json(&pair))
}

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub user_id: UserId,
}

pub async fn whoami(user_id: UserId) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&WhoamiResponse { user_id }))
}
