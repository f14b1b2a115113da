use super::error::*;
use super::handler;
use crate::application_port::*;
use crate::domain_model::UserId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use warp::{Filter, http, reject};

/// Upper bound on a refresh request body; the token itself is 43 bytes.
const MAX_BODY_BYTES: u64 = 4 * 1024;

// Paths are matched before methods so an unknown path is a 404, not a sibling's 405.
pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let whoami = warp::path("whoami")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(server.auth_service.clone()))
        .and_then(handler::whoami);

    let refresh = warp::path("auth")
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and(with_deadline(server.request_timeout))
        .and_then(handler::refresh);

    // `/auth/` reaches the handler with an empty guid and fails validation there
    let guid = warp::path::param::<String>()
        .and(warp::path::end())
        .or(warp::path::end().map(String::new))
        .unify();
    let issue = warp::path("auth")
        .and(guid)
        .and(warp::get())
        .and(with(server.auth_service.clone()))
        .and(with_deadline(server.request_timeout))
        .and_then(handler::issue);

    whoami.or(refresh).or(issue)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_deadline(
    timeout: Duration,
) -> impl Filter<Extract = (Duration,), Error = Infallible> + Clone {
    warp::any().map(move || timeout)
}

fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(move |token: String| {
        let auth_service = auth_service.clone();
        async move {
            let Some(token) = token.strip_prefix("Bearer ") else {
                return Err(reject::custom(ApiErrorCode::InvalidAccessToken));
            };
            auth_service
                .verify_token(token)
                .await
                .map_err(|_| reject::custom(ApiErrorCode::InvalidAccessToken))
        }
    })
}
