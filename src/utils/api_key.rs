// src/utils/api_key.rs

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::config::Config;

/// Header carrying the access credential, as sent by search clients.
pub const API_KEY_HEADER: &str = "x-typesense-api-key";

fn presented_key(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// Axum Middleware: search key.
///
/// Accepts the search key or the admin key. With no search key configured the
/// collection API is closed and every request gets 401.
pub async fn api_key_middleware(
    State(config): State<Config>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let accepted = [config.search_api_key.as_deref(), config.admin_api_key.as_deref()];
    let authorized = presented_key(&req).is_some_and(|key| accepted.contains(&Some(key)));

    if !authorized {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

/// Axum Middleware: admin key.
///
/// Document writes need `SEARCH_ADMIN_API_KEY`; a valid search key alone
/// gets 403.
pub async fn admin_key_middleware(
    State(config): State<Config>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(admin_key) = config.admin_api_key.as_deref() else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let verdict = match presented_key(&req) {
        Some(key) if key == admin_key => Ok(()),
        Some(key) if config.search_api_key.as_deref() == Some(key) => Err(StatusCode::FORBIDDEN),
        _ => Err(StatusCode::UNAUTHORIZED),
    };

    verdict?;
    Ok(next.run(req).await)
}
