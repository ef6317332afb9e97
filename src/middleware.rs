//! Bearer token authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::AppState;

/// Reject requests without a valid bearer token for the shared identity.
///
/// Layered onto every route group except the health check. Missing or
/// malformed headers and failed validation all map to 401 before the request
/// reaches any handler; a missing configured username is a server fault (500).
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?
        .to_str()
        .map_err(|_| AppError::Unauthorized)?;

    let token = header
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let username = state
        .config
        .letterboxd
        .username
        .as_deref()
        .ok_or(AppError::NotConfigured("letterboxd username"))?;

    if !state.auth.validate(token, username) {
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
