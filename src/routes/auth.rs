use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, state::{SharedState, auth::Principal}};

const BEARER_PREFIX: &str = "Bearer ";

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the bearer token into a [`Principal`] stored as a request extension.
pub async fn require_auth(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req).ok_or_else(|| {
        AppError::Unauthorized("missing `Authorization: Bearer <token>` header".into())
    })?;
    let principal = state
        .tokens()
        .resolve(token)
        .ok_or_else(|| AppError::Unauthorized("invalid bearer token".into()))?;

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Reject callers without the admin role; must run after [`require_auth`].
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    match req.extensions().get::<Principal>() {
        Some(principal) if principal.is_admin() => Ok(next.run(req).await),
        Some(_) => Err(AppError::Forbidden("administrator role required".into())),
        None => Err(AppError::Unauthorized("authentication required".into())),
    }
}
