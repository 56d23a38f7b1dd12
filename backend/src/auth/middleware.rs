//! Middleware for protecting authenticated routes and handling authorization.
//!
//! Both layers read the bearer token from the `Authorization` header, run it
//! through the [`AccessGate`](crate::auth::guard::AccessGate) held in
//! [`AppState`], and store the resolved user in the request extensions as
//! [`CurrentUser`].

use crate::app::AppState;
use crate::auth::errors::AuthError;
use crate::auth::guard::{is_admin, require_role};
use crate::database::models::User;
use axum::{
    extract::{Extension, Request},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

/// The authenticated user of the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// Returns `None` when the header is absent, unreadable or uses another scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));

    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

/// JWT authentication middleware
pub async fn require_user(
    Extension(state): Extension<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers()).map(str::to_owned);

    let user = state.gate.require_authenticated(token.as_deref()).await?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Admin role authorization middleware
pub async fn require_admin(
    Extension(state): Extension<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers()).map(str::to_owned);

    let admin_only = require_role(is_admin);
    let user = state.gate.require_role(token.as_deref(), &admin_only).await?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
