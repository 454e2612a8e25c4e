//! # Route Guard
//!
//! Resolves the caller of a request from its bearer token and enforces
//! role restrictions.
//!
//! The token is read from `Authorization: Bearer <token>` first and the
//! `token` cookie second. A valid token must still name an existing user;
//! the user's current role (not a role baked into the token) is used.

use axum::http::{header, HeaderMap};
use tracing::debug;

use super::cookie::{find_cookie, TOKEN_COOKIE};
use super::errors::{AuthError, AuthResult};
use super::jwt::JwtManager;
use crate::dispatch::AuthContext;
use crate::models::Role;
use crate::store::document::str_field;
use crate::store::StoreHandle;

/// Cookie value written on logout
const LOGGED_OUT: &str = "none";

/// Extract the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookies| find_cookie(cookies, TOKEN_COOKIE))
        .filter(|t| !t.is_empty() && *t != LOGGED_OUT)
        .map(str::to_string)
}

/// Validate `token` and load the user it names
pub async fn authenticate(token: Option<&str>, jwt: &JwtManager, store: &StoreHandle) -> AuthResult<AuthContext> {
    let token = token.ok_or(AuthError::AuthenticationRequired)?;
    let claims = jwt.validate_token(token)?;

    let user = store
        .users()
        .find_by_id(&claims.id)
        .await
        .map_err(|e| AuthError::StorageError(e.to_string()))?
        .ok_or(AuthError::UnknownTokenUser)?;

    let role = str_field(&user, "role")
        .and_then(Role::parse)
        .unwrap_or_default();
    debug!(user = %claims.id, %role, "request authenticated");
    Ok(AuthContext::new(claims.id, role))
}

/// Reject callers whose role is not in `allowed`
pub fn authorize(auth: &AuthContext, allowed: &[Role]) -> AuthResult<()> {
    if allowed.contains(&auth.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden(auth.role.to_string()))
    }
}
