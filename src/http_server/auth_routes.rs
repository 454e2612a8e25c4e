//! Auth HTTP Routes
//!
//! Registration, login, password reset and self-service account
//! management. Token responses also set the `token` cookie.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;

use super::extract::{Caller, JsonBody};
use super::response::Rejection;
use super::state::AppState;
use crate::dispatch::{Dispatched, RequestContext, ResultEnvelope};
use crate::resources::auth::{
    logout_envelope, Credentials, DeleteAccount, ForgotPassword, Login, PasswordChange, Register, ResetPassword,
    UpdateDetails, UpdatePassword, WhoAmI,
};

/// Routes mounted at `/api/v1/auth`
pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", get(logout_handler))
        .route("/whoami", get(whoami_handler))
        .route("/forgotpassword", post(forgot_password_handler))
        .route("/resetpassword/:token", put(reset_password_handler))
        .route("/updatedetails", put(update_details_handler))
        .route("/updatepassword", put(update_password_handler))
        .route("/delete", delete(delete_account_handler))
}

// ==================
// Request Types
// ==================

#[derive(Debug, Default, Deserialize)]
struct ForgotPasswordRequest {
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResetPasswordRequest {
    password: Option<String>,
}

// ==================
// Handlers
// ==================

async fn register_handler(State(state): State<Arc<AppState>>, body: JsonBody) -> Result<Dispatched, Rejection> {
    let action = Register {
        input: body.parse()?,
        issuer: state.issuer.clone(),
    };
    Ok(state.primary(&RequestContext::anonymous(), &action).await)
}

async fn login_handler(State(state): State<Arc<AppState>>, body: JsonBody) -> Result<Dispatched, Rejection> {
    let action = Login {
        credentials: body.parse::<Credentials>()?,
        issuer: state.issuer.clone(),
    };
    Ok(state.primary(&RequestContext::anonymous(), &action).await)
}

async fn logout_handler() -> ResultEnvelope {
    logout_envelope()
}

async fn whoami_handler(State(state): State<Arc<AppState>>, caller: Caller) -> Dispatched {
    state.primary(&caller.context(), &WhoAmI).await
}

async fn forgot_password_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: JsonBody,
) -> Result<Dispatched, Rejection> {
    let request: ForgotPasswordRequest = body.parse()?;
    let action = ForgotPassword {
        email: request.email,
        reset_base: reset_base(&headers, &state.public_host),
        sender: state.email.clone(),
    };
    Ok(state.primary(&RequestContext::anonymous(), &action).await)
}

async fn reset_password_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    body: JsonBody,
) -> Result<Dispatched, Rejection> {
    let request: ResetPasswordRequest = body.parse()?;
    let action = ResetPassword {
        token,
        password: request.password,
        issuer: state.issuer.clone(),
    };
    Ok(state.primary(&RequestContext::anonymous(), &action).await)
}

async fn update_details_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    body: JsonBody,
) -> Result<Dispatched, Rejection> {
    let action = UpdateDetails { input: body.parse()? };
    Ok(state.primary(&caller.context(), &action).await)
}

async fn update_password_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    body: JsonBody,
) -> Result<Dispatched, Rejection> {
    let action = UpdatePassword {
        change: body.parse::<PasswordChange>()?,
        issuer: state.issuer.clone(),
    };
    Ok(state.primary(&caller.context(), &action).await)
}

async fn delete_account_handler(State(state): State<Arc<AppState>>, body: JsonBody) -> Result<Dispatched, Rejection> {
    let action = DeleteAccount {
        credentials: body.parse()?,
    };
    Ok(state.primary(&RequestContext::anonymous(), &action).await)
}

/// `{proto}://{host}/api/v1/auth/resetpassword`, taken from the request
fn reset_base(headers: &HeaderMap, fallback_host: &str) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or(fallback_host);
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");
    format!("{}://{}/api/v1/auth/resetpassword", proto, host)
}
