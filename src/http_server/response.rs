//! Envelope rendering.
//!
//! The HTTP status mirrors the envelope status, a token envelope sets the
//! token cookie, and a dual dispatch reports the secondary store's result
//! in `x-secondary-outcome` / `x-secondary-status`.

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

use crate::auth::AuthError;
use crate::dispatch::{ActionError, Dispatched, Outcome, ResultEnvelope};

pub const SECONDARY_OUTCOME: HeaderName = HeaderName::from_static("x-secondary-outcome");
pub const SECONDARY_STATUS: HeaderName = HeaderName::from_static("x-secondary-status");

impl IntoResponse for ResultEnvelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let Some(body) = self.body() else {
            error!(status = self.status, shape = ?self.shape, "envelope could not be built");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "data": "Malformed response"})),
            )
                .into_response();
        };

        let mut response = (status, Json(Value::Object(body))).into_response();
        if let Some(cookie) = &self.cookie {
            if let Ok(value) = HeaderValue::from_str(&cookie.header_value()) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
        }
        response
    }
}

impl IntoResponse for Dispatched {
    fn into_response(self) -> Response {
        let secondary = self
            .secondary()
            .map(|s| (s.outcome, s.status));
        let mut response = self.envelope().into_response();

        if let Some((outcome, status)) = secondary {
            let headers = response.headers_mut();
            headers.insert(SECONDARY_OUTCOME, HeaderValue::from_static(outcome_label(outcome)));
            headers.insert(SECONDARY_STATUS, HeaderValue::from(status));
        }
        response
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Success => "success",
        Outcome::Failure => "failure",
    }
}

/// A request refused before any action ran: bad token, wrong role,
/// unreadable body. Rendered as a plain envelope with `success: false`.
#[derive(Debug)]
pub struct Rejection(pub ResultEnvelope);

impl Rejection {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Rejection(ResultEnvelope::message(Outcome::Failure, status, message))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }
}

impl From<AuthError> for Rejection {
    fn from(err: AuthError) -> Self {
        Rejection::new(err.status_code(), err.to_string())
    }
}

impl From<ActionError> for Rejection {
    fn from(err: ActionError) -> Self {
        Rejection::new(err.status_code(), err.to_string())
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CookieOptions, SetCookie, TOKEN_COOKIE};
    use crate::dispatch::DualOutcome;

    #[test]
    fn test_status_mirrors_envelope() {
        let response = ResultEnvelope::created(json!({"name": "x"})).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_token_sets_cookie() {
        let cookie = SetCookie::new(TOKEN_COOKIE, "abc", CookieOptions::for_days(1, false));
        let response = ResultEnvelope::token(200, cookie).into_response();

        let set_cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("token=abc; Path=/"));
        assert!(set_cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_dual_headers() {
        let response = Dispatched::Dual(DualOutcome {
            primary: ResultEnvelope::ok(json!([])),
            secondary: ResultEnvelope::failure("down"),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[&SECONDARY_OUTCOME], "failure");
        assert_eq!(response.headers()[&SECONDARY_STATUS], "500");
    }

    #[test]
    fn test_rejection_is_failure_envelope() {
        let Rejection(envelope) = Rejection::from(AuthError::Forbidden("user".to_string()));
        assert_eq!(envelope.status, 403);
        assert!(!envelope.is_success());
    }
}
