//! Request extractors.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::response::Rejection;
use super::state::AppState;
use crate::auth::{authenticate, authorize, bearer_token};
use crate::dispatch::{ActionError, AuthContext, RequestContext};
use crate::models::{parse_input, Role};
use crate::resources::ListQuery;
use crate::store::StoreName;

/// The authenticated caller. Rejects with 401 when the token is missing, invalid or names a deleted user.
#[derive(Debug, Clone)]
pub struct Caller(pub AuthContext);

impl Caller {
    /// 403 unless the caller has one of `roles`
    pub fn require(self, roles: &[Role]) -> Result<Self, Rejection> {
        authorize(&self.0, roles)?;
        Ok(self)
    }

    pub fn context(self) -> RequestContext {
        RequestContext::authenticated(self.0)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers);
        let store = state
            .coordinator
            .provider()
            .handle(StoreName::Cloud)
            .await
            .map_err(|e| {
                warn!(error = %e, "cannot authenticate, store unavailable");
                Rejection::new(500, format!("Store '{}' is unavailable", StoreName::Cloud))
            })?;
        let auth = authenticate(token.as_deref(), state.jwt(), &store).await?;
        Ok(Caller(auth))
    }
}

/// Raw query pairs parsed into a [`ListQuery`]
#[derive(Debug, Clone)]
pub struct ListParams(pub ListQuery);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ListParams {
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e| Rejection::bad_request(e.body_text()))?;
        Ok(ListParams(ListQuery::parse(&pairs)))
    }
}

/// A JSON request body; an empty body reads as `{}`
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

impl JsonBody {
    /// Deserialize into a typed input
    pub fn parse<T: DeserializeOwned>(self) -> Result<T, Rejection> {
        parse_input(self.0).map_err(|e| Rejection::from(ActionError::from(e)))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for JsonBody {
    type Rejection = Rejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| Rejection::bad_request(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(Value::Object(Default::default())));
        }
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| Rejection::bad_request(format!("Invalid JSON body: {}", e)))
    }
}
