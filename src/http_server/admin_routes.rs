//! Admin HTTP Routes
//!
//! User management. Every route requires the admin role.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};

use super::extract::{Caller, JsonBody, ListParams};
use super::response::Rejection;
use super::state::AppState;
use crate::dispatch::Dispatched;
use crate::models::Role;
use crate::resources::admin::{CreateUser, DeleteUser, GetUser, ListUsers, UpdateUser};

const ADMIN: &[Role] = &[Role::Admin];

/// Routes mounted at `/api/v1/admin`
pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_handler).post(create_handler))
        .route("/register", post(create_handler))
        .route(
            "/:id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
}

async fn list_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    ListParams(query): ListParams,
) -> Result<Dispatched, Rejection> {
    let ctx = caller.require(ADMIN)?.context();
    Ok(state.primary(&ctx, &ListUsers { query }).await)
}

async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    caller: Caller,
) -> Result<Dispatched, Rejection> {
    let ctx = caller.require(ADMIN)?.context();
    Ok(state.primary(&ctx, &GetUser { id }).await)
}

async fn create_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    body: JsonBody,
) -> Result<Dispatched, Rejection> {
    let ctx = caller.require(ADMIN)?.context();
    Ok(state.primary(&ctx, &CreateUser { input: body.parse()? }).await)
}

async fn update_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    caller: Caller,
    body: JsonBody,
) -> Result<Dispatched, Rejection> {
    let ctx = caller.require(ADMIN)?.context();
    let action = UpdateUser {
        id,
        input: body.parse()?,
    };
    Ok(state.primary(&ctx, &action).await)
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    caller: Caller,
) -> Result<Dispatched, Rejection> {
    let ctx = caller.require(ADMIN)?.context();
    Ok(state.primary(&ctx, &DeleteUser { id }).await)
}
