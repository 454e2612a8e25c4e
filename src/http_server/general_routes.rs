//! Data management HTTP Routes (admin only)

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{delete, get},
    Router,
};

use super::extract::Caller;
use super::response::Rejection;
use super::state::AppState;
use crate::dispatch::Dispatched;
use crate::models::Role;
use crate::resources::general::{DeleteData, ImportData};

/// Routes mounted at `/api/v1/general`
pub fn general_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/import", get(import_handler))
        .route("/delete", delete(delete_handler))
}

async fn import_handler(State(state): State<Arc<AppState>>, caller: Caller) -> Result<Dispatched, Rejection> {
    let ctx = caller.require(&[Role::Admin])?.context();
    let action = ImportData {
        data_dir: state.seed_dir.clone(),
        geocoder: state.geocoder.clone(),
    };
    Ok(state.primary(&ctx, &action).await)
}

async fn delete_handler(State(state): State<Arc<AppState>>, caller: Caller) -> Result<Dispatched, Rejection> {
    let ctx = caller.require(&[Role::Admin])?.context();
    Ok(state.primary(&ctx, &DeleteData).await)
}
