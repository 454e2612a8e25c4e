//! Course HTTP Routes

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};

use super::extract::{Caller, JsonBody, ListParams};
use super::response::Rejection;
use super::state::AppState;
use crate::dispatch::{Dispatched, RequestContext};
use crate::models::Role;
use crate::resources::courses::{CreateCourse, DeleteCourse, GetCourse, ListCourses, UpdateCourse};
use crate::resources::ListQuery;

const WRITERS: &[Role] = &[Role::Publisher, Role::Admin];

/// Routes mounted at `/api/v1/courses`
pub fn course_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_handler))
        .route("/:id/courses", get(list_for_bootcamp_handler).post(create_handler))
        .route(
            "/:id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
}

async fn list_handler(State(state): State<Arc<AppState>>, ListParams(query): ListParams) -> Dispatched {
    let action = ListCourses {
        bootcamp_id: None,
        query,
    };
    state.primary(&RequestContext::anonymous(), &action).await
}

async fn list_for_bootcamp_handler(State(state): State<Arc<AppState>>, Path(bootcamp_id): Path<String>) -> Dispatched {
    let action = ListCourses {
        bootcamp_id: Some(bootcamp_id),
        query: ListQuery::default(),
    };
    state.primary(&RequestContext::anonymous(), &action).await
}

async fn get_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Dispatched {
    state.primary(&RequestContext::anonymous(), &GetCourse { id }).await
}

async fn create_handler(
    State(state): State<Arc<AppState>>,
    Path(bootcamp_id): Path<String>,
    caller: Caller,
    body: JsonBody,
) -> Result<Dispatched, Rejection> {
    let ctx = caller.require(WRITERS)?.context();
    let action = CreateCourse {
        bootcamp_id,
        input: body.parse()?,
    };
    Ok(state.primary(&ctx, &action).await)
}

async fn update_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    caller: Caller,
    body: JsonBody,
) -> Result<Dispatched, Rejection> {
    let ctx = caller.require(WRITERS)?.context();
    let action = UpdateCourse {
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
    let ctx = caller.require(WRITERS)?.context();
    Ok(state.primary(&ctx, &DeleteCourse { id }).await)
}
