//! Bootcamp HTTP Routes
//!
//! Listing and lookup are served from both stores; writes go to the
//! primary store only.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    routing::{get, put},
    Router,
};

use super::extract::{Caller, JsonBody, ListParams};
use super::response::Rejection;
use super::state::AppState;
use crate::dispatch::{DispatchMode, Dispatched, RequestContext};
use crate::geo::DistanceUnit;
use crate::models::Role;
use crate::resources::bootcamps::{
    BootcampsInRadius, CreateBootcamp, DeleteBootcamp, GetBootcamp, ListBootcamps, PhotoUpload, UpdateBootcamp,
    UploadBootcampPhoto,
};

const WRITERS: &[Role] = &[Role::Publisher, Role::Admin];

/// Routes mounted at `/api/v1/bootcamps`
pub fn bootcamp_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_handler).post(create_handler))
        .route(
            "/:id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/radius/:zipcode/:distance", get(radius_handler))
        .route("/radius/:zipcode/:distance/:unit", get(radius_unit_handler))
        .route("/:id/photo", put(photo_handler))
}

// ==================
// Handlers
// ==================

async fn list_handler(State(state): State<Arc<AppState>>, ListParams(query): ListParams) -> Dispatched {
    state
        .dispatch(&RequestContext::anonymous(), &ListBootcamps { query }, DispatchMode::Dual)
        .await
}

async fn get_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Dispatched {
    state
        .dispatch(&RequestContext::anonymous(), &GetBootcamp { id }, DispatchMode::Dual)
        .await
}

async fn create_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    body: JsonBody,
) -> Result<Dispatched, Rejection> {
    let ctx = caller.require(WRITERS)?.context();
    let action = CreateBootcamp {
        input: body.parse()?,
        geocoder: state.geocoder.clone(),
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
    let action = UpdateBootcamp {
        id,
        input: body.parse()?,
        geocoder: state.geocoder.clone(),
    };
    Ok(state.primary(&ctx, &action).await)
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    caller: Caller,
) -> Result<Dispatched, Rejection> {
    let ctx = caller.require(WRITERS)?.context();
    Ok(state.primary(&ctx, &DeleteBootcamp { id }).await)
}

async fn radius_handler(
    State(state): State<Arc<AppState>>,
    Path((zipcode, distance)): Path<(String, String)>,
) -> Result<Dispatched, Rejection> {
    radius(&state, zipcode, &distance, None).await
}

async fn radius_unit_handler(
    State(state): State<Arc<AppState>>,
    Path((zipcode, distance, unit)): Path<(String, String, String)>,
) -> Result<Dispatched, Rejection> {
    radius(&state, zipcode, &distance, Some(&unit)).await
}

async fn radius(
    state: &AppState,
    zipcode: String,
    distance: &str,
    unit: Option<&str>,
) -> Result<Dispatched, Rejection> {
    let distance: f64 = distance
        .parse()
        .ok()
        .filter(|d: &f64| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| Rejection::bad_request(format!("Invalid distance '{}'", distance)))?;
    let action = BootcampsInRadius {
        zipcode,
        distance,
        unit: DistanceUnit::parse(unit),
        geocoder: state.geocoder.clone(),
    };
    Ok(state.primary(&RequestContext::anonymous(), &action).await)
}

async fn photo_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    caller: Caller,
    multipart: Multipart,
) -> Result<Dispatched, Rejection> {
    let ctx = caller.require(WRITERS)?.context();
    let upload = read_file_field(multipart, state.uploads.max_bytes).await?;
    let action = UploadBootcampPhoto {
        id,
        upload,
        settings: state.uploads.clone(),
    };
    Ok(state.primary(&ctx, &action).await)
}

/// The `file` field of a multipart body, if any
async fn read_file_field(mut multipart: Multipart, max_bytes: usize) -> Result<Option<PhotoUpload>, Rejection> {
    let unreadable = |e: axum::extract::multipart::MultipartError| {
        Rejection::bad_request(format!(
            "Could not read upload ({}); files must be under {} bytes",
            e.body_text(),
            max_bytes
        ))
    };

    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(unreadable)?;
        return Ok(Some(PhotoUpload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}
