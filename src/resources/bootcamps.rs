//! Bootcamp actions.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::advanced::{advanced_results, ListQuery};
use super::aggregates::delete_bootcamp_courses;
use super::{caller, ensure_owner, populate_courses, to_values};
use crate::dispatch::{Action, ActionError, ActionResult, RequestContext, ResultEnvelope};
use crate::geo::{angular_radius, DistanceUnit, Geocoder};
use crate::models::{BootcampInput, Role};
use crate::store::{FilterExpr, FilterSet, FindOptions, StoreHandle};

fn not_found(id: &str) -> ActionError {
    ActionError::not_found(format!("Bootcamp not found with id of {}", id))
}

/// `GET /bootcamps`
pub struct ListBootcamps {
    pub query: ListQuery,
}

#[async_trait]
impl Action for ListBootcamps {
    fn name(&self) -> &'static str {
        "list_bootcamps"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let (docs, pagination) = advanced_results(store.bootcamps(), &self.query).await?;
        let bootcamps = populate_courses(store, docs).await?;
        Ok(ResultEnvelope::paginated(bootcamps, pagination))
    }
}

/// `GET /bootcamps/:id`
pub struct GetBootcamp {
    pub id: String,
}

#[async_trait]
impl Action for GetBootcamp {
    fn name(&self) -> &'static str {
        "get_bootcamp"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let bootcamp = store
            .bootcamps()
            .find_by_id(&self.id)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        Ok(ResultEnvelope::ok(Value::Object(bootcamp)))
    }
}

/// `POST /bootcamps`
pub struct CreateBootcamp {
    pub input: BootcampInput,
    pub geocoder: Arc<dyn Geocoder>,
}

#[async_trait]
impl Action for CreateBootcamp {
    fn name(&self) -> &'static str {
        "create_bootcamp"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let auth = caller(ctx)?;
        self.input.validate_new()?;

        // one bootcamp per publisher
        if auth.role != Role::Admin {
            let published = store
                .bootcamps()
                .find_one(FilterSet::by("user", auth.user_id.as_str()))
                .await?;
            if published.is_some() {
                return Err(ActionError::bad_request(format!(
                    "The user with ID {} has already published a bootcamp",
                    auth.user_id
                )));
            }
        }

        let mut doc = self.input.to_new_document(&auth.user_id);
        if let Some(address) = &self.input.address {
            let location = self.geocoder.geocode(address).await?;
            doc.insert("location".to_string(), location.to_geojson());
        }

        let created = store.bootcamps().create(doc).await?;
        info!(bootcamp = ?created.get("_id"), user = %auth.user_id, "bootcamp created");
        Ok(ResultEnvelope::created(Value::Object(created)))
    }
}

/// `PUT /bootcamps/:id`
pub struct UpdateBootcamp {
    pub id: String,
    pub input: BootcampInput,
    pub geocoder: Arc<dyn Geocoder>,
}

#[async_trait]
impl Action for UpdateBootcamp {
    fn name(&self) -> &'static str {
        "update_bootcamp"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let auth = caller(ctx)?;
        let existing = store
            .bootcamps()
            .find_by_id(&self.id)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        ensure_owner(auth, &existing, "update", "this bootcamp")?;
        self.input.validate_patch()?;

        let mut patch = self.input.to_document();
        if let Some(address) = &self.input.address {
            let location = self.geocoder.geocode(address).await?;
            patch.insert("location".to_string(), location.to_geojson());
        }

        let updated = store
            .bootcamps()
            .update(&self.id, patch)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        Ok(ResultEnvelope::ok(Value::Object(updated)))
    }
}

/// `DELETE /bootcamps/:id`; removes the bootcamp's courses first
pub struct DeleteBootcamp {
    pub id: String,
}

#[async_trait]
impl Action for DeleteBootcamp {
    fn name(&self) -> &'static str {
        "delete_bootcamp"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let auth = caller(ctx)?;
        let existing = store
            .bootcamps()
            .find_by_id(&self.id)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        ensure_owner(auth, &existing, "delete", "this bootcamp")?;

        delete_bootcamp_courses(store, &self.id).await?;
        store.bootcamps().delete(&self.id).await?;
        info!(bootcamp = %self.id, user = %auth.user_id, "bootcamp deleted");
        Ok(ResultEnvelope::ok(json!({})))
    }
}

/// `GET /bootcamps/radius/:zipcode/:distance[/:unit]`
pub struct BootcampsInRadius {
    pub zipcode: String,
    pub distance: f64,
    pub unit: DistanceUnit,
    pub geocoder: Arc<dyn Geocoder>,
}

#[async_trait]
impl Action for BootcampsInRadius {
    fn name(&self) -> &'static str {
        "bootcamps_in_radius"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let location = self.geocoder.geocode(&self.zipcode).await?;
        let center = location
            .point
            .ok_or_else(|| ActionError::bad_request(format!("No coordinates found for {}", self.zipcode)))?;
        let radius = angular_radius(self.distance, self.unit);

        let filter = FilterSet::new().and(FilterExpr::within_sphere("location.coordinates", center, radius));
        let bootcamps = store.bootcamps().find(&FindOptions::filtered(filter)).await?;
        Ok(ResultEnvelope::listing(to_values(bootcamps)))
    }
}

/// An uploaded file
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Where uploads go and how large they may be
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

/// `PUT /bootcamps/:id/photo`
pub struct UploadBootcampPhoto {
    pub id: String,
    pub upload: Option<PhotoUpload>,
    pub settings: UploadSettings,
}

impl UploadBootcampPhoto {
    fn extension(upload: &PhotoUpload) -> Option<&'static str> {
        match upload.content_type.as_str() {
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/png" => Some("png"),
            _ => None,
        }
    }
}

#[async_trait]
impl Action for UploadBootcampPhoto {
    fn name(&self) -> &'static str {
        "upload_bootcamp_photo"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let auth = caller(ctx)?;
        let existing = store
            .bootcamps()
            .find_by_id(&self.id)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        ensure_owner(auth, &existing, "update", "this bootcamp")?;

        let upload = self
            .upload
            .as_ref()
            .ok_or_else(|| ActionError::bad_request("Please upload a file"))?;
        let extension =
            Self::extension(upload).ok_or_else(|| ActionError::bad_request("Please upload an image file"))?;
        if upload.bytes.len() > self.settings.max_bytes {
            return Err(ActionError::bad_request(format!(
                "Please upload an image less than {} bytes",
                self.settings.max_bytes
            )));
        }

        let filename = format!("photo_{}.{}", self.id, extension);
        tokio::fs::create_dir_all(&self.settings.dir)
            .await
            .map_err(|e| ActionError::Operation(format!("Problem with file upload: {}", e)))?;
        tokio::fs::write(self.settings.dir.join(&filename), &upload.bytes)
            .await
            .map_err(|e| ActionError::Operation(format!("Problem with file upload: {}", e)))?;

        let mut patch = crate::store::Document::new();
        patch.insert("photo".to_string(), Value::String(filename.clone()));
        store.bootcamps().update(&self.id, patch).await?;

        info!(bootcamp = %self.id, original = %upload.filename, stored = %filename, "photo uploaded");
        Ok(ResultEnvelope::ok(Value::String(filename)))
    }
}
