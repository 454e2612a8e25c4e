//! Review actions. Every mutation recomputes the bootcamp's `averageRating`.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::advanced::{advanced_results, ListQuery};
use super::aggregates::recompute_average_rating;
use super::{caller, ensure_owner, populate_bootcamp, populate_bootcamps, to_values};
use crate::dispatch::{Action, ActionError, ActionResult, RequestContext, ResultEnvelope};
use crate::models::ReviewInput;
use crate::store::document::str_field;
use crate::store::{FilterSet, FindOptions, StoreHandle};

fn not_found(id: &str) -> ActionError {
    ActionError::not_found(format!("No review found with the id of {}", id))
}

/// `GET /reviews` or `GET /reviews/bootcamp/:id`
pub struct ListReviews {
    pub bootcamp_id: Option<String>,
    pub query: ListQuery,
}

#[async_trait]
impl Action for ListReviews {
    fn name(&self) -> &'static str {
        "list_reviews"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        match &self.bootcamp_id {
            Some(bootcamp_id) => {
                let reviews = store
                    .reviews()
                    .find(&FindOptions::filtered(FilterSet::by("bootcamp", bootcamp_id.as_str())))
                    .await?;
                Ok(ResultEnvelope::listing(to_values(reviews)))
            }
            None => {
                let (docs, pagination) = advanced_results(store.reviews(), &self.query).await?;
                let reviews = populate_bootcamps(store, docs).await?;
                Ok(ResultEnvelope::paginated(reviews, pagination))
            }
        }
    }
}

/// `GET /reviews/:id`
pub struct GetReview {
    pub id: String,
}

#[async_trait]
impl Action for GetReview {
    fn name(&self) -> &'static str {
        "get_review"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let review = store
            .reviews()
            .find_by_id(&self.id)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        Ok(ResultEnvelope::ok(populate_bootcamp(store, review).await?))
    }
}

/// `POST /reviews/:id`, reviewing bootcamp `:id`. One review per user and bootcamp.
pub struct CreateReview {
    pub bootcamp_id: String,
    pub input: ReviewInput,
}

#[async_trait]
impl Action for CreateReview {
    fn name(&self) -> &'static str {
        "create_review"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let auth = caller(ctx)?;
        if store.bootcamps().find_by_id(&self.bootcamp_id).await?.is_none() {
            return Err(ActionError::not_found(format!(
                "No bootcamp with the id of {}",
                self.bootcamp_id
            )));
        }
        self.input.validate_new()?;

        let created = store
            .reviews()
            .create(self.input.to_new_document(&self.bootcamp_id, &auth.user_id))
            .await?;
        recompute_average_rating(store, &self.bootcamp_id).await?;

        info!(bootcamp = %self.bootcamp_id, user = %auth.user_id, "review created");
        Ok(ResultEnvelope::created(Value::Object(created)))
    }
}

/// `PUT /reviews/:id`
pub struct UpdateReview {
    pub id: String,
    pub input: ReviewInput,
}

#[async_trait]
impl Action for UpdateReview {
    fn name(&self) -> &'static str {
        "update_review"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let auth = caller(ctx)?;
        let existing = store
            .reviews()
            .find_by_id(&self.id)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        ensure_owner(auth, &existing, "update", &format!("review {}", self.id))?;
        self.input.validate_patch()?;

        let updated = store
            .reviews()
            .update(&self.id, self.input.to_document())
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        if let Some(bootcamp_id) = str_field(&updated, "bootcamp") {
            recompute_average_rating(store, bootcamp_id).await?;
        }

        Ok(ResultEnvelope::ok(Value::Object(updated)))
    }
}

/// `DELETE /reviews/:id`
pub struct DeleteReview {
    pub id: String,
}

#[async_trait]
impl Action for DeleteReview {
    fn name(&self) -> &'static str {
        "delete_review"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let auth = caller(ctx)?;
        let existing = store
            .reviews()
            .find_by_id(&self.id)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        ensure_owner(auth, &existing, "delete", &format!("review {}", self.id))?;

        store.reviews().delete(&self.id).await?;
        if let Some(bootcamp_id) = str_field(&existing, "bootcamp") {
            recompute_average_rating(store, bootcamp_id).await?;
        }

        info!(review = %self.id, user = %auth.user_id, "review deleted");
        Ok(ResultEnvelope::ok(json!({})))
    }
}
