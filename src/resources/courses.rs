//! Course actions. Every mutation recomputes the bootcamp's `averageCost`.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::advanced::{advanced_results, ListQuery};
use super::aggregates::recompute_average_cost;
use super::{caller, ensure_owner, populate_bootcamp, populate_bootcamps, to_values};
use crate::dispatch::{Action, ActionError, ActionResult, RequestContext, ResultEnvelope};
use crate::models::CourseInput;
use crate::store::document::str_field;
use crate::store::{FilterSet, FindOptions, StoreHandle};

fn not_found(id: &str) -> ActionError {
    ActionError::not_found(format!("No course with the id of {}", id))
}

/// `GET /courses` or `GET /courses/:id/courses`
pub struct ListCourses {
    pub bootcamp_id: Option<String>,
    pub query: ListQuery,
}

#[async_trait]
impl Action for ListCourses {
    fn name(&self) -> &'static str {
        "list_courses"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        match &self.bootcamp_id {
            Some(bootcamp_id) => {
                let courses = store
                    .courses()
                    .find(&FindOptions::filtered(FilterSet::by("bootcamp", bootcamp_id.as_str())))
                    .await?;
                Ok(ResultEnvelope::listing(to_values(courses)))
            }
            None => {
                let (docs, pagination) = advanced_results(store.courses(), &self.query).await?;
                let courses = populate_bootcamps(store, docs).await?;
                Ok(ResultEnvelope::paginated(courses, pagination))
            }
        }
    }
}

/// `GET /courses/:id`
pub struct GetCourse {
    pub id: String,
}

#[async_trait]
impl Action for GetCourse {
    fn name(&self) -> &'static str {
        "get_course"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let course = store
            .courses()
            .find_by_id(&self.id)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        Ok(ResultEnvelope::ok(populate_bootcamp(store, course).await?))
    }
}

/// `POST /courses/:id/courses`
pub struct CreateCourse {
    pub bootcamp_id: String,
    pub input: CourseInput,
}

#[async_trait]
impl Action for CreateCourse {
    fn name(&self) -> &'static str {
        "create_course"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let auth = caller(ctx)?;
        let bootcamp = store
            .bootcamps()
            .find_by_id(&self.bootcamp_id)
            .await?
            .ok_or_else(|| ActionError::not_found(format!("No bootcamp with the id of {}", self.bootcamp_id)))?;
        ensure_owner(
            auth,
            &bootcamp,
            "add a course to",
            &format!("bootcamp {}", self.bootcamp_id),
        )?;
        self.input.validate_new()?;

        let created = store
            .courses()
            .create(self.input.to_new_document(&self.bootcamp_id, &auth.user_id))
            .await?;
        recompute_average_cost(store, &self.bootcamp_id).await?;

        info!(bootcamp = %self.bootcamp_id, user = %auth.user_id, "course created");
        Ok(ResultEnvelope::created(serde_json::Value::Object(created)))
    }
}

/// `PUT /courses/:id`
pub struct UpdateCourse {
    pub id: String,
    pub input: CourseInput,
}

#[async_trait]
impl Action for UpdateCourse {
    fn name(&self) -> &'static str {
        "update_course"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let auth = caller(ctx)?;
        let existing = store
            .courses()
            .find_by_id(&self.id)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        ensure_owner(auth, &existing, "update", &format!("course {}", self.id))?;
        self.input.validate_patch()?;

        let updated = store
            .courses()
            .update(&self.id, self.input.to_document())
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        if let Some(bootcamp_id) = str_field(&updated, "bootcamp") {
            recompute_average_cost(store, bootcamp_id).await?;
        }

        Ok(ResultEnvelope::ok(serde_json::Value::Object(updated)))
    }
}

/// `DELETE /courses/:id`
pub struct DeleteCourse {
    pub id: String,
}

#[async_trait]
impl Action for DeleteCourse {
    fn name(&self) -> &'static str {
        "delete_course"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let auth = caller(ctx)?;
        let existing = store
            .courses()
            .find_by_id(&self.id)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        ensure_owner(auth, &existing, "delete", &format!("course {}", self.id))?;

        store.courses().delete(&self.id).await?;
        if let Some(bootcamp_id) = str_field(&existing, "bootcamp") {
            recompute_average_cost(store, bootcamp_id).await?;
        }

        info!(course = %self.id, user = %auth.user_id, "course deleted");
        Ok(ResultEnvelope::ok(json!({})))
    }
}
