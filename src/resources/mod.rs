//! # Resource Handlers
//!
//! One [`Action`](crate::dispatch::Action) per endpoint. Actions carry their
//! request inputs, enforce role and ownership rules, run the query against
//! the store they are given, and trigger cascades explicitly after a
//! successful mutation.

pub mod admin;
pub mod advanced;
pub mod aggregates;
pub mod auth;
pub mod bootcamps;
pub mod courses;
pub mod general;
pub mod reviews;

use serde_json::Value;

use crate::dispatch::{ActionError, AuthContext, RequestContext};
use crate::store::document::{document_id, str_field};
use crate::store::{Document, FilterSet, FindOptions, StoreHandle, StoreResult};

pub use advanced::{advanced_results, ListQuery};

/// The authenticated caller, or 401
pub(crate) fn caller(ctx: &RequestContext) -> Result<&AuthContext, ActionError> {
    ctx.auth
        .as_ref()
        .ok_or_else(|| ActionError::unauthorized("Not authorized to access this route"))
}

/// 401 unless the caller owns `doc` or is an admin
pub(crate) fn ensure_owner(auth: &AuthContext, doc: &Document, verb: &str, what: &str) -> Result<(), ActionError> {
    if auth.can_modify(str_field(doc, "user")) {
        Ok(())
    } else {
        Err(ActionError::unauthorized(format!(
            "User {} is not authorized to {} {}",
            auth.user_id, verb, what
        )))
    }
}

pub(crate) fn to_values(docs: Vec<Document>) -> Vec<Value> {
    docs.into_iter().map(Value::Object).collect()
}

/// Attach each bootcamp's courses under `courses`
pub(crate) async fn populate_courses(store: &StoreHandle, bootcamps: Vec<Document>) -> StoreResult<Vec<Value>> {
    let mut populated = Vec::with_capacity(bootcamps.len());
    for mut bootcamp in bootcamps {
        if let Some(id) = document_id(&bootcamp).map(str::to_string) {
            let courses = store
                .courses()
                .find(&FindOptions::filtered(FilterSet::by("bootcamp", id)))
                .await?;
            bootcamp.insert("courses".to_string(), Value::Array(to_values(courses)));
        }
        populated.push(Value::Object(bootcamp));
    }
    Ok(populated)
}

/// Replace the `bootcamp` reference with the bootcamp's name and description
pub(crate) async fn populate_bootcamp(store: &StoreHandle, mut doc: Document) -> StoreResult<Value> {
    if let Some(id) = str_field(&doc, "bootcamp").map(str::to_string) {
        if let Some(bootcamp) = store.bootcamps().find_by_id(&id).await? {
            let summary = crate::store::document::project(
                &bootcamp,
                &["name".to_string(), "description".to_string()],
            );
            doc.insert("bootcamp".to_string(), Value::Object(summary));
        }
    }
    Ok(Value::Object(doc))
}

pub(crate) async fn populate_bootcamps(store: &StoreHandle, docs: Vec<Document>) -> StoreResult<Vec<Value>> {
    let mut populated = Vec::with_capacity(docs.len());
    for doc in docs {
        populated.push(populate_bootcamp(store, doc).await?);
    }
    Ok(populated)
}
