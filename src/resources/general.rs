//! Bulk data import and removal over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::dispatch::{Action, ActionResult, RequestContext, ResultEnvelope};
use crate::geo::Geocoder;
use crate::seed::{delete_all, Seeder};
use crate::store::StoreHandle;

/// `GET /general/import`
pub struct ImportData {
    pub data_dir: PathBuf,
    pub geocoder: Arc<dyn Geocoder>,
}

#[async_trait]
impl Action for ImportData {
    fn name(&self) -> &'static str {
        "import_data"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let report = Seeder::new(self.data_dir.clone(), self.geocoder.as_ref())
            .import(store)
            .await?;
        Ok(ResultEnvelope::ok(json!(report)))
    }
}

/// `DELETE /general/delete`
pub struct DeleteData;

#[async_trait]
impl Action for DeleteData {
    fn name(&self) -> &'static str {
        "delete_data"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let report = delete_all(store).await?;
        Ok(ResultEnvelope::ok(json!(report)))
    }
}
