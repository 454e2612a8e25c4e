//! Store handles.
//!
//! A [`StoreHandle`] is the connected, model-bound view of one store. It
//! is created by the [`ConnectionProvider`](super::ConnectionProvider)
//! and shared by reference count; handlers never construct one.

use std::sync::Arc;

use tracing::debug;

use super::backend::DocumentStore;
use super::document::Document;
use super::errors::StoreResult;
use super::model::ResourceModel;
use super::provider::StoreName;
use super::query::{FilterSet, FindOptions};

/// Connected store bound to the resource models
#[derive(Clone)]
pub struct StoreHandle {
    name: StoreName,
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("name", &self.name)
            .field("store", &self.store.name())
            .finish()
    }
}

impl StoreHandle {
    /// Bind every resource model (declare its unique indexes) on `store`.
    pub async fn bind(name: StoreName, store: Arc<dyn DocumentStore>) -> StoreResult<Self> {
        for model in ResourceModel::ALL {
            for fields in model.unique_indexes() {
                store.ensure_unique_index(model.collection(), fields).await?;
            }
        }
        debug!(store = %name, "resource models bound");
        Ok(Self { name, store })
    }

    pub fn name(&self) -> StoreName {
        self.name
    }

    /// Underlying store
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn model(&self, model: ResourceModel) -> ModelHandle<'_> {
        ModelHandle {
            store: self.store.as_ref(),
            model,
            reveal_hidden: false,
        }
    }

    pub fn bootcamps(&self) -> ModelHandle<'_> {
        self.model(ResourceModel::Bootcamp)
    }

    pub fn courses(&self) -> ModelHandle<'_> {
        self.model(ResourceModel::Course)
    }

    pub fn users(&self) -> ModelHandle<'_> {
        self.model(ResourceModel::User)
    }

    pub fn reviews(&self) -> ModelHandle<'_> {
        self.model(ResourceModel::Review)
    }
}

/// CRUD operations for one resource model
pub struct ModelHandle<'a> {
    store: &'a dyn DocumentStore,
    model: ResourceModel,
    reveal_hidden: bool,
}

impl<'a> ModelHandle<'a> {
    /// Include hidden fields (password hashes, reset tokens) in results
    pub fn with_hidden(mut self) -> Self {
        self.reveal_hidden = true;
        self
    }

    pub fn resource(&self) -> ResourceModel {
        self.model
    }

    fn conceal(&self, mut doc: Document) -> Document {
        if !self.reveal_hidden {
            for field in self.model.hidden_fields() {
                doc.remove(*field);
            }
        }
        doc
    }

    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<Document>> {
        let doc = self.store.find_by_id(self.model.collection(), id).await?;
        Ok(doc.map(|d| self.conceal(d)))
    }

    pub async fn find_one(&self, filter: FilterSet) -> StoreResult<Option<Document>> {
        let options = FindOptions::filtered(filter).page(0, 1);
        Ok(self.find(&options).await?.into_iter().next())
    }

    pub async fn find(&self, options: &FindOptions) -> StoreResult<Vec<Document>> {
        let docs = self.store.find(self.model.collection(), options).await?;
        Ok(docs.into_iter().map(|d| self.conceal(d)).collect())
    }

    pub async fn count(&self, filter: &FilterSet) -> StoreResult<usize> {
        self.store.count(self.model.collection(), filter).await
    }

    pub async fn create(&self, doc: Document) -> StoreResult<Document> {
        let created = self.store.insert(self.model.collection(), doc).await?;
        Ok(self.conceal(created))
    }

    pub async fn create_many(&self, docs: Vec<Document>) -> StoreResult<usize> {
        let created = self.store.insert_many(self.model.collection(), docs).await?;
        Ok(created.len())
    }

    pub async fn update(&self, id: &str, patch: Document) -> StoreResult<Option<Document>> {
        let updated = self
            .store
            .update_by_id(self.model.collection(), id, patch)
            .await?;
        Ok(updated.map(|d| self.conceal(d)))
    }

    pub async fn delete(&self, id: &str) -> StoreResult<Option<Document>> {
        let removed = self.store.delete_by_id(self.model.collection(), id).await?;
        Ok(removed.map(|d| self.conceal(d)))
    }

    pub async fn delete_many(&self, filter: &FilterSet) -> StoreResult<usize> {
        self.store.delete_many(self.model.collection(), filter).await
    }
}
