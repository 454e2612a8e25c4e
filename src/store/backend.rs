//! Store backend trait.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::document::Document;
use super::errors::StoreResult;
use super::query::{FilterSet, FindOptions};

/// Lifecycle events a connected store reports
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A background failure (for example a snapshot flush)
    Error(String),

    /// The store closed its connection
    Disconnected,
}

/// Collection-oriented document persistence
///
/// Every document carries a string `_id`. Implementations must be safe to
/// share between concurrent requests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name the store was connected under (for logs)
    fn name(&self) -> &str;

    /// Declare a unique index over `fields` in `collection`
    async fn ensure_unique_index(&self, collection: &str, fields: &[&str]) -> StoreResult<()>;

    /// Insert a document, assigning `_id` when absent
    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<Document>;

    /// Insert several documents; all-or-nothing
    async fn insert_many(&self, collection: &str, docs: Vec<Document>) -> StoreResult<Vec<Document>>;

    /// Read a document by ID
    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Query documents
    async fn find(&self, collection: &str, options: &FindOptions) -> StoreResult<Vec<Document>>;

    /// Count documents matching a filter
    async fn count(&self, collection: &str, filter: &FilterSet) -> StoreResult<usize>;

    /// Merge a patch into a document (`null` values unset fields)
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> StoreResult<Option<Document>>;

    /// Delete a document, returning it
    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Delete every matching document, returning how many were removed
    async fn delete_many(&self, collection: &str, filter: &FilterSet) -> StoreResult<usize>;

    /// Subscribe to lifecycle events
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
