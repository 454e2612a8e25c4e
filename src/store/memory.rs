//! In-memory document store with optional write-through snapshot.
//!
//! Documents live in per-collection vectors guarded by a single
//! `RwLock`. When opened with a snapshot path, every mutation rewrites
//! the snapshot file (temp file + rename) before the lock is released,
//! and a mutation whose snapshot write fails is not applied.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error};

use super::backend::{DocumentStore, StoreEvent};
use super::document::{document_id, get_path, merge_patch, new_id, project, Document, ID_FIELD};
use super::errors::{StoreError, StoreResult};
use super::query::{compare_documents, FilterSet, FindOptions};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    collections: HashMap<String, Vec<Document>>,
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<String, Vec<Document>>,
    unique_indexes: HashMap<String, Vec<Vec<String>>>,
}

impl Inner {
    fn collection(&self, name: &str) -> &[Document] {
        self.collections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reject `doc` if it collides with another document on `_id` or a
    /// unique index. `candidates` is the collection it will live in.
    fn check_unique(
        &self,
        collection: &str,
        candidates: &[Document],
        doc: &Document,
        replacing: Option<&str>,
    ) -> StoreResult<()> {
        let doc_id = document_id(doc);
        let others = candidates
            .iter()
            .filter(|other| replacing.is_none() || document_id(other) != replacing);

        let indexes = self
            .unique_indexes
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        for other in others {
            if replacing.is_none() && doc_id.is_some() && document_id(other) == doc_id {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    fields: ID_FIELD.to_string(),
                });
            }

            for fields in indexes {
                let key: Vec<Option<&Value>> = fields.iter().map(|f| get_path(doc, f)).collect();
                if key.iter().all(Option::is_none) {
                    continue;
                }
                let other_key: Vec<Option<&Value>> =
                    fields.iter().map(|f| get_path(other, f)).collect();
                if key == other_key {
                    return Err(StoreError::DuplicateKey {
                        collection: collection.to_string(),
                        fields: fields.join(", "),
                    });
                }
            }
        }
        Ok(())
    }
}

/// In-memory document store
pub struct MemoryStore {
    name: String,
    inner: RwLock<Inner>,
    snapshot: Option<PathBuf>,
    events: broadcast::Sender<StoreEvent>,
    closed: AtomicBool,
}

impl MemoryStore {
    /// Create an empty, purely in-memory store
    pub fn new(name: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            name: name.into(),
            inner: RwLock::new(Inner::default()),
            snapshot: None,
            events,
            closed: AtomicBool::new(false),
        }
    }

    /// Open a store backed by a JSON snapshot, loading it when present
    pub async fn open(name: impl Into<String>, path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut store = Self::new(name);

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Io(format!("corrupt snapshot {}: {}", path.display(), e)))?;
                let loaded: usize = snapshot.collections.values().map(Vec::len).sum();
                debug!(path = %path.display(), documents = loaded, "loaded store snapshot");
                store.inner.get_mut().collections = snapshot.collections;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io(e.to_string())),
        }

        store.snapshot = Some(path);
        Ok(store)
    }

    /// Close the store; later operations fail with `Disconnected`
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let _ = self.events.send(StoreEvent::Disconnected);
        }
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StoreError::Disconnected)
        } else {
            Ok(())
        }
    }

    async fn flush(&self, inner: &Inner) -> StoreResult<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        let result = write_snapshot(path, &inner.collections).await;
        if let Err(e) = &result {
            error!(store = %self.name, error = %e, "snapshot flush failed");
            let _ = self.events.send(StoreEvent::Error(e.to_string()));
        }
        result
    }

    /// Swap `staged` in as `collection` and flush, restoring the previous
    /// contents when the snapshot cannot be written.
    async fn commit(&self, inner: &mut Inner, collection: &str, staged: Vec<Document>) -> StoreResult<()> {
        let previous = inner.collections.insert(collection.to_string(), staged);
        if let Err(e) = self.flush(inner).await {
            match previous {
                Some(docs) => inner.collections.insert(collection.to_string(), docs),
                None => inner.collections.remove(collection),
            };
            return Err(e);
        }
        Ok(())
    }
}

async fn write_snapshot(path: &Path, collections: &HashMap<String, Vec<Document>>) -> StoreResult<()> {
    #[derive(Serialize)]
    struct SnapshotRef<'a> {
        collections: &'a HashMap<String, Vec<Document>>,
    }

    let bytes = serde_json::to_vec(&SnapshotRef { collections })
        .map_err(|e| StoreError::Io(e.to_string()))?;

    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))
}

fn with_id(mut doc: Document) -> Document {
    if document_id(&doc).is_none() {
        doc.insert(ID_FIELD.to_string(), Value::String(new_id()));
    }
    doc
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ensure_unique_index(&self, collection: &str, fields: &[&str]) -> StoreResult<()> {
        self.ensure_open()?;
        let mut inner = self.inner.write().await;
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        let indexes = inner.unique_indexes.entry(collection.to_string()).or_default();
        if !indexes.contains(&fields) {
            indexes.push(fields);
        }
        Ok(())
    }

    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<Document> {
        self.ensure_open()?;
        let doc = with_id(doc);

        let mut inner = self.inner.write().await;
        let mut staged = inner.collection(collection).to_vec();
        inner.check_unique(collection, &staged, &doc, None)?;
        staged.push(doc.clone());
        self.commit(&mut inner, collection, staged).await?;

        Ok(doc)
    }

    async fn insert_many(&self, collection: &str, docs: Vec<Document>) -> StoreResult<Vec<Document>> {
        self.ensure_open()?;
        let mut inner = self.inner.write().await;

        let mut staged = inner.collection(collection).to_vec();
        let mut inserted = Vec::with_capacity(docs.len());
        for doc in docs {
            let doc = with_id(doc);
            inner.check_unique(collection, &staged, &doc, None)?;
            staged.push(doc.clone());
            inserted.push(doc);
        }

        self.commit(&mut inner, collection, staged).await?;
        Ok(inserted)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.ensure_open()?;
        let inner = self.inner.read().await;
        Ok(inner
            .collection(collection)
            .iter()
            .find(|doc| document_id(doc) == Some(id))
            .cloned())
    }

    async fn find(&self, collection: &str, options: &FindOptions) -> StoreResult<Vec<Document>> {
        self.ensure_open()?;
        let inner = self.inner.read().await;

        let mut matched: Vec<&Document> = inner
            .collection(collection)
            .iter()
            .filter(|doc| options.filter.matches(doc))
            .collect();

        if !options.order.is_empty() {
            matched.sort_by(|a, b| compare_documents(a, b, &options.order));
        }

        let limit = options.limit.unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .skip(options.skip)
            .take(limit)
            .map(|doc| match &options.select {
                Some(fields) => project(doc, fields),
                None => doc.clone(),
            })
            .collect())
    }

    async fn count(&self, collection: &str, filter: &FilterSet) -> StoreResult<usize> {
        self.ensure_open()?;
        let inner = self.inner.read().await;
        Ok(inner
            .collection(collection)
            .iter()
            .filter(|doc| filter.matches(doc))
            .count())
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        self.ensure_open()?;
        let mut inner = self.inner.write().await;

        let Some(position) = inner
            .collection(collection)
            .iter()
            .position(|doc| document_id(doc) == Some(id))
        else {
            return Ok(None);
        };

        let mut staged = inner.collection(collection).to_vec();
        let mut updated = staged[position].clone();
        merge_patch(&mut updated, patch);
        inner.check_unique(collection, &staged, &updated, Some(id))?;

        staged[position] = updated.clone();
        self.commit(&mut inner, collection, staged).await?;

        Ok(Some(updated))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.ensure_open()?;
        let mut inner = self.inner.write().await;

        let mut staged = inner.collection(collection).to_vec();
        let Some(position) = staged.iter().position(|doc| document_id(doc) == Some(id)) else {
            return Ok(None);
        };

        let removed = staged.remove(position);
        self.commit(&mut inner, collection, staged).await?;
        Ok(Some(removed))
    }

    async fn delete_many(&self, collection: &str, filter: &FilterSet) -> StoreResult<usize> {
        self.ensure_open()?;
        let mut inner = self.inner.write().await;

        let mut staged = inner.collection(collection).to_vec();
        let before = staged.len();
        staged.retain(|doc| !filter.matches(doc));
        let removed = before - staged.len();

        if removed > 0 {
            self.commit(&mut inner, collection, staged).await?;
        }
        Ok(removed)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::document::into_document;
    use crate::store::query::{FilterExpr, OrderBy};
    use serde_json::json;

    fn doc(value: Value) -> Document {
        into_document(value).unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = MemoryStore::new("test");
        let inserted = store.insert("bootcamps", doc(json!({"name": "A"}))).await.unwrap();

        let id = document_id(&inserted).unwrap().to_string();
        let found = store.find_by_id("bootcamps", &id).await.unwrap().unwrap();
        assert_eq!(found["name"], "A");
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicates() {
        let store = MemoryStore::new("test");
        store.ensure_unique_index("users", &["email"]).await.unwrap();

        store.insert("users", doc(json!({"email": "a@b.io"}))).await.unwrap();
        let dup = store.insert("users", doc(json!({"email": "a@b.io"}))).await;
        assert!(matches!(dup, Err(StoreError::DuplicateKey { .. })));

        // a different value is fine
        store.insert("users", doc(json!({"email": "c@d.io"}))).await.unwrap();
    }

    #[tokio::test]
    async fn test_compound_unique_index() {
        let store = MemoryStore::new("test");
        store
            .ensure_unique_index("reviews", &["bootcamp", "user"])
            .await
            .unwrap();

        store
            .insert("reviews", doc(json!({"bootcamp": "b1", "user": "u1"})))
            .await
            .unwrap();
        store
            .insert("reviews", doc(json!({"bootcamp": "b2", "user": "u1"})))
            .await
            .unwrap();
        let dup = store
            .insert("reviews", doc(json!({"bootcamp": "b1", "user": "u1"})))
            .await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_update_checks_unique_excluding_self() {
        let store = MemoryStore::new("test");
        store.ensure_unique_index("bootcamps", &["name"]).await.unwrap();

        let a = store.insert("bootcamps", doc(json!({"name": "A"}))).await.unwrap();
        store.insert("bootcamps", doc(json!({"name": "B"}))).await.unwrap();
        let a_id = document_id(&a).unwrap();

        // re-saving the same name is not a conflict
        let same = store
            .update_by_id("bootcamps", a_id, doc(json!({"name": "A", "phone": "1"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same["phone"], "1");

        let clash = store
            .update_by_id("bootcamps", a_id, doc(json!({"name": "B"})))
            .await;
        assert!(clash.is_err());

        let missing = store
            .update_by_id("bootcamps", "nope", doc(json!({"name": "C"})))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_find_filter_sort_page_select() {
        let store = MemoryStore::new("test");
        for (title, tuition) in [("a", 100), ("b", 300), ("c", 200), ("d", 50)] {
            store
                .insert("courses", doc(json!({"title": title, "tuition": tuition, "weeks": "4"})))
                .await
                .unwrap();
        }

        let options = FindOptions::filtered(FilterSet::new().and(FilterExpr::gt("tuition", json!(60))))
            .sorted(vec![OrderBy::desc("tuition")])
            .page(1, 5)
            .select(vec!["title".to_string()]);

        let found = store.find("courses", &options).await.unwrap();
        let titles: Vec<_> = found.iter().map(|d| d["title"].clone()).collect();
        assert_eq!(titles, vec![json!("c"), json!("a")]);
        assert!(found[0].get("tuition").is_none());
        assert!(found[0].get("_id").is_some());

        let total = store
            .count("courses", &FilterSet::new().and(FilterExpr::gt("tuition", json!(60))))
            .await
            .unwrap();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_delete_many() {
        let store = MemoryStore::new("test");
        for bootcamp in ["x", "x", "y"] {
            store
                .insert("courses", doc(json!({"bootcamp": bootcamp})))
                .await
                .unwrap();
        }

        let removed = store
            .delete_many("courses", &FilterSet::by("bootcamp", "x"))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count("courses", &FilterSet::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_many_is_all_or_nothing() {
        let store = MemoryStore::new("test");
        store.ensure_unique_index("users", &["email"]).await.unwrap();

        let result = store
            .insert_many(
                "users",
                vec![doc(json!({"email": "a@x.io"})), doc(json!({"email": "a@x.io"}))],
            )
            .await;
        assert!(result.is_err());
        assert_eq!(store.count("users", &FilterSet::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_close_emits_disconnect() {
        let store = MemoryStore::new("test");
        let mut events = store.subscribe();

        store.close();

        assert_eq!(events.recv().await.unwrap(), StoreEvent::Disconnected);
        assert!(matches!(
            store.find_by_id("x", "y").await,
            Err(StoreError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offline.json");

        {
            let store = MemoryStore::open("offline", &path).await.unwrap();
            store
                .insert("bootcamps", doc(json!({"_id": "b1", "name": "Persisted"})))
                .await
                .unwrap();
        }

        let reopened = MemoryStore::open("offline", &path).await.unwrap();
        let found = reopened.find_by_id("bootcamps", "b1").await.unwrap().unwrap();
        assert_eq!(found["name"], "Persisted");
    }

    #[tokio::test]
    async fn test_failed_flush_leaves_collections_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_dir = dir.path().join("gone");
        std::fs::create_dir(&snapshot_dir).unwrap();
        let store = MemoryStore::open("offline", snapshot_dir.join("db.json")).await.unwrap();
        store
            .insert("bootcamps", doc(json!({"_id": "b1", "name": "Kept"})))
            .await
            .unwrap();

        std::fs::remove_dir_all(&snapshot_dir).unwrap();

        let inserted = store.insert("bootcamps", doc(json!({"_id": "b2", "name": "Lost"}))).await;
        assert!(matches!(inserted, Err(StoreError::Io(_))));
        assert!(store.find_by_id("bootcamps", "b2").await.unwrap().is_none());

        let updated = store
            .update_by_id("bootcamps", "b1", doc(json!({"name": "Renamed"})))
            .await;
        assert!(updated.is_err());
        assert!(store.delete_by_id("bootcamps", "b1").await.is_err());
        assert!(store
            .delete_many("bootcamps", &FilterSet::default())
            .await
            .is_err());
        assert!(store.insert("courses", doc(json!({"_id": "c1"}))).await.is_err());

        let kept = store.find_by_id("bootcamps", "b1").await.unwrap().unwrap();
        assert_eq!(kept["name"], "Kept");
        assert_eq!(store.count("courses", &FilterSet::default()).await.unwrap(), 0);

        // once the directory is back the same insert goes through
        std::fs::create_dir(&snapshot_dir).unwrap();
        store
            .insert("bootcamps", doc(json!({"_id": "b2", "name": "Lost"})))
            .await
            .unwrap();
    }
}
