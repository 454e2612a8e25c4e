//! Store connectors.
//!
//! A [`StoreConnector`] turns a [`StoreConfig`] into a live
//! [`DocumentStore`]. The provider owns retry; connectors make exactly one
//! attempt per call.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use super::backend::DocumentStore;
use super::errors::ConnectError;
use super::memory::MemoryStore;

/// Connection settings for one named store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Connection URI (`memory://name`, `file:///path/to/snapshot.json`)
    pub uri: String,

    /// Opaque connector options
    pub options: BTreeMap<String, String>,
}

impl StoreConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Makes a single connection attempt
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, ConnectError>;
}

/// Connector dispatching on the URI scheme
///
/// `memory://` stores are registered by name so that reconnecting to the
/// same URI reaches the same data, as a database server would.
#[derive(Default)]
pub struct UriConnector {
    memory: Mutex<HashMap<String, Arc<MemoryStore>>>,
}

impl UriConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreConnector for UriConnector {
    async fn connect(&self, config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, ConnectError> {
        if let Some(name) = config.uri.strip_prefix("memory://") {
            let mut registry = self.memory.lock().await;
            let store: Arc<dyn DocumentStore> = registry
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(MemoryStore::new(name)))
                .clone();
            info!(uri = %config.uri, "connected to in-memory store");
            return Ok(store);
        }

        if let Some(path) = config.uri.strip_prefix("file://") {
            let name = config
                .options
                .get("name")
                .cloned()
                .unwrap_or_else(|| path.to_string());
            let store = MemoryStore::open(name, path)
                .await
                .map_err(|e| ConnectError::Unreachable {
                    uri: config.uri.clone(),
                    reason: e.to_string(),
                })?;
            info!(uri = %config.uri, "connected to snapshot store");
            return Ok(Arc::new(store));
        }

        Err(ConnectError::UnsupportedScheme(config.uri.clone()))
    }
}
