//! # Document Store
//!
//! Persistence for bootcamps, courses, users and reviews.
//!
//! Stores are reached through a [`ConnectionProvider`], which memoizes one
//! [`StoreHandle`] per configured [`StoreName`]. Handles expose CRUD
//! operations per [`ResourceModel`] over a [`DocumentStore`] backend.

pub mod backend;
pub mod connector;
pub mod document;
pub mod errors;
pub mod handle;
pub mod memory;
pub mod model;
pub mod provider;
pub mod query;

pub use backend::{DocumentStore, StoreEvent};
pub use connector::{StoreConfig, StoreConnector, UriConnector};
pub use document::{Document, ID_FIELD};
pub use errors::{ConnectError, StoreError, StoreResult};
pub use handle::{ModelHandle, StoreHandle};
pub use memory::MemoryStore;
pub use model::ResourceModel;
pub use provider::{ConnectionProvider, RetryPolicy, StoreName};
pub use query::{FilterExpr, FilterOperator, FilterSet, FindOptions, OrderBy};
