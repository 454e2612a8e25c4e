//! # Connection Provider
//!
//! Lazily connects each named store on first use and memoizes the handle
//! for the provider's lifetime.
//!
//! ## Behavior
//! - Up to `max_attempts` sequential connect attempts, with capped
//!   exponential backoff between them.
//! - After exhausting the attempts the slot stays empty; the next call
//!   starts over from attempt 1.
//! - Concurrent first calls for the same store are serialized on the slot
//!   lock, so exactly one successful connect is memoized.
//! - Store `Error`/`Disconnected` events are logged, never acted on.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use super::backend::StoreEvent;
use super::connector::{StoreConfig, StoreConnector};
use super::errors::ConnectError;
use super::handle::StoreHandle;

/// Named store connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreName {
    /// Primary store; authoritative for responses
    Cloud,
    /// Secondary store used by dual dispatch
    Offline,
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreName::Cloud => f.write_str("cloud"),
            StoreName::Offline => f.write_str("offline"),
        }
    }
}

/// Retry schedule for the initial connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

struct Slot {
    config: StoreConfig,
    handle: Mutex<Option<StoreHandle>>,
}

/// Owns the store connections of one application instance
pub struct ConnectionProvider {
    connector: Arc<dyn StoreConnector>,
    retry: RetryPolicy,
    slots: HashMap<StoreName, Slot>,
}

impl ConnectionProvider {
    pub fn new(connector: Arc<dyn StoreConnector>, retry: RetryPolicy) -> Self {
        Self {
            connector,
            retry,
            slots: HashMap::new(),
        }
    }

    /// Register a store's configuration
    pub fn with_store(mut self, name: StoreName, config: StoreConfig) -> Self {
        self.slots.insert(
            name,
            Slot {
                config,
                handle: Mutex::new(None),
            },
        );
        self
    }

    pub fn is_configured(&self, name: StoreName) -> bool {
        self.slots.contains_key(&name)
    }

    /// Whether a handle is currently memoized for `name`
    pub async fn is_connected(&self, name: StoreName) -> bool {
        match self.slots.get(&name) {
            Some(slot) => slot.handle.lock().await.is_some(),
            None => false,
        }
    }

    /// Get the handle for `name`, connecting on first use
    pub async fn handle(&self, name: StoreName) -> Result<StoreHandle, ConnectError> {
        let slot = self
            .slots
            .get(&name)
            .ok_or(ConnectError::NotConfigured(name))?;

        let mut memoized = slot.handle.lock().await;
        if let Some(handle) = memoized.as_ref() {
            return Ok(handle.clone());
        }

        let handle = self.connect_with_retry(name, &slot.config).await?;
        *memoized = Some(handle.clone());
        Ok(handle)
    }

    async fn connect_with_retry(
        &self,
        name: StoreName,
        config: &StoreConfig,
    ) -> Result<StoreHandle, ConnectError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let result = match self.connector.connect(config).await {
                Ok(store) => {
                    let events = store.subscribe();
                    StoreHandle::bind(name, store)
                        .await
                        .map(|handle| (handle, events))
                        .map_err(ConnectError::from)
                }
                Err(e) => Err(e),
            };

            match result {
                Ok((handle, events)) => {
                    spawn_event_logger(name, events);
                    info!(store = %name, attempt, "store connected");
                    return Ok(handle);
                }
                Err(e) => {
                    warn!(store = %name, attempt, attempts, error = %e, "store connection attempt failed");
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    }
                }
            }
        }

        error!(store = %name, attempts, "giving up on store connection");
        Err(ConnectError::Exhausted {
            store: name,
            attempts,
            last: Box::new(last_error.unwrap_or(ConnectError::NotConfigured(name))),
        })
    }
}

fn spawn_event_logger(name: StoreName, mut events: broadcast::Receiver<StoreEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(StoreEvent::Error(message)) => {
                    error!(store = %name, error = %message, "store reported an error")
                }
                Ok(StoreEvent::Disconnected) => warn!(store = %name, "store disconnected"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(store = %name, skipped, "store event listener lagged")
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
