//! # Dual-Store Coordinator
//!
//! Routes an action to the primary (cloud) store, or in dual mode to both
//! stores at once. Dual mode joins the two executions and yields a
//! [`DualOutcome`] only after both have settled; the primary is
//! authoritative for status and payload, the secondary only contributes to
//! the combined outcome.

use std::sync::Arc;

use futures_util::future::join;
use tracing::{debug, error, info};

use super::context::RequestContext;
use super::envelope::{Outcome, ResultEnvelope};
use super::executor::{execute, Action};
use crate::store::{ConnectionProvider, StoreName};

/// Which stores an action runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    PrimaryOnly,
    Dual,
}

/// Settled results of both branches of a dual dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct DualOutcome {
    pub primary: ResultEnvelope,
    pub secondary: ResultEnvelope,
}

impl DualOutcome {
    /// Failure if either branch failed
    pub fn outcome(&self) -> Outcome {
        self.primary.outcome.combine(self.secondary.outcome)
    }

    /// The primary envelope carrying the combined outcome
    pub fn combined(&self) -> ResultEnvelope {
        ResultEnvelope {
            outcome: self.outcome(),
            ..self.primary.clone()
        }
    }
}

/// Result of one dispatch; consumed exactly once by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Single(ResultEnvelope),
    Dual(DualOutcome),
}

impl Dispatched {
    /// Envelope to send
    pub fn envelope(&self) -> ResultEnvelope {
        match self {
            Dispatched::Single(envelope) => envelope.clone(),
            Dispatched::Dual(dual) => dual.combined(),
        }
    }

    pub fn secondary(&self) -> Option<&ResultEnvelope> {
        match self {
            Dispatched::Single(_) => None,
            Dispatched::Dual(dual) => Some(&dual.secondary),
        }
    }
}

/// Dispatches actions over the provider's stores
#[derive(Clone)]
pub struct Coordinator {
    provider: Arc<ConnectionProvider>,
}

impl Coordinator {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &ConnectionProvider {
        &self.provider
    }

    /// Run `action` per `mode`. Dual mode falls back to primary-only when
    /// no secondary store is configured.
    pub async fn dispatch(&self, ctx: &RequestContext, action: &dyn Action, mode: DispatchMode) -> Dispatched {
        if mode == DispatchMode::Dual && self.provider.is_configured(StoreName::Offline) {
            let (primary, secondary) = join(
                self.run_on(StoreName::Cloud, ctx, action),
                self.run_on(StoreName::Offline, ctx, action),
            )
            .await;

            let dual = DualOutcome { primary, secondary };
            info!(
                request_id = %ctx.request_id,
                action = action.name(),
                primary = %dual.primary.outcome,
                primary_status = dual.primary.status,
                secondary = %dual.secondary.outcome,
                secondary_status = dual.secondary.status,
                "dual dispatch settled"
            );
            return Dispatched::Dual(dual);
        }

        if mode == DispatchMode::Dual {
            debug!(action = action.name(), "no offline store configured, dispatching to primary only");
        }
        Dispatched::Single(self.run_on(StoreName::Cloud, ctx, action).await)
    }

    /// Run against the primary store and return its envelope
    pub async fn primary(&self, ctx: &RequestContext, action: &dyn Action) -> ResultEnvelope {
        self.run_on(StoreName::Cloud, ctx, action).await
    }

    async fn run_on(&self, name: StoreName, ctx: &RequestContext, action: &dyn Action) -> ResultEnvelope {
        match self.provider.handle(name).await {
            Ok(handle) => execute(ctx, &handle, action).await,
            Err(err) => {
                error!(
                    request_id = %ctx.request_id,
                    store = %name,
                    action = action.name(),
                    error = %err,
                    "store unavailable"
                );
                ResultEnvelope::failure(format!("Store '{}' is unavailable", name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::errors::{ActionError, ActionResult};
    use crate::store::{RetryPolicy, StoreConfig, StoreHandle, UriConnector};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    fn provider(offline: bool) -> Arc<ConnectionProvider> {
        let mut provider = ConnectionProvider::new(Arc::new(UriConnector::new()), RetryPolicy::immediate(1))
            .with_store(StoreName::Cloud, StoreConfig::new("memory://cloud"));
        if offline {
            provider = provider.with_store(StoreName::Offline, StoreConfig::new("memory://offline"));
        }
        Arc::new(provider)
    }

    /// Primary fails after 50ms, secondary succeeds after 10ms
    struct Staggered {
        settled: Mutex<Vec<StoreName>>,
    }

    #[async_trait]
    impl Action for Staggered {
        fn name(&self) -> &'static str {
            "staggered"
        }

        async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
            let result = match store.name() {
                StoreName::Cloud => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Err(ActionError::Operation("primary write failed".to_string()))
                }
                StoreName::Offline => {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok(ResultEnvelope::ok(json!({"store": "offline"})))
                }
            };
            self.settled.lock().unwrap().push(store.name());
            result
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dual_waits_for_both_and_fails_if_either_fails() {
        let coordinator = Coordinator::new(provider(true));
        let action = Staggered {
            settled: Mutex::new(Vec::new()),
        };
        let ctx = RequestContext::anonymous();

        let started = Instant::now();
        let dispatched = coordinator.dispatch(&ctx, &action, DispatchMode::Dual).await;

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(
            *action.settled.lock().unwrap(),
            vec![StoreName::Offline, StoreName::Cloud]
        );

        let Dispatched::Dual(dual) = &dispatched else {
            panic!("expected a dual outcome");
        };
        assert!(dual.secondary.is_success());
        assert!(!dual.primary.is_success());
        assert_eq!(dual.outcome(), Outcome::Failure);

        let envelope = dispatched.envelope();
        assert_eq!(envelope.outcome, Outcome::Failure);
        assert_eq!(envelope.status, 500);
    }

    #[tokio::test]
    async fn test_payload_comes_from_primary() {
        struct WhichStore;

        #[async_trait]
        impl Action for WhichStore {
            fn name(&self) -> &'static str {
                "which_store"
            }

            async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
                Ok(ResultEnvelope::ok(json!({"store": store.name().to_string()})))
            }
        }

        let coordinator = Coordinator::new(provider(true));
        let dispatched = coordinator
            .dispatch(&RequestContext::anonymous(), &WhichStore, DispatchMode::Dual)
            .await;

        let envelope = dispatched.envelope();
        assert_eq!(envelope.outcome, Outcome::Success);
        assert_eq!(envelope.body().unwrap()["data"], json!({"store": "cloud"}));
        assert_eq!(
            dispatched.secondary().unwrap().body().unwrap()["data"],
            json!({"store": "offline"})
        );
    }

    #[tokio::test]
    async fn test_dual_without_offline_runs_primary_only() {
        let coordinator = Coordinator::new(provider(false));
        let action = Staggered {
            settled: Mutex::new(Vec::new()),
        };

        let dispatched = coordinator
            .dispatch(&RequestContext::anonymous(), &action, DispatchMode::Dual)
            .await;

        assert!(matches!(dispatched, Dispatched::Single(_)));
        assert_eq!(*action.settled.lock().unwrap(), vec![StoreName::Cloud]);
    }

    #[tokio::test]
    async fn test_unreachable_store_is_failure_envelope() {
        let provider = ConnectionProvider::new(Arc::new(UriConnector::new()), RetryPolicy::immediate(2))
            .with_store(StoreName::Cloud, StoreConfig::new("postgres://nowhere"));
        let coordinator = Coordinator::new(Arc::new(provider));

        let envelope = coordinator
            .dispatch(
                &RequestContext::anonymous(),
                &Staggered {
                    settled: Mutex::new(Vec::new()),
                },
                DispatchMode::PrimaryOnly,
            )
            .await
            .envelope();

        assert_eq!(envelope.status, 500);
        assert_eq!(envelope.outcome, Outcome::Failure);
    }
}
