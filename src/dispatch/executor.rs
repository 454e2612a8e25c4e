//! Action Executor
//!
//! Runs one [`Action`] against one store and always yields a
//! [`ResultEnvelope`]: errors become envelopes per the action error
//! taxonomy, and a panicking action becomes a 500 failure.

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures_util::FutureExt;
use tracing::{debug, error, warn};

use super::context::RequestContext;
use super::envelope::ResultEnvelope;
use super::errors::{ActionError, ActionResult};
use crate::store::StoreHandle;

/// A resource operation, carrying its own inputs
#[async_trait]
pub trait Action: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Run against one connected store
    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult;
}

/// Execute `action` against `store`. Nothing escapes this boundary.
pub async fn execute(ctx: &RequestContext, store: &StoreHandle, action: &dyn Action) -> ResultEnvelope {
    let result = AssertUnwindSafe(action.run(ctx, store)).catch_unwind().await;

    let envelope = match result {
        Ok(Ok(envelope)) => envelope,
        Ok(Err(err)) => {
            log_action_error(ctx, store, action, &err);
            err.into()
        }
        Err(_) => {
            error!(
                request_id = %ctx.request_id,
                store = %store.name(),
                action = action.name(),
                "action panicked"
            );
            ResultEnvelope::failure("Internal server error")
        }
    };

    debug!(
        request_id = %ctx.request_id,
        store = %store.name(),
        action = action.name(),
        status = envelope.status,
        outcome = %envelope.outcome,
        elapsed_ms = ctx.elapsed_ms() as u64,
        "action executed"
    );

    envelope
}

fn log_action_error(ctx: &RequestContext, store: &StoreHandle, action: &dyn Action, err: &ActionError) {
    match err {
        ActionError::Operation(_) => error!(
            request_id = %ctx.request_id,
            store = %store.name(),
            action = action.name(),
            error = %err,
            "action failed"
        ),
        _ => warn!(
            request_id = %ctx.request_id,
            store = %store.name(),
            action = action.name(),
            status = err.status_code(),
            error = %err,
            "action rejected"
        ),
    }
}
