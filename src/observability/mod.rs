//! # Observability
//!
//! Tracing subscriber setup and the dispatch counters reported by
//! `/health`.

mod metrics;

pub use metrics::{DispatchMetrics, MetricsSnapshot};

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,tower_http=debug";

/// Install the global fmt subscriber. Later calls are no-ops.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
