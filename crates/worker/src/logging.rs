//! Tracing setup shared by both binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset. Names every workspace crate so
/// degraded-read warnings from the store and config loader are visible.
pub const DEFAULT_LOG_FILTER: &str =
    "surface_worker=info,surface_store=info,surface_core=info,surface_pipeline=info";

/// Install the global subscriber: `RUST_LOG` if set, else [`DEFAULT_LOG_FILTER`].
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
