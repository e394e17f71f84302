//! Tracing subscriber setup.
//!
//! `RUST_LOG` overrides the default filter, e.g.
//! `RUST_LOG=photo_intake=debug,tower_http=debug`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str = "photo_intake=info,tower_http=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Install the global subscriber. `json` switches to one JSON object per line.
pub fn init_tracing(json: bool) {
    let registry = tracing_subscriber::registry().with(env_filter());
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
