//! Structured logging.
//!
//! Uses the tracing crate; events go to stderr. `RUST_LOG` overrides the
//! default filter, which is raised to debug when debug logging is enabled.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directives for the given debug setting.
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "origin_relay=debug,tower_http=debug"
    } else {
        "origin_relay=info"
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(debug: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
