//! Diagnostic logging setup.
//!
//! Rendered answers go to stdout, so diagnostics always go to stderr.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "threadline=warn";

/// Pick the filter directive: explicit flag, then `RUST_LOG`, then the default.
pub fn resolve_filter(explicit: Option<&str>, env_value: Option<String>) -> String {
    explicit
        .map(str::to_owned)
        .or(env_value)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_tracing(explicit_filter: Option<&str>) {
    let directive = resolve_filter(explicit_filter, std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
