//! Logging initialization for PharmTrust binaries.
//!
//! The library only emits `tracing` events; binaries pick a subscriber.
//! Level comes from `RUST_LOG`, defaulting to `info`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Human-readable output on stderr.
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

/// JSON lines on stderr, for log aggregation.
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
        .init();
}
