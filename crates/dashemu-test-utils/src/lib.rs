#![forbid(unsafe_code)]
#![expect(
    clippy::unwrap_used,
    reason = "unwraps are fine in test helpers"
)]
#![expect(
    clippy::missing_panics_doc,
    reason = "test helpers panic on setup failure"
)]

//! Shared test utilities for the dashemu workspace.

pub mod fixtures;
pub mod http_server;

pub use fixtures::*;
pub use http_server::TestHttpServer;

/// Installs a `tracing` subscriber honouring `RUST_LOG`; safe to call twice.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
