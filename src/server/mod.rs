//! HTTP wiring for list endpoints

pub mod builder;

pub use builder::ListRouterBuilder;

use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber reading `RUST_LOG`, defaulting to `info`
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
