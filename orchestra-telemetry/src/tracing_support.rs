//! `tracing` subscriber initialization shared by every binary built on
//! top of the orchestration core.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber honoring `RUST_LOG`, falling back to
/// `info` when the environment variable is unset.
///
/// Safe to call more than once per process: a subscriber already
/// installed (for example, by a test harness) is left in place and this
/// call becomes a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .try_init();
}
