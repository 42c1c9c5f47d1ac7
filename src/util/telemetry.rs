//! Tracing setup for the pool's structured log events.

/// Install an env-filtered fmt subscriber if the process has none yet.
///
/// `RUST_LOG` is honored when set; otherwise the crate's own events default
/// to `info` so pool start/shutdown lines are visible without per-item debug
/// noise. A subscriber already installed by the caller is left untouched.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("workpool=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
