//! Tracing subscriber setup shared by binaries.

use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "info";

/// Install the global fmt subscriber, honouring `RUST_LOG` when set.
///
/// Calling this twice is harmless; the second call leaves the first subscriber in place.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    if fmt().with_env_filter(filter).with_target(true).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
