//! Tracing subscriber setup

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global fmt subscriber
///
/// `RUST_LOG` takes precedence over `default_directive`. Returns `false` if a
/// subscriber was already installed, which is harmless.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    fmt().with_env_filter(filter).with_target(false).try_init().is_ok()
}
