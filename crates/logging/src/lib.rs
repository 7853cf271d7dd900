//! MixCraft Logging
//!
//! Tracing subscriber setup shared by binaries and integration tests.
//! Filtering follows `RUST_LOG` when set; otherwise `info` globally with
//! `debug` for the mixcraft crates.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info,mixcraft=debug";

/// Initialize the global subscriber. Panics if one is already set; use
/// [`try_init_logging`] where that is not an error.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Initialize the global subscriber if none is set yet. Safe to call from
/// every test.
pub fn try_init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init();
}
