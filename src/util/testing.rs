//! Shared test setup: one tracing subscriber for the whole test binary.

use std::sync::Once;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TEST_SETUP: Once = Once::new();

/// Install a stderr subscriber once. `RUST_LOG` overrides the default
/// `orbitmap=debug` filter.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orbitmap=debug"));

        let layer = fmt::layer()
            .with_target(true)
            .with_test_writer()
            .with_filter(env_filter);

        if tracing::dispatcher::has_been_set() {
            return;
        }
        if let Err(e) = tracing_subscriber::registry().with(layer).try_init() {
            eprintln!("Error: Failed to set up logging: {}", e);
        }
        info!("Test setup complete");
    });
}
