// Redaction pipeline integration tests.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a quiet per-process subscriber so test failures carry the
/// pipeline's stage logs (raise with RUST_LOG when debugging).
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

mod property_tests;
mod provider_tests;
mod scenario_tests;
