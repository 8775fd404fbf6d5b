use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; later calls are no-ops.
///
/// Honors `RUST_LOG`, defaulting to `h1wire=debug`.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("h1wire=debug")),
        )
        .with_target(true)
        .with_test_writer()
        .try_init();
}
