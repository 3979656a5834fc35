use tracing_subscriber::EnvFilter;

/// Console logging for the batch binaries; `RUST_LOG` adds or overrides directives.
pub fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("bill_ingestion=info".parse().unwrap_or_else(|_| "info".parse().unwrap()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
