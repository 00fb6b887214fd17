use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs the global subscriber. `HTTP_PROBE_LOG` wins over `RUST_LOG`; output goes to
/// stderr so stdout only carries the report.
pub fn init_logging(verbose: bool) {
    let filter = std::env::var("HTTP_PROBE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| {
                if verbose {
                    EnvFilter::new("debug")
                } else {
                    EnvFilter::new("warn")
                }
            },
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("warn")),
        );

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}
