use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Map a level name to an `EnvFilter` directive; unknown names fall back to `warn`.
pub fn filter_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        "off" | "quiet" => "off",
        _ => "warn",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `level`.
/// Logs go to stderr so exports on stdout stay clean.
pub fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // A second init (e.g. in tests) is harmless
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}
