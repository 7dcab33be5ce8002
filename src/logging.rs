use tracing_subscriber::EnvFilter;

/// Logs go to stderr so stdout stays clean for tables and CSV.
///
/// `RUST_LOG` wins when it is set, otherwise `-v` flags pick the level.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("evstats={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
