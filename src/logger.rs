use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::args::LogLevel;

/// Installs the global subscriber. `HEYYALL_LOG`, then `RUST_LOG`, take
/// precedence over `level`. Later calls are no-ops.
pub fn init_logging(level: LogLevel, no_color: bool) {
    let filter = std::env::var("HEYYALL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| EnvFilter::new(level.as_str()),
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new(level.as_str())),
        );

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Global subscriber already installed.");
    }
}
