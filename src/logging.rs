//! Logging setup shared by the binaries

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins; otherwise `--verbose` means debug and the configured
/// level applies.
pub fn init(verbose: bool, config_level: &str) {
    let default_level = if verbose {
        "debug".to_string()
    } else {
        config_level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,tutortalk={default_level}")));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
