//! Logging configuration for askdb.
//!
//! Logs go to stderr so that stdout carries only rendered results.

use tracing_subscriber::EnvFilter;

/// Returns the filter directive used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "askdb=debug,info"
    } else {
        "warn"
    }
}

/// Initializes logging to stderr.
///
/// `RUST_LOG` takes precedence; otherwise `-v` raises the level to debug.
pub fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
