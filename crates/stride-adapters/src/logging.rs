//! Logging setup
//!
//! Stdout carries the protocol in `stride serve`, so every log line goes to
//! stderr.

use tracing_subscriber::EnvFilter;

/// Filter directives for stride, e.g. `STRIDE_LOG=stride_core=debug`
pub const LOG_ENV: &str = "STRIDE_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Install the global subscriber. Calling it twice is harmless.
pub fn init() {
    let directives = filter_directives(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
    );
    let filter =
        EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// `STRIDE_LOG` wins over `RUST_LOG`; blank values count as unset.
fn filter_directives(stride: Option<String>, rust: Option<String>) -> String {
    [stride, rust]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVES.to_string())
}
