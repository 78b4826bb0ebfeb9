//! Procsim tools
//!
//! CLI tools for running simulation programs.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging with a default filter.
///
/// Use the `RUST_LOG` environment variable to override the default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,procsim_runtime=info,procsim_tools=debug"));

    fmt().with_env_filter(filter).with_target(false).init();
}
