//! Tracing setup
//!
//! Targets used by the crate:
//! - `tripwire::walk`: item traces and every silently truncated invocation
//! - `tripwire::load`: load warnings
//! - `tripwire::host`: dispatcher and runtime lifecycle
//! - `tripwire::scheduler`: scheduled tasks
//! - `tripwire::script`: output of the `Log` effect

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr. `RUST_LOG` wins over the
/// configured level. Does nothing if a subscriber is already installed.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
