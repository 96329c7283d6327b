//! Logging setup using tracing.
//!
//! Everything goes to stderr: stdout carries protocol data for the daemon.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// # Arguments
/// * `verbosity` - 0=warn, 1=info, 2=debug, 3+=trace; `RUST_LOG` adds directives
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
