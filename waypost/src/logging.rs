//! Tracing subscriber setup.
//!
//! Called once by the binary; the library itself only emits `tracing`
//! events and never installs a subscriber.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `verbosity` maps to the default filter level (`0` = warn, `1` = info,
/// `2` = debug, more = trace); the `RUST_LOG` environment variable takes
/// precedence when set. Calling this twice is a no-op.
pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("waypost={}", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
