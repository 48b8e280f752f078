//! Diagnostic logging setup.
//!
//! The engine itself only emits `tracing` events. Binaries call [`init`] once
//! to install a formatting subscriber; `RUST_LOG` overrides the default
//! filter.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, or by
/// `default_filter` when the variable is unset or unparsable.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
