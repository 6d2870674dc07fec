//! Logging setup
//!
//! The engine logs through the `log` facade; hosts pick the sink. These
//! helpers install `env_logger` for native hosts and tools.

pub use log::{debug, info, warn, error, trace};

/// Initialize `env_logger` from the `RUST_LOG` environment variable
pub fn init() {
    env_logger::init();
}

/// Initialize `env_logger` with an explicit filter such as `"snuff_engine=debug"`
///
/// Fails if a logger is already installed.
pub fn init_with_filter(filter: &str) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::new()
        .parse_filters(filter)
        .try_init()
}
