pub mod config;
pub mod macros;

pub use config::{init_logging, LogConfig};
pub use tracing::{debug, error, info, trace, warn, Level};

use once_cell::sync::Lazy;
use std::sync::OnceLock;

static LOG_CONFIG: OnceLock<LogConfig> = OnceLock::new();
static DEFAULT_CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::default);

/// Scope names understood by the scoped logging macros.
pub const POINTER_SCOPE: &str = "pointer";
pub const BEAM_SCOPE: &str = "beam";
pub const ZONE_SCOPE: &str = "zones";
pub const MARKER_SCOPE: &str = "marker";

pub fn get_log_config() -> &'static LogConfig {
    LOG_CONFIG.get().unwrap_or(&DEFAULT_CONFIG)
}

pub(crate) fn set_log_config(config: LogConfig) {
    LOG_CONFIG.set(config).ok();
}
