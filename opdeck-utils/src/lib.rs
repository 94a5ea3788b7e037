//! opdeck-utils: Common utilities shared across opdeck crates
//!
//! Provides the unified error type, logging setup, and XDG path helpers.

pub mod error;
pub mod logging;
pub mod paths;

pub use error::{OpdeckError, Result};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogOutput};
pub use paths::{cache_dir, config_dir, config_file, ensure_dir, log_dir, state_dir};
