//! # projgen utilities
//!
//! Shared helpers for the projgen workspace. Currently this is the logging
//! setup built on `tracing`.

pub mod logging;

pub use logging::{
    dated_log_path, init_logging, init_logging_with, init_logging_with_level, LogFormat, LogLevel, LoggingConfig,
    LoggingError, LoggingGuard,
};
pub use tracing::{debug, error, info, trace, warn};
