//! Structured logging for bootforge: console output on stderr plus an
//! optional NDJSON file that rotates daily.

pub mod logger;

pub use logger::{build_filter, filter_directives, init_logger, LOG_ENV_VAR, LOG_FILE_PREFIX};
