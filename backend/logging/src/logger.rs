//! Structured Logger
//!
//! Wraps `tracing` with an env-controlled filter, a human console layer on
//! stderr and, when a log directory is given, a JSON rolling file layer.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives consulted when no level is passed explicitly.
pub const LOG_ENV_VAR: &str = "BOOTFORGE_LOG";

/// File name prefix of the rotated logs: `bootforge.log.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "bootforge.log";

/// Pick the filter directives: `explicit`, then `BOOTFORGE_LOG`, then
/// `RUST_LOG`, then `default`. Empty values are skipped.
pub fn filter_directives(
    explicit: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
    default: &str,
) -> String {
    let set = |value: Option<String>| value.filter(|directives| !directives.trim().is_empty());
    set(explicit.map(str::to_string))
        .or_else(|| set(lookup(LOG_ENV_VAR)))
        .or_else(|| set(lookup(EnvFilter::DEFAULT_ENV)))
        .unwrap_or_else(|| default.to_string())
}

/// Build the filter for `explicit` or the environment, falling back to `default`.
pub fn build_filter(explicit: Option<&str>, default: &str) -> Result<EnvFilter> {
    let directives = filter_directives(explicit, |key| std::env::var(key).ok(), default);
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log level: {directives}"))
}

/// Initialize the global structured logger.
///
/// Stdout stays free for command output, so the console layer writes to
/// stderr. Fails if a global subscriber is already installed.
pub fn init_logger<P: AsRef<Path>>(
    explicit: Option<&str>,
    default_level: &str,
    log_dir: Option<P>,
) -> Result<()> {
    let env_filter = build_filter(explicit, default_level)?;

    let file_layer = match log_dir {
        Some(dir) => {
            let dir = dir.as_ref();
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file_appender)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::env::var_os("NO_COLOR").is_none());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install global logger")?;
    Ok(())
}
