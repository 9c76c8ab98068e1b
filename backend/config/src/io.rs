//! Config and documentation file IO.

use crate::docs::{config_docs_markdown, DocsError};
use crate::report::Severity;
use crate::version::Version;
use crate::{prepare, Prepared};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Read a config document from disk and run it through the full pipeline.
///
/// Diagnostics are logged and returned; a fatal report is not an `Err` here,
/// callers decide what to do with it.
pub async fn load_and_prepare(path: &Path) -> Result<Prepared> {
    let raw = fs::read(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let prepared = prepare(&raw)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;

    for entry in &prepared.report {
        match entry.severity {
            Severity::Warning => warn!(path = %entry.path, "{}", entry.message),
            Severity::Error => error!(path = %entry.path, "{}", entry.message),
        }
    }

    info!(
        path = %path.display(),
        errors = prepared.report.errors().count(),
        warnings = prepared.report.warnings().count(),
        "Loaded config"
    );
    Ok(prepared)
}

/// Render the documentation for `version` and write it atomically.
pub async fn write_config_docs(path: &Path, version: Version) -> Result<()> {
    let markdown = config_docs_markdown(version)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create docs directory: {}", parent.display()))?;
    }

    let tmp_path = path.with_extension("md.tmp");
    fs::write(&tmp_path, markdown.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp docs: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp docs to: {}", path.display()))?;

    info!(path = %path.display(), version = %version, "Wrote config docs");
    Ok(())
}

/// Fail with [`DocsError::Drift`] unless `path` holds exactly the rendered
/// documentation for `version`.
pub async fn verify_config_docs(path: &Path, version: Version) -> Result<()> {
    let expected = config_docs_markdown(version)?;
    let actual = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read docs file: {}", path.display()))?;

    if actual != expected {
        return Err(DocsError::Drift(path.to_path_buf()).into());
    }
    debug!(path = %path.display(), version = %version, "Config docs up to date");
    Ok(())
}
