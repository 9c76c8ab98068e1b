//! `bootforge-config` — provisioning config front-end.
//!
//! Provides:
//! - Parsing and version detection for every supported config version
//! - A translation chain that lifts any supported version to the current one
//! - Path-aware validation with a structured report of errors and warnings
//! - Documentation rendering cross-checked against the schema

pub mod dataurl;
pub mod docs;
pub mod errors;
pub mod io;
pub mod migration;
pub mod mode;
pub mod parse;
pub mod path;
pub mod report;
pub mod schema;
pub mod v1;
pub mod v2_0;
pub mod v2_1;
pub mod v2_2;
pub mod validation;
pub mod version;

// Re-export most-used types at crate root.
pub use docs::{config_docs_markdown, DocsError};
pub use errors::Invalid;
pub use io::{load_and_prepare, verify_config_docs, write_config_docs};
pub use migration::{migrate, TranslateError, TranslatorChain};
pub use parse::{parse, ParseError, Parsed};
pub use path::{ContextPath, Segment};
pub use report::{Diagnostic, Report, Severity};
pub use v2_2::validate_config;
pub use version::{Version, VersionedConfig, MAX_VERSION};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Translate(#[from] TranslateError),
}

/// A current-version config and every diagnostic found on the way there.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub config: v2_2::Config,
    pub report: Report,
}

/// Parse, translate and validate a raw document.
///
/// Parse-time diagnostics come first, then the validation of the translated
/// tree. A fatal report still yields `Ok`; check [`Report::is_fatal`].
pub fn prepare(raw: &[u8]) -> Result<Prepared, PrepareError> {
    let Parsed { config, report: mut report } = parse(raw)?;
    let from = config.version();
    let config = migrate(config)?;
    report.merge(validate_config(&config));
    debug!(from = %from, entries = report.len(), "Prepared config");
    Ok(Prepared { config, report })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOTTO_V1: &[u8] = br#"{
        "ignitionVersion": 1,
        "storage": {
            "filesystems": [{
                "device": "/dev/sda1",
                "format": "ext4",
                "files": [{ "path": "/etc/motto", "contents": "hello", "mode": 420 }]
            }]
        }
    }"#;

    #[test]
    fn version_one_document_end_to_end() {
        let prepared = prepare(MOTTO_V1).unwrap();
        let storage = prepared.config.storage.as_ref().unwrap();

        let filesystems = storage.filesystems.as_ref().unwrap();
        assert_eq!(filesystems[0].name, "_translate-filesystem-0");
        assert_eq!(filesystems[0].mount.as_ref().unwrap().device, "/dev/sda1");

        let file = &storage.files.as_ref().unwrap()[0];
        assert_eq!(file.filesystem, "_translate-filesystem-0");
        assert_eq!(file.path, "/etc/motto");
        assert_eq!(file.mode, Some(420));
        let source = file.contents.as_ref().unwrap().source.as_deref().unwrap();
        assert_eq!(dataurl::decode(source).unwrap(), b"hello");

        assert!(validate_config(&prepared.config).is_empty());

        // only the deprecation notice remains
        assert_eq!(prepared.report.len(), 1);
        assert_eq!(prepared.report.entries[0].severity, Severity::Warning);
        assert!(!prepared.report.is_fatal());
    }

    #[test]
    fn parse_diagnostics_precede_validation() {
        let raw = br#"{
            "ignition": { "version": "2.2.0" },
            "storage": { "files": [{ "filesystem": "root", "path": "etc", "colour": 1 }] }
        }"#;
        let prepared = prepare(raw).unwrap();
        let paths: Vec<String> = prepared.report.iter().map(|d| d.path.to_string()).collect();
        assert_eq!(paths, ["$.storage.files[0].colour", "$.storage.files[0].path"]);
        assert!(prepared.report.is_fatal());
    }

    #[test]
    fn unrepresentable_partitions_fail_translation() {
        let raw = br#"{
            "ignition": { "version": "2.1.0" },
            "storage": { "disks": [{ "device": "/dev/sda", "partitions": [{ "number": 1, "size": 100 }] }] }
        }"#;
        assert!(matches!(prepare(raw), Err(PrepareError::Translate(_))));
    }

    #[test]
    fn parse_failures_surface() {
        assert!(matches!(prepare(b""), Err(PrepareError::Parse(ParseError::Empty))));
    }
}
