//! Raw document parsing and version detection.
//!
//! Turns bytes into the versioned tree the document was written against,
//! plus a report of parse-time findings: the deprecation notice for version 1
//! and keys no field of the current schema accepts.

use crate::errors::Invalid;
use crate::path::{ContextPath, Segment};
use crate::report::Report;
use crate::schema::{Describe, FieldKind, ObjectSchema};
use crate::version::{Version, VersionedConfig, MAX_VERSION, V1, V2_0, V2_1, V2_2};
use crate::{v1, v2_0, v2_1, v2_2};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("not a config (empty)")]
    Empty,
    #[error("not a config (found cloud-config)")]
    CloudConfig,
    #[error("not a config (found script)")]
    Script,
    #[error("config is not valid JSON at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("config version could not be determined")]
    VersionIndeterminable,
    #[error("unsupported config version {0}")]
    UnknownVersion(String),
    #[error("config does not match the {version} schema: {source}")]
    Type {
        version: Version,
        #[source]
        source: serde_json::Error,
    },
}

/// A parsed document and its parse-time diagnostics.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub config: VersionedConfig,
    pub report: Report,
}

/// Parse raw document bytes into the matching versioned tree.
pub fn parse(raw: &[u8]) -> Result<Parsed, ParseError> {
    let trimmed = raw.trim_ascii_start();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    if trimmed.starts_with(b"#cloud-config") {
        return Err(ParseError::CloudConfig);
    }
    if trimmed.starts_with(b"#!") {
        return Err(ParseError::Script);
    }

    let value: Value = serde_json::from_slice(raw).map_err(|e| ParseError::Syntax {
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })?;

    let version = detect_version(&value)?;
    let mut report = Report::new();
    let config = match version {
        v if v == V1 => {
            report.warn(
                ContextPath::root().append("ignitionVersion"),
                Invalid::DeprecatedVersion {
                    latest: MAX_VERSION.to_string(),
                },
            );
            VersionedConfig::V1(typed::<v1::Config>(value, v)?)
        }
        v if v == V2_0 => VersionedConfig::V2_0(typed::<v2_0::Config>(value, v)?),
        v if v == V2_1 => VersionedConfig::V2_1(typed::<v2_1::Config>(value, v)?),
        v if v == V2_2 => {
            check_unknown_keys(&value, &v2_2::Config::describe(), &ContextPath::root(), &mut report);
            VersionedConfig::V2_2(typed::<v2_2::Config>(value, v)?)
        }
        other => return Err(ParseError::UnknownVersion(other.to_string())),
    };

    debug!(version = %version, warnings = report.len(), "Parsed config");
    Ok(Parsed { config, report })
}

fn typed<T: DeserializeOwned>(value: Value, version: Version) -> Result<T, ParseError> {
    serde_json::from_value(value).map_err(|source| ParseError::Type { version, source })
}

/// Version 1 documents carry `ignitionVersion: 1`; later ones a dotted
/// `ignition.version` string.
fn detect_version(value: &Value) -> Result<Version, ParseError> {
    if let Some(legacy) = value.get("ignitionVersion") {
        return match legacy.as_i64() {
            Some(1) => Ok(V1),
            _ => Err(ParseError::UnknownVersion(legacy.to_string())),
        };
    }
    let raw = value
        .get("ignition")
        .and_then(|i| i.get("version"))
        .and_then(Value::as_str)
        .ok_or(ParseError::VersionIndeterminable)?;
    let version: Version = raw
        .parse()
        .map_err(|_| ParseError::UnknownVersion(raw.to_string()))?;
    if !version.is_supported() || version == V1 {
        return Err(ParseError::UnknownVersion(raw.to_string()));
    }
    Ok(version)
}

/// Warn about every key no described field accepts.
fn check_unknown_keys(value: &Value, schema: &ObjectSchema, at: &ContextPath, report: &mut Report) {
    let Value::Object(map) = value else { return };
    for (key, child) in map {
        let here = at.append(key.as_str());
        match schema.get(key) {
            Some(field) => check_field(child, &field.kind, &here, report),
            None => {
                let suggestion = schema
                    .fields
                    .iter()
                    .find(|f| f.name.eq_ignore_ascii_case(key))
                    .map(|f| f.name.to_string());
                let key = key.clone();
                match suggestion {
                    Some(suggestion) => {
                        report.warn(here, Invalid::UnknownKeyDidYouMean { key, suggestion })
                    }
                    None => report.warn(here, Invalid::UnknownKey { key }),
                }
            }
        }
    }
}

fn check_field(value: &Value, kind: &FieldKind, at: &ContextPath, report: &mut Report) {
    match (kind.strip_optional(), value) {
        (FieldKind::Object(describe), Value::Object(_)) => {
            check_unknown_keys(value, &describe(), at, report)
        }
        (FieldKind::List(inner), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                check_field(item, inner, &at.append(Segment::Index(i)), report);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(report: &Report) -> Vec<String> {
        report.iter().map(|d| format!("{} {}", d.severity, d.path)).collect()
    }

    #[test]
    fn rejects_non_configs() {
        assert!(matches!(parse(b""), Err(ParseError::Empty)));
        assert!(matches!(parse(b"  \n\t"), Err(ParseError::Empty)));
        assert!(matches!(parse(b"#cloud-config\nusers: []"), Err(ParseError::CloudConfig)));
        assert!(matches!(parse(b"#!/bin/sh\necho hi"), Err(ParseError::Script)));
    }

    #[test]
    fn syntax_errors_carry_position() {
        match parse(b"{\n  \"ignition\": }") {
            Err(ParseError::Syntax { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn detects_every_supported_version() {
        let cases: [(&[u8], Version); 4] = [
            (br#"{"ignitionVersion": 1}"#, V1),
            (br#"{"ignition": {"version": "2.0.0"}}"#, V2_0),
            (br#"{"ignition": {"version": "2.1.0"}}"#, V2_1),
            (br#"{"ignition": {"version": "2.2.0"}}"#, V2_2),
        ];
        for (raw, version) in cases {
            assert_eq!(parse(raw).unwrap().config.version(), version);
        }
    }

    #[test]
    fn unknown_or_missing_versions_fail() {
        assert!(matches!(
            parse(br#"{"ignition": {"version": "3.0.0"}}"#),
            Err(ParseError::UnknownVersion(v)) if v == "3.0.0"
        ));
        assert!(matches!(
            parse(br#"{"ignitionVersion": 2}"#),
            Err(ParseError::UnknownVersion(_))
        ));
        assert!(matches!(
            parse(br#"{"ignition": {"version": "two"}}"#),
            Err(ParseError::UnknownVersion(_))
        ));
        assert!(matches!(parse(br#"{"storage": {}}"#), Err(ParseError::VersionIndeterminable)));
    }

    #[test]
    fn type_mismatch_names_the_version() {
        let err = parse(br#"{"ignition": {"version": "2.1.0"}, "storage": {"files": 3}}"#).unwrap_err();
        assert!(matches!(err, ParseError::Type { version, .. } if version == V2_1));
    }

    #[test]
    fn version_one_is_deprecated() {
        let parsed = parse(br#"{"ignitionVersion": 1}"#).unwrap();
        assert_eq!(lines(&parsed.report), ["warning $.ignitionVersion"]);
        assert!(!parsed.report.is_fatal());
    }

    #[test]
    fn unknown_keys_warn_with_suggestions() {
        let raw = br#"{
            "ignition": {"version": "2.2.0"},
            "storage": {
                "files": [
                    {"filesystem": "root", "path": "/a"},
                    {"filesystem": "root", "path": "/b", "Mode": 420, "contents": {"sorce": "x"}}
                ]
            },
            "extra": true
        }"#;
        let parsed = parse(raw).unwrap();
        assert_eq!(
            lines(&parsed.report),
            [
                "warning $.extra",
                "warning $.storage.files[1].Mode",
                "warning $.storage.files[1].contents.sorce",
            ]
        );
        assert_eq!(
            parsed.report.entries[1].message,
            "unrecognized key \"Mode\", did you mean \"mode\"?"
        );
        assert_eq!(parsed.report.entries[2].message, "unrecognized key \"sorce\"");
    }
}
