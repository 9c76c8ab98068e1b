//! Property-based tests for contents encoding and the translation chain.

use bootforge_config::{dataurl, migrate, prepare, validate_config, Severity, VersionedConfig};
use bootforge_config::v1;
use proptest::prelude::*;
use serde_json::json;

fn v1_document(path: &str, contents: &str, mode: i64) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "ignitionVersion": 1,
        "storage": {
            "filesystems": [{
                "device": "/dev/sda1",
                "format": "ext4",
                "files": [{ "path": path, "contents": contents, "mode": mode }]
            }]
        }
    }))
    .unwrap()
}

proptest! {
    #[test]
    fn data_url_round_trips(contents in ".*") {
        let url = dataurl::encode(&contents);
        prop_assert!(url.starts_with("data:,"));
        prop_assert_eq!(dataurl::decode(&url).unwrap(), contents.into_bytes());
    }

    #[test]
    fn version_one_files_survive_the_chain(
        path in "/[a-z]{1,8}(/[a-z0-9._-]{1,8}){0,3}",
        contents in ".{0,64}",
        mode in 0i64..=0o7777,
    ) {
        let prepared = prepare(&v1_document(&path, &contents, mode)).unwrap();
        let file = &prepared.config.storage.as_ref().unwrap().files.as_ref().unwrap()[0];
        prop_assert_eq!(&file.path, &path);
        let source = file.contents.as_ref().unwrap().source.clone().unwrap();
        prop_assert_eq!(dataurl::decode(&source).unwrap(), contents.as_bytes().to_vec());
        prop_assert!(!prepared.report.is_fatal(), "{}", prepared.report);
        prop_assert!(validate_config(&prepared.config).iter().all(|d| d.severity == Severity::Warning));
    }

    #[test]
    fn translation_is_deterministic(contents in ".{0,32}", uid in 0i64..70000) {
        let old: v1::Config = serde_json::from_value(json!({
            "ignitionVersion": 1,
            "storage": { "filesystems": [{
                "device": "/dev/sdb1",
                "format": "xfs",
                "files": [{ "path": "/etc/x", "contents": contents, "uid": uid }]
            }] },
            "passwd": { "users": [{ "name": "core" }] }
        }))
        .unwrap();
        let first = migrate(VersionedConfig::V1(old.clone())).unwrap();
        let second = migrate(VersionedConfig::V1(old)).unwrap();
        prop_assert_eq!(first, second);
    }
}
