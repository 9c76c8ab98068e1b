//! Root-level rules that need the whole document.
//!
//! They run after the node walk, in a fixed order, so their diagnostics
//! always trail the per-node ones.

use super::*;
use crate::errors::Invalid;
use crate::path::ContextPath;
use crate::report::Report;
use std::collections::{HashMap, HashSet};

/// Filesystem that exists without being declared.
pub const ROOT_FILESYSTEM: &str = "root";

/// Kernel argument that must accompany a CEX-bound root volume.
pub const CEX_KERNEL_ARG: &str = "rd.luks.key=/etc/luks/cex.key";

const SYSTEMD_UNIT_DIR: &str = "/etc/systemd/system";

/// Run every cross-cutting rule against `config`.
pub fn check_root(config: &Config) -> Report {
    let mut report = Report::new();
    check_cex_kernel_argument(config, &mut report);
    check_duplicate_paths(config, &mut report);
    check_systemd_conflicts(config, &mut report);
    check_files_filesystems(config, &mut report);
    check_duplicate_filesystems(config, &mut report);
    report
}

fn storage_path(list: &str, index: usize) -> ContextPath {
    ContextPath::root()
        .append("storage")
        .append(list)
        .append(index)
}

/// Files, directories and links in declaration order, with their paths.
fn nodes(storage: &Storage) -> Vec<(ContextPath, &str, &str)> {
    let files = storage.files.iter().flatten().enumerate().map(|(i, f)| {
        (storage_path("files", i), f.filesystem.as_str(), f.path.as_str())
    });
    let directories = storage.directories.iter().flatten().enumerate().map(|(i, d)| {
        (storage_path("directories", i), d.filesystem.as_str(), d.path.as_str())
    });
    let links = storage.links.iter().flatten().enumerate().map(|(i, l)| {
        (storage_path("links", i), l.filesystem.as_str(), l.path.as_str())
    });
    files.chain(directories).chain(links).collect()
}

fn check_cex_kernel_argument(config: &Config, report: &mut Report) {
    let Some(storage) = &config.storage else { return };
    let cex_root = storage.luks.iter().flatten().any(|luks| {
        luks.name == ROOT_FILESYSTEM && luks.cex.as_ref().and_then(|c| c.enabled) == Some(true)
    });
    if !cex_root {
        return;
    }
    let has_arg = config
        .kernel_arguments
        .as_ref()
        .and_then(|k| k.should_exist.as_ref())
        .is_some_and(|args| args.iter().any(|a| a == CEX_KERNEL_ARG));
    if !has_arg {
        report.error(
            ContextPath::root()
                .append("kernelArguments")
                .append("shouldExist"),
            Invalid::CexKernelArgMissing,
        );
    }
}

fn check_duplicate_paths(config: &Config, report: &mut Report) {
    let Some(storage) = &config.storage else { return };
    let mut seen = HashSet::new();
    for (at, filesystem, node_path) in nodes(storage) {
        if !seen.insert((filesystem, node_path)) {
            report.error(at.append("path"), Invalid::DuplicatePath(node_path.to_string()));
        }
    }
}

fn check_systemd_conflicts(config: &Config, report: &mut Report) {
    let (Some(storage), Some(systemd)) = (&config.storage, &config.systemd) else {
        return;
    };
    let has_contents = |c: &Option<String>| c.as_deref().is_some_and(|c| !c.is_empty());

    let mut owned: HashMap<String, String> = HashMap::new();
    for unit in systemd.units.iter().flatten() {
        if has_contents(&unit.contents) {
            owned.insert(format!("{SYSTEMD_UNIT_DIR}/{}", unit.name), unit.name.clone());
        }
        for dropin in unit.dropins.iter().flatten() {
            if has_contents(&dropin.contents) {
                owned.insert(
                    format!("{SYSTEMD_UNIT_DIR}/{}.d/{}", unit.name, dropin.name),
                    format!("{}/{}", unit.name, dropin.name),
                );
            }
        }
    }

    for (at, filesystem, node_path) in nodes(storage) {
        if filesystem != ROOT_FILESYSTEM {
            continue;
        }
        if let Some(unit) = owned.get(node_path) {
            report.error(
                at.append("path"),
                Invalid::SystemdPathConflict {
                    path: node_path.to_string(),
                    unit: unit.clone(),
                },
            );
        }
    }
}

fn check_files_filesystems(config: &Config, report: &mut Report) {
    let Some(storage) = &config.storage else { return };
    let declared: HashSet<&str> = storage
        .filesystems
        .iter()
        .flatten()
        .map(|fs| fs.name.as_str())
        .chain([ROOT_FILESYSTEM])
        .collect();

    for (i, file) in storage.files.iter().flatten().enumerate() {
        // an empty name is already reported by the file itself
        if file.filesystem.is_empty() || declared.contains(file.filesystem.as_str()) {
            continue;
        }
        report.warn(
            storage_path("files", i).append("filesystem"),
            Invalid::NonexistentFilesystem {
                path: file.path.clone(),
                filesystem: file.filesystem.clone(),
            },
        );
    }
}

fn check_duplicate_filesystems(config: &Config, report: &mut Report) {
    let Some(storage) = &config.storage else { return };
    let mut seen: HashSet<&str> = HashSet::from([ROOT_FILESYSTEM]);
    for (i, fs) in storage.filesystems.iter().flatten().enumerate() {
        if !seen.insert(fs.name.as_str()) {
            report.warn(
                storage_path("filesystems", i).append("name"),
                Invalid::ShadowedFilesystem(fs.name.clone()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> Config {
        serde_json::from_value(value).unwrap()
    }

    fn lines(report: &Report) -> Vec<String> {
        report.iter().map(|d| format!("{} {}", d.severity, d.path)).collect()
    }

    #[test]
    fn cex_root_requires_kernel_argument() {
        let mut cfg = config(json!({
            "ignition": { "version": "2.2.0" },
            "storage": { "luks": [{ "name": "root", "device": "/dev/sda4", "cex": { "enabled": true } }] }
        }));
        let report = check_root(&cfg);
        assert_eq!(lines(&report), ["error $.kernelArguments.shouldExist"]);
        assert!(report.entries[0].message.contains(CEX_KERNEL_ARG));

        cfg.kernel_arguments = Some(KernelArguments {
            should_exist: Some(vec![CEX_KERNEL_ARG.to_string()]),
            should_not_exist: None,
        });
        assert!(check_root(&cfg).is_empty());
    }

    #[test]
    fn cex_disabled_or_other_volume_needs_nothing() {
        let cfg = config(json!({
            "ignition": { "version": "2.2.0" },
            "storage": { "luks": [
                { "name": "root", "device": "/dev/sda4", "cex": { "enabled": false } },
                { "name": "data", "device": "/dev/sdb", "cex": { "enabled": true } }
            ] }
        }));
        assert!(check_root(&cfg).is_empty());
    }

    #[test]
    fn duplicate_paths_across_node_kinds() {
        let cfg = config(json!({
            "ignition": { "version": "2.2.0" },
            "storage": {
                "files": [{ "filesystem": "root", "path": "/etc/a" }],
                "directories": [
                    { "filesystem": "root", "path": "/etc/a" },
                    { "filesystem": "other", "path": "/etc/a" }
                ],
                "links": [{ "filesystem": "root", "path": "/etc/a", "target": "/x" }],
                "filesystems": [{ "name": "other", "path": "/var" }]
            }
        }));
        assert_eq!(
            lines(&check_root(&cfg)),
            ["error $.storage.directories[0].path", "error $.storage.links[0].path"]
        );
    }

    #[test]
    fn systemd_units_own_their_paths() {
        let cfg = config(json!({
            "ignition": { "version": "2.2.0" },
            "storage": { "files": [
                { "filesystem": "root", "path": "/etc/systemd/system/a.service" },
                { "filesystem": "root", "path": "/etc/systemd/system/a.service.d/10-x.conf" },
                { "filesystem": "root", "path": "/etc/systemd/system/b.service" }
            ] },
            "systemd": { "units": [
                { "name": "a.service", "contents": "[Unit]", "dropins": [{ "name": "10-x.conf", "contents": "[Service]" }] },
                { "name": "b.service", "enabled": true }
            ] }
        }));
        assert_eq!(
            lines(&check_root(&cfg)),
            ["error $.storage.files[0].path", "error $.storage.files[1].path"]
        );
    }

    #[test]
    fn nonexistent_filesystem_is_a_warning() {
        let cfg = config(json!({
            "ignition": { "version": "2.2.0" },
            "storage": {
                "filesystems": [{ "name": "data", "path": "/var" }],
                "files": [
                    { "filesystem": "root", "path": "/a" },
                    { "filesystem": "data", "path": "/b" },
                    { "filesystem": "gone", "path": "/c" }
                ]
            }
        }));
        let report = check_root(&cfg);
        assert_eq!(lines(&report), ["warning $.storage.files[2].filesystem"]);
        assert!(!report.is_fatal());
        assert_eq!(
            report.entries[0].message,
            "file \"/c\" references nonexistent filesystem \"gone\""
        );
    }

    #[test]
    fn shadowed_filesystems_are_warnings() {
        let cfg = config(json!({
            "ignition": { "version": "2.2.0" },
            "storage": { "filesystems": [
                { "name": "root", "path": "/" },
                { "name": "data", "path": "/var" },
                { "name": "data", "path": "/srv" }
            ] }
        }));
        assert_eq!(
            lines(&check_root(&cfg)),
            ["warning $.storage.filesystems[0].name", "warning $.storage.filesystems[2].name"]
        );
    }

    #[test]
    fn rules_run_in_fixed_order() {
        let cfg = config(json!({
            "ignition": { "version": "2.2.0" },
            "storage": {
                "luks": [{ "name": "root", "device": "/dev/sda", "cex": { "enabled": true } }],
                "filesystems": [{ "name": "root", "path": "/" }],
                "files": [
                    { "filesystem": "nope", "path": "/a" },
                    { "filesystem": "nope", "path": "/a" }
                ]
            }
        }));
        assert_eq!(
            lines(&check_root(&cfg)),
            [
                "error $.kernelArguments.shouldExist",
                "error $.storage.files[1].path",
                "warning $.storage.files[0].filesystem",
                "warning $.storage.files[1].filesystem",
                "warning $.storage.filesystems[0].name",
            ]
        );
    }
}
