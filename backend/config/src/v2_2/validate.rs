//! Per-node contracts of the current schema.

use super::*;
use crate::dataurl;
use crate::errors::Invalid;
use crate::mode::{is_decimal_mode, MAX_MODE};
use crate::path;
use crate::path::ContextPath;
use crate::report::Report;
use crate::validation::{validate_node, Children, Validate};
use crate::version::MAX_VERSION;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// URL schemes a resource may be fetched from.
pub const ALLOWED_SCHEMES: [&str; 6] = ["http", "https", "tftp", "s3", "oem", "data"];

const FILESYSTEM_FORMATS: [&str; 5] = ["ext4", "btrfs", "xfs", "vfat", "swap"];

const RAID_LEVELS: [&str; 8] = [
    "linear", "raid0", "raid1", "raid4", "raid5", "raid6", "raid10", "multipath",
];

const UNIT_EXTENSIONS: [&str; 12] = [
    "service", "socket", "device", "mount", "automount", "swap", "target", "path", "timer",
    "snapshot", "slice", "scope",
];

const NETWORKD_EXTENSIONS: [&str; 3] = ["link", "netdev", "network"];

const MAX_PARTITION_LABEL: usize = 36;

static HASH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sha512-[0-9a-f]{128}$").unwrap());

/// Validate a current-schema document: walk every node, then apply the
/// cross-cutting root rules.
pub fn validate_config(config: &Config) -> Report {
    let mut report = validate_node(config, &ContextPath::root());
    report.merge(check_root(config));
    debug!(
        entries = report.len(),
        fatal = report.is_fatal(),
        "Validated config"
    );
    report
}

fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext)
}

fn check_mode(mode: Option<i64>, directory: bool, report: &mut Report) {
    let Some(mode) = mode else { return };
    if !(0..=MAX_MODE).contains(&mode) {
        report.error(path!["mode"], Invalid::IllegalMode(mode));
    } else if is_decimal_mode(mode, directory) {
        report.warn(path!["mode"], Invalid::DecimalMode);
    }
}

fn check_node(filesystem: &str, node_path: &str, report: &mut Report) {
    if filesystem.is_empty() {
        report.error(path!["filesystem"], Invalid::NoFilesystem);
    }
    if !is_absolute(node_path) {
        report.error(path!["path"], Invalid::NotAbsolute);
    }
}

fn check_name(name: &str, report: &mut Report) {
    if name.is_empty() {
        report.error(path!["name"], Invalid::EmptyName);
    }
}

fn check_guid(field: &str, guid: &Option<String>, report: &mut Report) {
    let Some(guid) = guid.as_deref().filter(|g| !g.is_empty()) else { return };
    if uuid::Uuid::parse_str(guid).is_err() {
        report.error(path![field], Invalid::InvalidGuid(guid.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Root and sections
// ---------------------------------------------------------------------------

impl Validate for Config {
    fn children<'a>(&'a self, children: &mut Children<'a>) {
        children.field("ignition", &self.ignition);
        children.optional("storage", &self.storage);
        children.optional("systemd", &self.systemd);
        children.optional("networkd", &self.networkd);
        children.optional("passwd", &self.passwd);
        children.optional("kernelArguments", &self.kernel_arguments);
    }
}

impl Validate for Ignition {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        if self.version != MAX_VERSION.to_string() {
            report.error(
                path!["version"],
                Invalid::UnsupportedVersion {
                    found: self.version.clone(),
                    expected: MAX_VERSION.to_string(),
                },
            );
        }
        report
    }
}

impl Validate for Storage {
    fn children<'a>(&'a self, children: &mut Children<'a>) {
        children.list("disks", &self.disks);
        children.list("raid", &self.raid);
        children.list("filesystems", &self.filesystems);
        children.list("files", &self.files);
        children.list("directories", &self.directories);
        children.list("links", &self.links);
        children.list("luks", &self.luks);
    }
}

impl Validate for Systemd {
    fn children<'a>(&'a self, children: &mut Children<'a>) {
        children.list("units", &self.units);
    }
}

impl Validate for Networkd {
    fn children<'a>(&'a self, children: &mut Children<'a>) {
        children.list("units", &self.units);
    }
}

impl Validate for Passwd {
    fn children<'a>(&'a self, children: &mut Children<'a>) {
        children.list("users", &self.users);
        children.list("groups", &self.groups);
    }
}

impl Validate for KernelArguments {}

// ---------------------------------------------------------------------------
// Disks
// ---------------------------------------------------------------------------

impl Validate for Disk {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        if !is_absolute(&self.device) {
            report.error(path!["device"], Invalid::NotAbsolute);
        }
        let mut seen = HashSet::new();
        for (i, partition) in self.partitions.iter().flatten().enumerate() {
            if partition.number != 0 && !seen.insert(partition.number) {
                report.error(
                    path!["partitions", i, "number"],
                    Invalid::DuplicatePartitionNumber(partition.number),
                );
            }
        }
        report
    }

    fn children<'a>(&'a self, children: &mut Children<'a>) {
        children.list("partitions", &self.partitions);
    }
}

impl Validate for Partition {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        if let Some(label) = &self.label {
            if label.chars().count() > MAX_PARTITION_LABEL {
                report.error(path!["label"], Invalid::LabelTooLong(label.clone()));
            }
        }
        check_guid("typeGuid", &self.type_guid, &mut report);
        check_guid("guid", &self.guid, &mut report);
        report
    }
}

impl Validate for Raid {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        check_name(&self.name, &mut report);
        if !RAID_LEVELS.contains(&self.level.as_str()) {
            report.error(path!["level"], Invalid::InvalidRaidLevel(self.level.clone()));
        } else if matches!(self.level.as_str(), "linear" | "raid0")
            && self.spares.is_some_and(|s| s != 0)
        {
            report.error(path!["spares"], Invalid::SparesUnsupported(self.level.clone()));
        }
        if self.devices.as_ref().map_or(true, Vec::is_empty) {
            report.error(path!["devices"], Invalid::NoRaidDevices);
        }
        report
    }
}

// ---------------------------------------------------------------------------
// Filesystems
// ---------------------------------------------------------------------------

impl Validate for Filesystem {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        check_name(&self.name, &mut report);
        match (&self.mount, &self.path) {
            (None, None) => report.error(path![], Invalid::FilesystemNoMountOrPath),
            (Some(_), Some(_)) => report.error(path![], Invalid::FilesystemMountAndPath),
            (None, Some(p)) if !is_absolute(p) => report.error(path!["path"], Invalid::NotAbsolute),
            _ => {}
        }
        report
    }

    fn children<'a>(&'a self, children: &mut Children<'a>) {
        children.optional("mount", &self.mount);
    }
}

impl Validate for Mount {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        if !is_absolute(&self.device) {
            report.error(path!["device"], Invalid::NotAbsolute);
        }
        if let Some(format) = &self.format {
            if !FILESYSTEM_FORMATS.contains(&format.as_str()) {
                report.error(path!["format"], Invalid::InvalidFormat(format.clone()));
            }
        }
        if let Some(mount_path) = &self.path {
            if !is_absolute(mount_path) {
                report.error(path!["path"], Invalid::NotAbsolute);
            }
        }
        if self.with_mount_unit == Some(true) {
            match self.format.as_deref() {
                None | Some("") => report.error(path!["format"], Invalid::MountUnitNoFormat),
                Some("swap") => {}
                Some(_) => {
                    if self.path.as_deref().map_or(true, str::is_empty) {
                        report.error(path!["path"], Invalid::MountUnitNoPath);
                    }
                }
            }
        }
        report
    }
}

impl Validate for Luks {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        check_name(&self.name, &mut report);
        if !is_absolute(&self.device) {
            report.error(path!["device"], Invalid::NotAbsolute);
        }
        report
    }
}

// ---------------------------------------------------------------------------
// Files, directories, links
// ---------------------------------------------------------------------------

impl Validate for File {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        check_node(&self.filesystem, &self.path, &mut report);
        if self.overwrite == Some(true) && self.append.as_ref().is_some_and(|a| !a.is_empty()) {
            report.error(path!["overwrite"], Invalid::AppendAndOverwrite);
        }
        check_mode(self.mode, false, &mut report);
        report
    }

    fn children<'a>(&'a self, children: &mut Children<'a>) {
        children.list("append", &self.append);
        children.optional("contents", &self.contents);
    }
}

impl Validate for Directory {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        check_node(&self.filesystem, &self.path, &mut report);
        check_mode(self.mode, true, &mut report);
        report
    }
}

impl Validate for Link {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        check_node(&self.filesystem, &self.path, &mut report);
        if self.target.is_empty() {
            report.error(path!["target"], Invalid::EmptyTarget);
        }
        report
    }
}

impl Validate for Resource {
    fn validate(&self) -> Report {
        let mut report = Report::new();

        // The last set field in declared order carries the conflict.
        let set: Vec<&str> = [
            ("local", self.local.is_some()),
            ("inline", self.inline.is_some()),
            ("source", self.source.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, set)| set.then_some(field))
        .collect();
        let sources = set.len();
        if sources > 1 {
            if let Some(field) = set.last() {
                report.error(path![*field], Invalid::TooManyResourceSources);
            }
        }

        if let Some(compression) = &self.compression {
            if !compression.is_empty() && compression != "gzip" {
                report.error(path!["compression"], Invalid::Compression(compression.clone()));
            }
        }

        if let Some(source) = &self.source {
            if let Err(invalid) = check_url(source) {
                report.error(path!["source"], invalid);
            }
        }

        if let Some(hash) = self.verification.as_ref().and_then(|v| v.hash.as_ref()) {
            if sources == 0 {
                report.error(path!["verification", "hash"], Invalid::HashWithoutSource);
            } else if !HASH_PATTERN.is_match(hash) {
                report.error(path!["verification", "hash"], Invalid::InvalidHash(hash.clone()));
            }
        }
        report
    }
}

/// Check a resource source URL. An empty source means empty contents.
fn check_url(source: &str) -> Result<(), Invalid> {
    if source.is_empty() {
        return Ok(());
    }
    let url = url::Url::parse(source).map_err(|e| Invalid::InvalidUrl(e.to_string()))?;
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(Invalid::InvalidScheme(url.scheme().to_string()));
    }
    if url.scheme() == "data" {
        dataurl::decode(source).map_err(|e| Invalid::InvalidDataUrl(e.to_string()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Systemd / networkd / passwd
// ---------------------------------------------------------------------------

impl Validate for Unit {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        if !extension(&self.name).is_some_and(|ext| UNIT_EXTENSIONS.contains(&ext)) {
            report.error(path!["name"], Invalid::InvalidUnitExtension(self.name.clone()));
        }
        report
    }

    fn children<'a>(&'a self, children: &mut Children<'a>) {
        children.list("dropins", &self.dropins);
    }
}

impl Validate for Dropin {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        if extension(&self.name) != Some("conf") {
            report.error(path!["name"], Invalid::InvalidDropinExtension(self.name.clone()));
        }
        report
    }
}

impl Validate for NetworkdUnit {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        if !extension(&self.name).is_some_and(|ext| NETWORKD_EXTENSIONS.contains(&ext)) {
            report.error(path!["name"], Invalid::InvalidNetworkdExtension(self.name.clone()));
        }
        report
    }
}

impl Validate for User {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        check_name(&self.name, &mut report);
        report
    }
}

impl Validate for Group {
    fn validate(&self) -> Report {
        let mut report = Report::new();
        check_name(&self.name, &mut report);
        report
    }
}
