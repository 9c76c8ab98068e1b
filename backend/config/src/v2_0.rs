//! Version 2.0.0 schema and the translation from version 1.
//!
//! 2.0 lifts files out of their filesystem: filesystems get names and files
//! refer to them by name. Inline contents become `data:` URL sources.

use crate::dataurl;
use crate::v1;
use crate::version::V2_0;
use serde::{Deserialize, Serialize};

pub use crate::v1::{
    Disk, Dropin, FilesystemCreate, Group, Networkd, NetworkdUnit, Partition, Raid, Systemd, Unit,
    UserCreate,
};

/// Prefix of the filesystem names invented when promoting version 1 documents.
pub const SYNTHETIC_FILESYSTEM_PREFIX: &str = "_translate-filesystem-";

/// Name given to the `index`-th version 1 filesystem.
pub fn synthetic_filesystem_name(index: usize) -> String {
    format!("{SYNTHETIC_FILESYSTEM_PREFIX}{index}")
}

/// True for names produced by [`synthetic_filesystem_name`].
pub fn is_synthetic_filesystem_name(name: &str) -> bool {
    name.strip_prefix(SYNTHETIC_FILESYSTEM_PREFIX)
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub ignition: Ignition,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub systemd: Systemd,
    #[serde(default)]
    pub networkd: Networkd,
    #[serde(default)]
    pub passwd: Passwd,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ignition {
    #[serde(default)]
    pub version: String,
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Storage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disks: Option<Vec<Disk>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raid: Option<Vec<Raid>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystems: Option<Vec<Filesystem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<File>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filesystem {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount: Option<Mount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mount {
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<FilesystemCreate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(default)]
    pub filesystem: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub contents: FileContents,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<NodeOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<NodeOwner>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContents {
    #[serde(default)]
    pub compression: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub verification: Verification,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Owning user or group of a node, by numeric id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOwner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Passwd
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passwd {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_authorized_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<UserCreate>,
}

// ---------------------------------------------------------------------------
// Translation from version 1
// ---------------------------------------------------------------------------

/// Promote a version 1 document. Total over every version 1 input.
pub fn translate(old: &v1::Config) -> Config {
    Config {
        ignition: Ignition {
            version: V2_0.to_string(),
        },
        storage: translate_storage(&old.storage),
        systemd: old.systemd.clone(),
        networkd: old.networkd.clone(),
        passwd: Passwd {
            users: old
                .passwd
                .users
                .as_ref()
                .map(|users| users.iter().map(translate_user).collect()),
            groups: old.passwd.groups.clone(),
        },
    }
}

fn translate_storage(old: &v1::Storage) -> Storage {
    let filesystems = old.filesystems.as_deref().unwrap_or_default();

    // The files list exists only if some filesystem declared one.
    let files = filesystems
        .iter()
        .any(|fs| fs.files.is_some())
        .then(|| {
            filesystems
                .iter()
                .enumerate()
                .flat_map(|(i, fs)| {
                    let name = synthetic_filesystem_name(i);
                    fs.files
                        .iter()
                        .flatten()
                        .map(move |file| translate_file(file, &name))
                })
                .collect()
        });

    Storage {
        disks: old.disks.clone(),
        raid: old.raid.clone(),
        filesystems: old.filesystems.as_ref().map(|filesystems| {
            filesystems
                .iter()
                .enumerate()
                .map(|(i, fs)| Filesystem {
                    name: synthetic_filesystem_name(i),
                    mount: Some(Mount {
                        device: fs.device.clone(),
                        format: fs.format.clone(),
                        create: fs.create.clone(),
                    }),
                    path: None,
                })
                .collect()
        }),
        files,
    }
}

fn translate_file(old: &v1::File, filesystem: &str) -> File {
    File {
        filesystem: filesystem.to_string(),
        path: old.path.clone(),
        contents: FileContents {
            source: dataurl::encode(&old.contents),
            ..Default::default()
        },
        mode: Some(old.mode),
        user: Some(NodeOwner { id: Some(old.uid) }),
        group: Some(NodeOwner { id: Some(old.gid) }),
    }
}

fn translate_user(old: &v1::User) -> User {
    User {
        name: old.name.clone(),
        password_hash: Some(old.password_hash.clone()),
        ssh_authorized_keys: old.ssh_authorized_keys.clone(),
        create: old.create.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v1(value: serde_json::Value) -> v1::Config {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn promotes_nested_files_to_synthetic_filesystems() {
        let old = v1(json!({
            "ignitionVersion": 1,
            "storage": {
                "filesystems": [
                    { "device": "/dev/sda1", "format": "ext4",
                      "files": [{ "path": "/etc/motto", "contents": "hello", "mode": 420 }] },
                    { "device": "/dev/sdb1", "format": "xfs",
                      "create": { "force": true, "options": ["-L", "data"] },
                      "files": [{ "path": "/a", "uid": 500 }, { "path": "/b", "gid": 7 }] }
                ]
            }
        }));
        let new = translate(&old);
        assert_eq!(new.ignition.version, "2.0.0");

        let filesystems = new.storage.filesystems.unwrap();
        assert_eq!(filesystems[0].name, "_translate-filesystem-0");
        assert_eq!(filesystems[1].name, "_translate-filesystem-1");
        let mount = filesystems[1].mount.as_ref().unwrap();
        assert_eq!(mount.device, "/dev/sdb1");
        assert!(mount.create.as_ref().unwrap().force);

        let files = new.storage.files.unwrap();
        let referenced: Vec<_> = files.iter().map(|f| f.filesystem.as_str()).collect();
        assert_eq!(
            referenced,
            ["_translate-filesystem-0", "_translate-filesystem-1", "_translate-filesystem-1"]
        );
        assert_eq!(files[0].contents.source, "data:,hello");
        assert_eq!(files[0].mode, Some(420));
        assert_eq!(files[1].user.as_ref().unwrap().id, Some(500));
        assert_eq!(files[2].group.as_ref().unwrap().id, Some(7));
    }

    #[test]
    fn zero_ids_stay_present() {
        let old = v1(json!({
            "ignitionVersion": 1,
            "storage": { "filesystems": [{ "device": "/dev/sda", "format": "ext4",
                "files": [{ "path": "/etc/empty" }] }] }
        }));
        let file = &translate(&old).storage.files.unwrap()[0];
        assert_eq!(file.mode, Some(0));
        assert_eq!(file.user, Some(NodeOwner { id: Some(0) }));
        assert_eq!(file.group, Some(NodeOwner { id: Some(0) }));
        assert_eq!(file.contents.source, "data:,");
    }

    #[test]
    fn absent_and_empty_lists_stay_distinct() {
        let absent = translate(&v1(json!({ "ignitionVersion": 1 })));
        assert_eq!(absent.storage.filesystems, None);
        assert_eq!(absent.storage.files, None);
        assert_eq!(absent.systemd.units, None);

        let empty = translate(&v1(json!({
            "ignitionVersion": 1,
            "storage": { "filesystems": [], "disks": [] },
            "systemd": { "units": [] },
            "passwd": { "users": [] }
        })));
        assert_eq!(empty.storage.filesystems, Some(vec![]));
        assert_eq!(empty.storage.disks, Some(vec![]));
        assert_eq!(empty.storage.files, None);
        assert_eq!(empty.systemd.units, Some(vec![]));
        assert_eq!(empty.passwd.users, Some(vec![]));

        let empty_files = translate(&v1(json!({
            "ignitionVersion": 1,
            "storage": { "filesystems": [{ "device": "/dev/sda", "format": "ext4", "files": [] }] }
        })));
        assert_eq!(empty_files.storage.files, Some(vec![]));
    }

    #[test]
    fn synthetic_names_are_deterministic_and_unique() {
        let old = v1(json!({
            "ignitionVersion": 1,
            "storage": { "filesystems": [
                { "device": "/dev/a", "format": "ext4" },
                { "device": "/dev/b", "format": "ext4" },
                { "device": "/dev/c", "format": "ext4" }
            ] }
        }));
        let first = translate(&old);
        let second = translate(&old);
        assert_eq!(first, second);

        let names: Vec<_> = first
            .storage
            .filesystems
            .unwrap()
            .into_iter()
            .map(|fs| fs.name)
            .collect();
        let unique: std::collections::BTreeSet<_> = names.iter().collect();
        assert_eq!(names.len(), unique.len());
        assert!(names.iter().all(|n| is_synthetic_filesystem_name(n)));
    }

    #[test]
    fn recognises_synthetic_names() {
        assert!(is_synthetic_filesystem_name("_translate-filesystem-12"));
        assert!(!is_synthetic_filesystem_name("_translate-filesystem-"));
        assert!(!is_synthetic_filesystem_name("root"));
    }

    #[test]
    fn user_password_hash_always_present() {
        let old = v1(json!({
            "ignitionVersion": 1,
            "passwd": {
                "users": [{ "name": "core", "create": { "uid": 0 } }],
                "groups": [{ "name": "wheel", "gid": 10 }]
            }
        }));
        let passwd = translate(&old).passwd;
        let user = &passwd.users.unwrap()[0];
        assert_eq!(user.password_hash.as_deref(), Some(""));
        assert_eq!(user.create.as_ref().unwrap().uid, Some(0));
        assert_eq!(passwd.groups.unwrap()[0].gid, Some(10));
    }
}
