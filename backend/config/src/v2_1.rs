//! Version 2.1.0 schema and the translation from 2.0.0.
//!
//! 2.1 adds directories and links, replaces the mount `create` block with
//! `wipeFilesystem` and mount options, and flattens user creation attributes
//! onto the user.

use crate::v2_0;
use crate::version::V2_1;
use serde::{Deserialize, Serialize};

pub use crate::v2_0::{FileContents, Ignition, Verification};
pub use crate::v1::{Dropin, Group, Networkd, NetworkdUnit};

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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directories: Option<Vec<Directory>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disk {
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub wipe_table: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitions: Option<Vec<Partition>>,
}

/// Sizes and offsets are in 512-byte sectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub type_guid: String,
    #[serde(default)]
    pub guid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raid {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<String>>,
    #[serde(default)]
    pub spares: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
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
    #[serde(default)]
    pub wipe_filesystem: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(default)]
    pub filesystem: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<NodeOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<NodeOwner>,
    #[serde(default)]
    pub contents: FileContents,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<i64>,
    #[serde(default)]
    pub append: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directory {
    #[serde(default)]
    pub filesystem: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<NodeOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<NodeOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(default)]
    pub filesystem: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<NodeOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<NodeOwner>,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub hard: bool,
}

/// Owning user or group of a node, by id or by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOwner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Systemd / passwd
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Systemd {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<Vec<Unit>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub mask: bool,
    #[serde(default)]
    pub contents: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropins: Option<Vec<Dropin>>,
}

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
    pub uid: Option<i64>,
    #[serde(default)]
    pub gecos: String,
    #[serde(default)]
    pub home_dir: String,
    #[serde(default)]
    pub no_create_home: bool,
    #[serde(default)]
    pub primary_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    #[serde(default)]
    pub no_user_group: bool,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub no_log_init: bool,
    #[serde(default)]
    pub shell: String,
}

// ---------------------------------------------------------------------------
// Translation from 2.0.0
// ---------------------------------------------------------------------------

/// Promote a 2.0.0 document. Total over every 2.0.0 input.
pub fn translate(old: &v2_0::Config) -> Config {
    Config {
        ignition: Ignition {
            version: V2_1.to_string(),
        },
        storage: Storage {
            disks: map_list(&old.storage.disks, translate_disk),
            raid: map_list(&old.storage.raid, translate_raid),
            filesystems: map_list(&old.storage.filesystems, translate_filesystem),
            files: map_list(&old.storage.files, translate_file),
            directories: None,
            links: None,
        },
        systemd: Systemd {
            units: map_list(&old.systemd.units, translate_unit),
        },
        networkd: old.networkd.clone(),
        passwd: Passwd {
            users: map_list(&old.passwd.users, translate_user),
            groups: old.passwd.groups.clone(),
        },
    }
}

/// Element-wise map that keeps an absent list absent.
pub(crate) fn map_list<T, U>(items: &Option<Vec<T>>, f: impl Fn(&T) -> U) -> Option<Vec<U>> {
    items.as_ref().map(|items| items.iter().map(f).collect())
}

fn translate_disk(old: &v2_0::Disk) -> Disk {
    Disk {
        device: old.device.clone(),
        wipe_table: old.wipe_table,
        partitions: map_list(&old.partitions, |p| Partition {
            label: p.label.clone(),
            number: p.number,
            size: p.size,
            start: p.start,
            type_guid: p.type_guid.clone(),
            guid: String::new(),
        }),
    }
}

fn translate_raid(old: &v2_0::Raid) -> Raid {
    Raid {
        name: old.name.clone(),
        level: old.level.clone(),
        devices: old.devices.clone(),
        spares: old.spares,
        options: None,
    }
}

fn translate_filesystem(old: &v2_0::Filesystem) -> Filesystem {
    Filesystem {
        name: old.name.clone(),
        mount: old.mount.as_ref().map(|mount| {
            let create = mount.create.as_ref();
            Mount {
                device: mount.device.clone(),
                format: mount.format.clone(),
                wipe_filesystem: create.is_some_and(|c| c.force),
                label: None,
                uuid: None,
                options: create.and_then(|c| c.options.clone()),
            }
        }),
        path: old.path.clone(),
    }
}

fn translate_owner(old: &Option<v2_0::NodeOwner>) -> Option<NodeOwner> {
    old.as_ref().map(|o| NodeOwner { id: o.id, name: None })
}

fn translate_file(old: &v2_0::File) -> File {
    File {
        filesystem: old.filesystem.clone(),
        path: old.path.clone(),
        overwrite: None,
        user: translate_owner(&old.user),
        group: translate_owner(&old.group),
        contents: old.contents.clone(),
        mode: old.mode,
        append: false,
    }
}

fn translate_unit(old: &v2_0::Unit) -> Unit {
    Unit {
        name: old.name.clone(),
        enabled: old.enable.then_some(true),
        mask: old.mask,
        contents: old.contents.clone(),
        dropins: old.dropins.clone(),
    }
}

fn translate_user(old: &v2_0::User) -> User {
    let create = old.create.clone().unwrap_or_default();
    User {
        name: old.name.clone(),
        password_hash: old.password_hash.clone(),
        ssh_authorized_keys: old.ssh_authorized_keys.clone(),
        uid: create.uid,
        gecos: create.gecos,
        home_dir: create.home_dir,
        no_create_home: create.no_create_home,
        primary_group: create.primary_group,
        groups: create.groups,
        no_user_group: create.no_user_group,
        system: create.system,
        no_log_init: create.no_log_init,
        shell: create.shell,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v2_0(value: serde_json::Value) -> v2_0::Config {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn mount_create_becomes_wipe_and_options() {
        let old = v2_0(json!({
            "ignition": { "version": "2.0.0" },
            "storage": { "filesystems": [
                { "name": "data", "mount": { "device": "/dev/sdb", "format": "xfs",
                  "create": { "force": true, "options": ["-f"] } } },
                { "name": "plain", "mount": { "device": "/dev/sdc", "format": "ext4" } },
                { "name": "tree", "path": "/srv" }
            ] }
        }));
        let new = translate(&old);
        assert_eq!(new.ignition.version, "2.1.0");
        let filesystems = new.storage.filesystems.unwrap();

        let data = filesystems[0].mount.as_ref().unwrap();
        assert!(data.wipe_filesystem);
        assert_eq!(data.options, Some(vec!["-f".to_string()]));

        let plain = filesystems[1].mount.as_ref().unwrap();
        assert!(!plain.wipe_filesystem);
        assert_eq!(plain.options, None);

        assert_eq!(filesystems[2].mount, None);
        assert_eq!(filesystems[2].path.as_deref(), Some("/srv"));
        assert_eq!(new.storage.directories, None);
        assert_eq!(new.storage.links, None);
    }

    #[test]
    fn unit_enable_maps_to_optional_enabled() {
        let old = v2_0(json!({
            "ignition": { "version": "2.0.0" },
            "systemd": { "units": [
                { "name": "a.service", "enable": true },
                { "name": "b.service", "enable": false, "mask": true }
            ] }
        }));
        let units = translate(&old).systemd.units.unwrap();
        assert_eq!(units[0].enabled, Some(true));
        assert_eq!(units[1].enabled, None);
        assert!(units[1].mask);
    }

    #[test]
    fn user_create_is_flattened() {
        let old = v2_0(json!({
            "ignition": { "version": "2.0.0" },
            "passwd": { "users": [
                { "name": "core", "passwordHash": "x",
                  "create": { "uid": 0, "homeDir": "/home/core", "groups": [] } },
                { "name": "bare" }
            ] }
        }));
        let users = translate(&old).passwd.users.unwrap();
        assert_eq!(users[0].uid, Some(0));
        assert_eq!(users[0].home_dir, "/home/core");
        assert_eq!(users[0].groups, Some(vec![]));
        assert_eq!(users[0].password_hash.as_deref(), Some("x"));
        assert_eq!(users[1].uid, None);
        assert_eq!(users[1].groups, None);
    }

    #[test]
    fn file_owner_ids_carry_over() {
        let old = v2_0(json!({
            "ignition": { "version": "2.0.0" },
            "storage": { "files": [{
                "filesystem": "root", "path": "/etc/a",
                "contents": { "source": "data:,a" },
                "user": { "id": 0 }, "mode": 420
            }] }
        }));
        let file = &translate(&old).storage.files.unwrap()[0];
        assert_eq!(file.user, Some(NodeOwner { id: Some(0), name: None }));
        assert_eq!(file.group, None);
        assert_eq!(file.contents.source, "data:,a");
        assert!(!file.append);
    }
}
