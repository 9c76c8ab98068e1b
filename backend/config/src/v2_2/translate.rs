//! Translation from 2.1.0.
//!
//! Partition geometry moves from 512-byte sectors to MiB, which not every
//! 2.1 value can express; such documents are rejected with the path of the
//! offending field.

use super::*;
use crate::migration::TranslateError;
use crate::path::ContextPath;
use crate::v2_1::{self, map_list};
use crate::version::V2_2;

const SECTORS_PER_MIB: i64 = 2048;

/// Promote a 2.1.0 document.
pub fn translate(old: &v2_1::Config) -> Result<Config, TranslateError> {
    Ok(Config {
        ignition: Ignition {
            version: V2_2.to_string(),
        },
        storage: present(translate_storage(&old.storage)?),
        systemd: present(Systemd {
            units: map_list(&old.systemd.units, translate_unit),
        }),
        networkd: present(Networkd {
            units: map_list(&old.networkd.units, |u| NetworkdUnit {
                name: u.name.clone(),
                contents: str_p(&u.contents),
            }),
        }),
        passwd: present(Passwd {
            users: map_list(&old.passwd.users, translate_user),
            groups: map_list(&old.passwd.groups, |g| Group {
                name: g.name.clone(),
                gid: g.gid,
                password_hash: str_p(&g.password_hash),
                system: bool_p(g.system),
            }),
        }),
        kernel_arguments: None,
    })
}

/// Sections that carry nothing are left out.
fn present<T: Default + PartialEq>(section: T) -> Option<T> {
    (section != T::default()).then_some(section)
}

fn str_p(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn bool_p(b: bool) -> Option<bool> {
    b.then_some(true)
}

fn int_p(i: i64) -> Option<i64> {
    (i != 0).then_some(i)
}

fn translate_storage(old: &v2_1::Storage) -> Result<Storage, TranslateError> {
    let base = ContextPath::root().append("storage").append("disks");
    let disks = match &old.disks {
        None => None,
        Some(disks) => Some(
            disks
                .iter()
                .enumerate()
                .map(|(i, disk)| translate_disk(disk, &base.append(i)))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };

    Ok(Storage {
        disks,
        raid: map_list(&old.raid, |r| Raid {
            name: r.name.clone(),
            level: r.level.clone(),
            devices: r.devices.clone(),
            spares: int_p(r.spares),
            options: r.options.clone(),
        }),
        filesystems: map_list(&old.filesystems, translate_filesystem),
        files: map_list(&old.files, translate_file),
        directories: map_list(&old.directories, |d| Directory {
            filesystem: d.filesystem.clone(),
            path: d.path.clone(),
            overwrite: d.overwrite,
            user: translate_owner(&d.user),
            group: translate_owner(&d.group),
            mode: d.mode,
        }),
        links: map_list(&old.links, |l| Link {
            filesystem: l.filesystem.clone(),
            path: l.path.clone(),
            overwrite: l.overwrite,
            user: translate_owner(&l.user),
            group: translate_owner(&l.group),
            target: l.target.clone(),
            hard: bool_p(l.hard),
        }),
        luks: None,
    })
}

fn translate_disk(old: &v2_1::Disk, at: &ContextPath) -> Result<Disk, TranslateError> {
    let partitions = match &old.partitions {
        None => None,
        Some(partitions) => {
            let base = at.append("partitions");
            Some(
                partitions
                    .iter()
                    .enumerate()
                    .map(|(j, p)| translate_partition(p, &base.append(j)))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        }
    };
    Ok(Disk {
        device: old.device.clone(),
        wipe_table: bool_p(old.wipe_table),
        partitions,
    })
}

fn translate_partition(old: &v2_1::Partition, at: &ContextPath) -> Result<Partition, TranslateError> {
    Ok(Partition {
        label: str_p(&old.label),
        number: old.number,
        size_mib: sectors_to_mib(old.size, &at.append("size"))?,
        start_mib: sectors_to_mib(old.start, &at.append("start"))?,
        type_guid: str_p(&old.type_guid),
        guid: str_p(&old.guid),
        wipe_partition_entry: None,
    })
}

/// Zero keeps its "use the default" meaning and becomes absent.
fn sectors_to_mib(sectors: i64, at: &ContextPath) -> Result<Option<i64>, TranslateError> {
    if sectors == 0 {
        return Ok(None);
    }
    if sectors % SECTORS_PER_MIB != 0 {
        return Err(TranslateError::Unrepresentable {
            path: at.clone(),
            reason: format!("{sectors} sectors is not a whole number of MiB"),
        });
    }
    Ok(Some(sectors / SECTORS_PER_MIB))
}

fn translate_filesystem(old: &v2_1::Filesystem) -> Filesystem {
    Filesystem {
        name: old.name.clone(),
        mount: old.mount.as_ref().map(|m| Mount {
            device: m.device.clone(),
            format: str_p(&m.format),
            wipe_filesystem: bool_p(m.wipe_filesystem),
            label: m.label.clone(),
            uuid: m.uuid.clone(),
            options: m.options.clone(),
            path: None,
            with_mount_unit: None,
        }),
        path: old.path.clone(),
    }
}

fn translate_owner(old: &Option<v2_1::NodeOwner>) -> Option<NodeOwner> {
    old.as_ref().map(|o| NodeOwner {
        id: o.id,
        name: o.name.clone(),
    })
}

fn translate_file(old: &v2_1::File) -> File {
    let resource = Resource {
        source: str_p(&old.contents.source),
        inline: None,
        local: None,
        compression: str_p(&old.contents.compression),
        verification: old
            .contents
            .verification
            .hash
            .as_ref()
            .map(|hash| Verification {
                hash: Some(hash.clone()),
            }),
    };
    let (contents, append) = if old.append {
        (None, Some(vec![resource]))
    } else {
        (Some(resource), None)
    };
    File {
        filesystem: old.filesystem.clone(),
        path: old.path.clone(),
        overwrite: old.overwrite,
        user: translate_owner(&old.user),
        group: translate_owner(&old.group),
        append,
        contents,
        mode: old.mode,
    }
}

fn translate_unit(old: &v2_1::Unit) -> Unit {
    Unit {
        name: old.name.clone(),
        enabled: old.enabled,
        mask: bool_p(old.mask),
        contents: str_p(&old.contents),
        dropins: map_list(&old.dropins, |d| Dropin {
            name: d.name.clone(),
            contents: str_p(&d.contents),
        }),
    }
}

fn translate_user(old: &v2_1::User) -> User {
    User {
        name: old.name.clone(),
        password_hash: old.password_hash.clone(),
        ssh_authorized_keys: old.ssh_authorized_keys.clone(),
        uid: old.uid,
        gecos: str_p(&old.gecos),
        home_dir: str_p(&old.home_dir),
        no_create_home: bool_p(old.no_create_home),
        primary_group: str_p(&old.primary_group),
        groups: old.groups.clone(),
        no_user_group: bool_p(old.no_user_group),
        system: bool_p(old.system),
        no_log_init: bool_p(old.no_log_init),
        shell: str_p(&old.shell),
    }
}
