//! Structural descriptors for the current schema.
//!
//! Field names and order follow the serialized form of each type.

use super::*;
use crate::schema::{Describe, FieldKind, ObjectSchema};

fn opt(kind: FieldKind) -> FieldKind {
    FieldKind::optional(kind)
}

fn list_of(kind: FieldKind) -> FieldKind {
    FieldKind::list_of(kind)
}

fn object<T: Describe>() -> FieldKind {
    FieldKind::object::<T>()
}

fn node_fields(schema: ObjectSchema) -> ObjectSchema {
    schema
        .field("filesystem", FieldKind::String)
        .field("path", FieldKind::String)
        .field("overwrite", opt(FieldKind::Bool))
        .field("user", opt(object::<NodeOwner>()))
        .field("group", opt(object::<NodeOwner>()))
}

impl Describe for Config {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Config")
            .field("ignition", object::<Ignition>())
            .field("storage", opt(object::<Storage>()))
            .field("systemd", opt(object::<Systemd>()))
            .field("networkd", opt(object::<Networkd>()))
            .field("passwd", opt(object::<Passwd>()))
            .field("kernelArguments", opt(object::<KernelArguments>()))
    }
}

impl Describe for Ignition {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Ignition").field("version", FieldKind::String)
    }
}

impl Describe for Storage {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Storage")
            .field("disks", list_of(object::<Disk>()))
            .field("raid", list_of(object::<Raid>()))
            .field("filesystems", list_of(object::<Filesystem>()))
            .field("files", list_of(object::<File>()))
            .field("directories", list_of(object::<Directory>()))
            .field("links", list_of(object::<Link>()))
            .field("luks", list_of(object::<Luks>()))
    }
}

impl Describe for Disk {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Disk")
            .field("device", FieldKind::String)
            .field("wipeTable", opt(FieldKind::Bool))
            .field("partitions", list_of(object::<Partition>()))
    }
}

impl Describe for Partition {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Partition")
            .field("label", opt(FieldKind::String))
            .field("number", FieldKind::Integer)
            .field("sizeMiB", opt(FieldKind::Integer))
            .field("startMiB", opt(FieldKind::Integer))
            .field("typeGuid", opt(FieldKind::String))
            .field("guid", opt(FieldKind::String))
            .field("wipePartitionEntry", opt(FieldKind::Bool))
    }
}

impl Describe for Raid {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Raid")
            .field("name", FieldKind::String)
            .field("level", FieldKind::String)
            .field("devices", list_of(FieldKind::String))
            .field("spares", opt(FieldKind::Integer))
            .field("options", list_of(FieldKind::String))
    }
}

impl Describe for Filesystem {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Filesystem")
            .field("name", FieldKind::String)
            .field("mount", opt(object::<Mount>()))
            .field("path", opt(FieldKind::String))
    }
}

impl Describe for Mount {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Mount")
            .field("device", FieldKind::String)
            .field("format", opt(FieldKind::String))
            .field("wipeFilesystem", opt(FieldKind::Bool))
            .field("label", opt(FieldKind::String))
            .field("uuid", opt(FieldKind::String))
            .field("options", list_of(FieldKind::String))
            .field("path", opt(FieldKind::String))
            .field("withMountUnit", opt(FieldKind::Bool))
    }
}

impl Describe for File {
    fn describe() -> ObjectSchema {
        node_fields(ObjectSchema::new("File"))
            .field("append", list_of(object::<Resource>()))
            .field("contents", opt(object::<Resource>()))
            .field("mode", opt(FieldKind::Integer))
    }
}

impl Describe for Resource {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Resource")
            .field("source", opt(FieldKind::String))
            .field("inline", opt(FieldKind::String))
            .field("local", opt(FieldKind::String))
            .field("compression", opt(FieldKind::String))
            .field("verification", opt(object::<Verification>()))
    }
}

impl Describe for Verification {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Verification").field("hash", opt(FieldKind::String))
    }
}

impl Describe for Directory {
    fn describe() -> ObjectSchema {
        node_fields(ObjectSchema::new("Directory")).field("mode", opt(FieldKind::Integer))
    }
}

impl Describe for Link {
    fn describe() -> ObjectSchema {
        node_fields(ObjectSchema::new("Link"))
            .field("target", FieldKind::String)
            .field("hard", opt(FieldKind::Bool))
    }
}

impl Describe for NodeOwner {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("NodeOwner")
            .field("id", opt(FieldKind::Integer))
            .field("name", opt(FieldKind::String))
    }
}

impl Describe for Luks {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Luks")
            .field("name", FieldKind::String)
            .field("device", FieldKind::String)
            .field("label", opt(FieldKind::String))
            .field("wipeVolume", opt(FieldKind::Bool))
            .field("cex", opt(object::<Cex>()))
    }
}

impl Describe for Cex {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Cex").field("enabled", opt(FieldKind::Bool))
    }
}

impl Describe for Systemd {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Systemd").field("units", list_of(object::<Unit>()))
    }
}

impl Describe for Unit {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Unit")
            .field("name", FieldKind::String)
            .field("enabled", opt(FieldKind::Bool))
            .field("mask", opt(FieldKind::Bool))
            .field("contents", opt(FieldKind::String))
            .field("dropins", list_of(object::<Dropin>()))
    }
}

impl Describe for Dropin {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Dropin")
            .field("name", FieldKind::String)
            .field("contents", opt(FieldKind::String))
    }
}

impl Describe for Networkd {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Networkd").field("units", list_of(object::<NetworkdUnit>()))
    }
}

impl Describe for NetworkdUnit {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("NetworkdUnit")
            .field("name", FieldKind::String)
            .field("contents", opt(FieldKind::String))
    }
}

impl Describe for Passwd {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Passwd")
            .field("users", list_of(object::<User>()))
            .field("groups", list_of(object::<Group>()))
    }
}

impl Describe for User {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("User")
            .field("name", FieldKind::String)
            .field("passwordHash", opt(FieldKind::String))
            .field("sshAuthorizedKeys", list_of(FieldKind::String))
            .field("uid", opt(FieldKind::Integer))
            .field("gecos", opt(FieldKind::String))
            .field("homeDir", opt(FieldKind::String))
            .field("noCreateHome", opt(FieldKind::Bool))
            .field("primaryGroup", opt(FieldKind::String))
            .field("groups", list_of(FieldKind::String))
            .field("noUserGroup", opt(FieldKind::Bool))
            .field("system", opt(FieldKind::Bool))
            .field("noLogInit", opt(FieldKind::Bool))
            .field("shell", opt(FieldKind::String))
    }
}

impl Describe for Group {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("Group")
            .field("name", FieldKind::String)
            .field("gid", opt(FieldKind::Integer))
            .field("passwordHash", opt(FieldKind::String))
            .field("system", opt(FieldKind::Bool))
    }
}

impl Describe for KernelArguments {
    fn describe() -> ObjectSchema {
        ObjectSchema::new("KernelArguments")
            .field("shouldExist", list_of(FieldKind::String))
            .field("shouldNotExist", list_of(FieldKind::String))
    }
}
