//! Messages attached to validation diagnostics.
//!
//! Kept as one enum so callers and tests can compare against stable text.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Invalid {
    // ---- general -------------------------------------------------------
    #[error("unsupported config version {found}; expected {expected}")]
    UnsupportedVersion { found: String, expected: String },
    #[error("config version 1 is deprecated; migrate to {latest}")]
    DeprecatedVersion { latest: String },
    #[error("unrecognized key {key:?}")]
    UnknownKey { key: String },
    #[error("unrecognized key {key:?}, did you mean {suggestion:?}?")]
    UnknownKeyDidYouMean { key: String, suggestion: String },

    // ---- paths and names -----------------------------------------------
    #[error("path not absolute")]
    NotAbsolute,
    #[error("no filesystem specified")]
    NoFilesystem,
    #[error("name cannot be empty")]
    EmptyName,
    #[error("link target cannot be empty")]
    EmptyTarget,

    // ---- resources -----------------------------------------------------
    #[error("only one of the following can be set: inline, local, source")]
    TooManyResourceSources,
    #[error("unsupported compression {0:?}; only \"gzip\" is supported")]
    Compression(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid url scheme {0:?}")]
    InvalidScheme(String),
    #[error("invalid data url: {0}")]
    InvalidDataUrl(String),
    #[error("verification hash requires contents to verify")]
    HashWithoutSource,
    #[error("invalid verification hash {0:?}; expected sha512-<hex digest>")]
    InvalidHash(String),

    // ---- files and directories -----------------------------------------
    #[error("cannot set both append and overwrite to true")]
    AppendAndOverwrite,
    #[error("illegal file mode {}", octal(.0))]
    IllegalMode(i64),
    #[error(
        "unreasonable mode would be reasonable if specified in octal; remember to add a leading zero"
    )]
    DecimalMode,
    #[error("duplicate entry for path {0:?}")]
    DuplicatePath(String),
    #[error("path {path:?} conflicts with systemd unit or dropin {unit:?}")]
    SystemdPathConflict { path: String, unit: String },
    #[error("file {path:?} references nonexistent filesystem {filesystem:?}")]
    NonexistentFilesystem { path: String, filesystem: String },
    #[error("filesystem {0:?} shadows existing filesystem definition")]
    ShadowedFilesystem(String),

    // ---- filesystems ---------------------------------------------------
    #[error("filesystem must specify exactly one of mount or path; neither was set")]
    FilesystemNoMountOrPath,
    #[error("filesystem must specify exactly one of mount or path; both were set")]
    FilesystemMountAndPath,
    #[error("invalid filesystem format {0:?}")]
    InvalidFormat(String),
    #[error("format is required if withMountUnit is true")]
    MountUnitNoFormat,
    #[error("path is required if withMountUnit is true and format is not swap")]
    MountUnitNoPath,

    // ---- disks ---------------------------------------------------------
    #[error("partition label {0:?} is longer than 36 characters")]
    LabelTooLong(String),
    #[error("invalid GUID {0:?}")]
    InvalidGuid(String),
    #[error("partition number {0} is used more than once")]
    DuplicatePartitionNumber(i64),
    #[error("invalid raid level {0:?}")]
    InvalidRaidLevel(String),
    #[error("spares unsupported for raid level {0:?}")]
    SparesUnsupported(String),
    #[error("raid array has no devices")]
    NoRaidDevices,

    // ---- systemd -------------------------------------------------------
    #[error("invalid systemd unit extension in {0:?}")]
    InvalidUnitExtension(String),
    #[error("invalid systemd unit dropin extension in {0:?}; must end in .conf")]
    InvalidDropinExtension(String),
    #[error("invalid networkd unit extension in {0:?}")]
    InvalidNetworkdExtension(String),

    // ---- luks ----------------------------------------------------------
    #[error(
        "'rd.luks.key=/etc/luks/cex.key' must be set as kernel argument when CEX is enabled for the boot device"
    )]
    CexKernelArgMissing,
}

/// Octal rendering that keeps the sign of negative modes.
fn octal(mode: &i64) -> String {
    let mode = *mode;
    if mode < 0 {
        format!("-{:o}", mode.unsigned_abs())
    } else {
        format!("{mode:o}")
    }
}
