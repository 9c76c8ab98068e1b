//! Schema version registry.

use crate::{v1, v2_0, v2_1, v2_2};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A `major.minor.patch` schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// True for versions this crate can read.
    pub fn is_supported(&self) -> bool {
        SUPPORTED.contains(self)
    }
}

pub const V1: Version = Version::new(1, 0, 0);
pub const V2_0: Version = Version::new(2, 0, 0);
pub const V2_1: Version = Version::new(2, 1, 0);
pub const V2_2: Version = Version::new(2, 2, 0);

/// The current schema; every supported document is translated up to it.
pub const MAX_VERSION: Version = V2_2;

/// Every readable version, oldest first.
pub const SUPPORTED: [Version; 4] = [V1, V2_0, V2_1, V2_2];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version {input:?}: expected major.minor.patch")]
pub struct VersionParseError {
    pub input: String,
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError {
            input: s.to_string(),
        };
        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u64, VersionParseError> {
            let part = parts.next().ok_or_else(err)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            part.parse().map_err(|_| err())
        };
        let version = Version::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(version)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A parsed document tagged with the schema version it was written against.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionedConfig {
    V1(v1::Config),
    V2_0(v2_0::Config),
    V2_1(v2_1::Config),
    V2_2(v2_2::Config),
}

impl VersionedConfig {
    pub fn version(&self) -> Version {
        match self {
            VersionedConfig::V1(_) => V1,
            VersionedConfig::V2_0(_) => V2_0,
            VersionedConfig::V2_1(_) => V2_1,
            VersionedConfig::V2_2(_) => V2_2,
        }
    }
}
