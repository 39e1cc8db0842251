//! What the target server is and what its DDL grammar accepts.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use sluice_sql::BACKTICK;
use thiserror::Error;

/// The server flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Mysql,
    #[serde(alias = "maria")]
    MariaDb,
}

/// A server version, compared component-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid server version {0:?}")]
pub struct ParseVersionError(String);

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for Version {
    type Err = ParseVersionError;

    /// Parses `8.0.31`, `8.0` or `10.4.3-MariaDB-log`; anything after the
    /// first `-` is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseVersionError(s.to_string());
        let numeric = s.trim().split('-').next().unwrap_or_default();
        let mut parts = numeric.split('.');
        let mut next = |required: bool| -> Result<u32, ParseVersionError> {
            match parts.next() {
                Some(p) => p.parse().map_err(|_| err()),
                None if required => Err(err()),
                None => Ok(0),
            }
        };
        let version = Version::new(next(true)?, next(false)?, next(false)?);
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(version)
    }
}

impl TryFrom<String> for Version {
    type Error = ParseVersionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// The read-only context every planning call consults.
///
/// Built once and shared; the planner never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "CapabilitiesFile")]
pub struct Capabilities {
    pub variant: Variant,
    pub version: Version,
    /// Identifier quote character.
    pub quote: char,
    /// Server default character set.
    pub charset: String,
    /// Server default collation.
    pub collation: String,
    pub supports_rename_column: bool,
    pub supports_enforce_check: bool,
}

impl Capabilities {
    /// Derive the feature flags and server defaults for a variant/version.
    pub fn new(variant: Variant, version: Version) -> Self {
        let (rename, enforce) = match variant {
            Variant::Mysql => (
                version >= Version::new(8, 0, 0),
                version >= Version::new(8, 0, 16),
            ),
            Variant::MariaDb => (version >= Version::new(10, 5, 2), false),
        };
        let (charset, collation) = match variant {
            Variant::Mysql if version.major >= 8 => ("utf8mb4", "utf8mb4_0900_ai_ci"),
            _ => ("latin1", "latin1_swedish_ci"),
        };
        Self {
            variant,
            version,
            quote: BACKTICK,
            charset: charset.to_string(),
            collation: collation.to_string(),
            supports_rename_column: rename,
            supports_enforce_check: enforce,
        }
    }

    pub fn mysql(version: Version) -> Self {
        Self::new(Variant::Mysql, version)
    }

    pub fn mariadb(version: Version) -> Self {
        Self::new(Variant::MariaDb, version)
    }

    pub fn with_charset(mut self, charset: impl Into<String>, collation: impl Into<String>) -> Self {
        self.charset = charset.into();
        self.collation = collation.into();
        self
    }

    pub fn is_mariadb(&self) -> bool {
        self.variant == Variant::MariaDb
    }

    /// Reports whether the server is older than `version`.
    pub fn older_than(&self, version: Version) -> bool {
        self.version < version
    }

    /// MariaDB before 10.4.3 stores JSON as LONGTEXT without validating it.
    pub(crate) fn needs_json_check(&self) -> bool {
        self.is_mariadb() && self.older_than(Version::new(10, 4, 3))
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::mysql(Version::new(8, 0, 31))
    }
}

/// The on-disk form: everything but the variant and version is optional
/// and falls back to what they imply.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CapabilitiesFile {
    variant: Variant,
    version: Option<Version>,
    quote: Option<char>,
    charset: Option<String>,
    collation: Option<String>,
    supports_rename_column: Option<bool>,
    supports_enforce_check: Option<bool>,
}

impl From<CapabilitiesFile> for Capabilities {
    fn from(file: CapabilitiesFile) -> Self {
        let version = file.version.unwrap_or(match file.variant {
            Variant::Mysql => Version::new(8, 0, 31),
            Variant::MariaDb => Version::new(10, 6, 0),
        });
        let mut caps = Capabilities::new(file.variant, version);
        if let Some(quote) = file.quote {
            caps.quote = quote;
        }
        if let Some(charset) = file.charset {
            caps.charset = charset;
        }
        if let Some(collation) = file.collation {
            caps.collation = collation;
        }
        if let Some(rename) = file.supports_rename_column {
            caps.supports_rename_column = rename;
        }
        if let Some(enforce) = file.supports_enforce_check {
            caps.supports_enforce_check = enforce;
        }
        caps
    }
}
