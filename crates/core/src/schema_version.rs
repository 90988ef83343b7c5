//! Legacy schema version tags and version-string parsing.
//!
//! The legacy store changed its table layout several times. Every dialect
//! the engine knows about is one [`SchemaVersion`] variant; the query
//! registry is keyed by these tags.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Leading `major.minor` pair of a version string such as `4.14.0 SP2`.
static MAJOR_MINOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)").expect("valid regex"));

/// Keyword stored in a connection to request version detection.
pub const AUTO_VERSION: &str = "auto";

/// A known legacy schema dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaVersion {
    #[serde(rename = "4.0")]
    V4_0,
    #[serde(rename = "4.3")]
    V4_3,
    #[serde(rename = "4.5")]
    V4_5,
    #[serde(rename = "4.6")]
    V4_6,
    #[serde(rename = "4.7")]
    V4_7,
    #[serde(rename = "4.8")]
    V4_8,
    #[serde(rename = "4.9")]
    V4_9,
    #[serde(rename = "4.10")]
    V4_10,
    #[serde(rename = "4.11")]
    V4_11,
    #[serde(rename = "4.12")]
    V4_12,
    #[serde(rename = "4.13")]
    V4_13,
    #[serde(rename = "4.14")]
    V4_14,
    #[serde(rename = "4.15")]
    V4_15,
    /// Multi-vendor edition: exposes vendor/company tables.
    #[serde(rename = "mve")]
    Mve,
    /// Detected structurally as "4.10 or later" without an exact minor.
    #[serde(rename = "4.10+")]
    V4_10Plus,
}

impl SchemaVersion {
    /// The baseline every registry lookup falls back to.
    pub const BASELINE: SchemaVersion = SchemaVersion::V4_0;

    /// All tags, ascending.
    pub const ALL: [SchemaVersion; 15] = [
        Self::V4_0,
        Self::V4_3,
        Self::V4_5,
        Self::V4_6,
        Self::V4_7,
        Self::V4_8,
        Self::V4_9,
        Self::V4_10,
        Self::V4_11,
        Self::V4_12,
        Self::V4_13,
        Self::V4_14,
        Self::V4_15,
        Self::Mve,
        Self::V4_10Plus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V4_0 => "4.0",
            Self::V4_3 => "4.3",
            Self::V4_5 => "4.5",
            Self::V4_6 => "4.6",
            Self::V4_7 => "4.7",
            Self::V4_8 => "4.8",
            Self::V4_9 => "4.9",
            Self::V4_10 => "4.10",
            Self::V4_11 => "4.11",
            Self::V4_12 => "4.12",
            Self::V4_13 => "4.13",
            Self::V4_14 => "4.14",
            Self::V4_15 => "4.15",
            Self::Mve => "mve",
            Self::V4_10Plus => "4.10+",
        }
    }

    /// Parse an exact tag. Returns `None` for unknown values.
    pub fn from_tag(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    /// Map a numeric `major.minor` onto a tag, if one exists.
    pub fn from_major_minor(major: u32, minor: u32) -> Option<Self> {
        if major != 4 {
            return None;
        }
        match minor {
            0 => Some(Self::V4_0),
            3 => Some(Self::V4_3),
            5 => Some(Self::V4_5),
            6 => Some(Self::V4_6),
            7 => Some(Self::V4_7),
            8 => Some(Self::V4_8),
            9 => Some(Self::V4_9),
            10 => Some(Self::V4_10),
            11 => Some(Self::V4_11),
            12 => Some(Self::V4_12),
            13 => Some(Self::V4_13),
            14 => Some(Self::V4_14),
            15 => Some(Self::V4_15),
            _ => None,
        }
    }

    /// Whether the vendor/supplier phase can run against this dialect.
    pub fn is_multi_vendor(&self) -> bool {
        matches!(self, Self::Mve)
    }

    /// Whether names and descriptions live in per-language description
    /// tables instead of inline columns.
    pub fn uses_description_tables(&self) -> bool {
        matches!(
            self,
            Self::V4_10
                | Self::V4_11
                | Self::V4_12
                | Self::V4_13
                | Self::V4_14
                | Self::V4_15
                | Self::V4_10Plus
        )
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Match the raw version setting of a legacy install against the known tags.
///
/// Only the first `major.minor` pair is considered and it must match a tag
/// exactly. Plain substring containment is not used: `"4.14.0"` contains
/// `"4.0"` and would be misread as the baseline.
pub fn parse_settings_version(value: &str) -> Option<SchemaVersion> {
    let caps = MAJOR_MINOR_RE.captures(value.trim())?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    SchemaVersion::from_major_minor(major, minor)
}

/// Version configured on a source connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredVersion {
    /// Resolve by probing the source at run start.
    Auto,
    Fixed(SchemaVersion),
}

impl DeclaredVersion {
    /// Parse the stored form (`auto` or an exact tag).
    pub fn parse(s: &str) -> Option<Self> {
        if s == AUTO_VERSION {
            Some(Self::Auto)
        } else {
            SchemaVersion::from_tag(s).map(Self::Fixed)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => AUTO_VERSION,
            Self::Fixed(v) => v.as_str(),
        }
    }
}

/// Validate a stored version value.
pub fn validate_declared_version(s: &str) -> Result<(), String> {
    if DeclaredVersion::parse(s).is_some() {
        Ok(())
    } else {
        let tags: Vec<&str> = SchemaVersion::ALL.iter().map(|v| v.as_str()).collect();
        Err(format!(
            "Invalid schema version '{s}'. Must be '{AUTO_VERSION}' or one of: {}",
            tags.join(", ")
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
