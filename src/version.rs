//! Format version identifiers

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::FormatError;

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[vV]?(\d+)\.(\d+)\.(\d+)$").expect("version pattern is valid")
    })
}

/// A file format version (e.g., "1.0.0")
///
/// Ordering is lexicographic on (major, minor, patch), which is exactly the
/// field order, so the derived `Ord` is the lineage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FormatVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl FormatVersion {
    /// Create a version from its three components
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// Parse from a version string, accepting an optional leading 'v' or 'V'
    pub fn parse(version_str: &str) -> Result<Self, FormatError> {
        let caps = version_pattern()
            .captures(version_str.trim())
            .ok_or_else(|| FormatError::MalformedVersion(version_str.to_string()))?;

        let component = |i: usize| -> Result<u64, FormatError> {
            caps[i]
                .parse()
                .map_err(|_| FormatError::MalformedVersion(version_str.to_string()))
        };

        Ok(Self::new(component(1)?, component(2)?, component(3)?))
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for FormatVersion {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FormatVersion {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FormatVersion> for String {
    fn from(version: FormatVersion) -> Self {
        version.to_string()
    }
}
