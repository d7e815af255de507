//! Error types for the format codec and migration engine

use thiserror::Error;

use crate::version::FormatVersion;

/// Result type for format operations
pub type Result<T> = std::result::Result<T, FormatError>;

/// Which end of the version lineage a migration ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// Newest registered version, nothing to upgrade to
    Top,
    /// Oldest registered version, nothing to downgrade to
    Bottom,
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Boundary::Top => write!(f, "newest"),
            Boundary::Bottom => write!(f, "oldest"),
        }
    }
}

/// Format errors
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Malformed version: {0:?}")]
    MalformedVersion(String),

    #[error("Unreadable source: {0}")]
    UnreadableSource(String),

    #[error("Unknown version: {0}")]
    UnknownVersion(FormatVersion),

    #[error("Cannot change version {version}: already at the {boundary} version")]
    VersionChange {
        version: FormatVersion,
        boundary: Boundary,
    },

    #[error("Invalid attribute index {index} for {len} attributes")]
    InvalidIndex { index: usize, len: usize },

    #[error("Invalid attribute {key:?}: {reason}")]
    InvalidAttribute { key: String, reason: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl FormatError {
    /// Whether this is the expected lineage-boundary condition
    pub fn is_boundary(&self) -> bool {
        matches!(self, FormatError::VersionChange { .. })
    }
}
