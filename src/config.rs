//! Configuration for the song file tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (usdx.toml)
//! - Environment variables (USDX__*)
//!
//! ## Example config file (usdx.toml):
//! ```toml
//! [write]
//! line_ending = "crlf"
//! end_marker = true
//! reorder_canonical = false
//!
//! [migration]
//! default_target = "1.2.0"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::codec::{LineEnding, WriteOptions};
use crate::error::Result;
use crate::version::FormatVersion;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Output settings
    #[serde(default)]
    pub write: WriteConfig,

    /// Migration settings
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// How documents are written back
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteConfig {
    #[serde(default)]
    pub line_ending: LineEnding,

    /// Append the `E` end-of-song line
    #[serde(default)]
    pub end_marker: bool,

    /// Reorder headers into the canonical key order before writing
    #[serde(default)]
    pub reorder_canonical: bool,
}

/// Migration defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Version used when `migrate` is run without `--to`
    #[serde(default = "default_target")]
    pub default_target: FormatVersion,
}

fn default_target() -> FormatVersion {
    FormatVersion::new(1, 2, 0)
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            default_target: default_target(),
        }
    }
}

impl WriteConfig {
    pub fn options(&self) -> WriteOptions {
        WriteOptions {
            line_ending: self.line_ending,
            end_marker: self.end_marker,
        }
    }
}

impl FormatConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = ["usdx.toml", ".usdx.toml", "config/usdx.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "ultrastar", "usdx") {
            let xdg_config = config_dir.config_dir().join("usdx.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // USDX__WRITE__END_MARKER=true
        builder = builder.add_source(
            Environment::with_prefix("USDX")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
