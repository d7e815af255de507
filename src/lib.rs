//! UltraStar Song Format
//!
//! Reading, writing and version migration for UltraStar song files: a header
//! of `#KEY:VALUE` lines followed by free-form note lines.
//!
//! ## Features
//!
//! - **Version Detection**: Infers the format version from the header keys
//! - **Lossless Codec**: Parse and serialize without reordering or filtering
//! - **Stepwise Migration**: Upgrade or downgrade one version at a time
//! - **Header Checks**: Missing required keys, empty values, bad numbers
//!
//! ## Lineage
//!
//! ```text
//! 0.1.0 ─ 0.2.0 ─ 0.3.0 ─ 1.0.0 ─ 1.1.0 ─ 1.2.0 ─ 2.0.0
//!                          │                       │
//!                     fallback            MP3 -> AUDIO,
//!                                    MEDLEY*BEAT -> MEDLEY* (ms)
//! ```
//!
//! ## Example
//!
//! ```
//! use ultrastar_format::{codec, FormatVersion};
//!
//! let doc = codec::parse_str("#TITLE:Song\n#ARTIST:Band\n#MP3:song.mp3\n#BPM:120\n: 0 4 60 La\nE\n");
//! let migration = doc.migrate_to(FormatVersion::new(2, 0, 0)).unwrap();
//! assert_eq!(migration.document.get("AUDIO"), Some("song.mp3"));
//! assert!(codec::serialize(&migration.document).starts_with("#TITLE:Song\n"));
//! ```

pub mod check;
pub mod codec;
pub mod config;
pub mod detect;
pub mod diff;
pub mod document;
pub mod error;
pub mod migrate;
pub mod registry;
pub mod schema;
pub mod version;

pub use check::{CheckReport, CheckStatus};
pub use codec::{
    parse, parse_bytes_with_report, parse_str, parse_with_report, serialize, serialize_with, Parsed,
    ParseWarning, WriteOptions,
};
pub use config::FormatConfig;
pub use detect::{detect_from_keys, detect_version, Detection};
pub use diff::DocumentDiff;
pub use document::{Attributes, Document};
pub use error::{Boundary, FormatError, Result};
pub use migrate::{downgrade, set_version, upgrade, Migration, MigrationStatus};
pub use registry::VersionRegistry;
pub use schema::{AttributeMapping, Direction, VersionSchema};
pub use version::FormatVersion;
