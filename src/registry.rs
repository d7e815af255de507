//! Version Registry
//!
//! The process-wide, immutable lineage of every known file format version.
//! The table is plain static data, so concurrent readers need no locking.

use tracing::debug;

use crate::document::Attributes;
use crate::error::{Boundary, FormatError, Result};
use crate::schema::{AttributeMapping, VersionSchema};
use crate::version::FormatVersion;

/// Version assumed when detection finds no plausible schema
pub const FALLBACK_VERSION: FormatVersion = FormatVersion::new(1, 0, 0);

const BASE_REQUIRED: &[&str] = &["TITLE", "ARTIST", "MP3", "BPM"];
const DUAL_AUDIO_REQUIRED: &[&str] = &["TITLE", "ARTIST", "MP3", "AUDIO", "BPM"];
const AUDIO_REQUIRED: &[&str] = &["TITLE", "ARTIST", "AUDIO", "BPM"];

const LEGACY_OPTIONAL: &[&str] = &[
    "GAP", "COVER", "BACKGROUND", "VIDEO", "VIDEOGAP", "GENRE", "EDITION", "CREATOR",
    "LANGUAGE", "YEAR", "START", "END", "PREVIEWSTART", "MEDLEYSTARTBEAT", "MEDLEYENDBEAT",
    "CALCMEDLEY", "DUETSINGERP1", "DUETSINGERP2", "P1", "P2", "COMMENT", "RESOLUTION",
    "NOTESGAP", "RELATIVE", "ENCODING",
];

const V100_OPTIONAL: &[&str] = &[
    "GAP", "COVER", "BACKGROUND", "VIDEO", "VIDEOGAP", "GENRE", "EDITION", "CREATOR",
    "LANGUAGE", "YEAR", "START", "END", "PREVIEWSTART", "MEDLEYSTARTBEAT", "MEDLEYENDBEAT",
    "CALCMEDLEY", "P1", "P2", "COMMENT",
];

const V110_OPTIONAL: &[&str] = &[
    "VOCALS", "INSTRUMENTAL", "GAP", "COVER", "BACKGROUND", "VIDEO", "VIDEOGAP", "GENRE",
    "EDITION", "TAGS", "CREATOR", "LANGUAGE", "YEAR", "START", "END", "PREVIEWSTART",
    "MEDLEYSTARTBEAT", "MEDLEYENDBEAT", "CALCMEDLEY", "P1", "P2", "COMMENT", "PROVIDEDBY",
];

const V120_OPTIONAL: &[&str] = &[
    "AUDIOURL", "VOCALS", "INSTRUMENTAL", "GAP", "COVER", "COVERURL", "BACKGROUND",
    "BACKGROUNDURL", "VIDEO", "VIDEOURL", "VIDEOGAP", "GENRE", "EDITION", "TAGS", "CREATOR",
    "LANGUAGE", "YEAR", "START", "END", "PREVIEWSTART", "MEDLEYSTARTBEAT", "MEDLEYENDBEAT",
    "CALCMEDLEY", "P1", "P2", "COMMENT", "PROVIDEDBY",
];

// 1.0.0's keys, with the medley markers in milliseconds
const V200_OPTIONAL: &[&str] = &[
    "GAP", "COVER", "BACKGROUND", "VIDEO", "VIDEOGAP", "GENRE", "EDITION", "CREATOR",
    "LANGUAGE", "YEAR", "START", "END", "PREVIEWSTART", "MEDLEYSTART", "MEDLEYEND",
    "CALCMEDLEY", "P1", "P2", "COMMENT",
];

static SCHEMAS: [VersionSchema; 7] = [
    VersionSchema {
        version: FormatVersion::new(0, 1, 0),
        required_keys: BASE_REQUIRED,
        optional_keys: &[],
        primary_audio_keys: &["MP3"],
        upgrade_map: &[],
        downgrade_map: &[],
    },
    VersionSchema {
        version: FormatVersion::new(0, 2, 0),
        required_keys: BASE_REQUIRED,
        optional_keys: LEGACY_OPTIONAL,
        primary_audio_keys: &["MP3"],
        upgrade_map: &[],
        downgrade_map: &[],
    },
    VersionSchema {
        version: FormatVersion::new(0, 3, 0),
        required_keys: BASE_REQUIRED,
        optional_keys: LEGACY_OPTIONAL,
        primary_audio_keys: &["MP3"],
        upgrade_map: &[],
        downgrade_map: &[],
    },
    VersionSchema {
        version: FormatVersion::new(1, 0, 0),
        required_keys: BASE_REQUIRED,
        optional_keys: V100_OPTIONAL,
        primary_audio_keys: &["MP3"],
        upgrade_map: &[],
        // AUDIO does not exist before 1.1.0
        downgrade_map: &[AttributeMapping::rename("AUDIO", "MP3")],
    },
    VersionSchema {
        version: FormatVersion::new(1, 1, 0),
        required_keys: DUAL_AUDIO_REQUIRED,
        optional_keys: V110_OPTIONAL,
        primary_audio_keys: &["MP3", "AUDIO"],
        upgrade_map: &[],
        downgrade_map: &[],
    },
    VersionSchema {
        version: FormatVersion::new(1, 2, 0),
        required_keys: DUAL_AUDIO_REQUIRED,
        optional_keys: V120_OPTIONAL,
        primary_audio_keys: &["MP3", "AUDIO"],
        upgrade_map: &[],
        downgrade_map: &[
            AttributeMapping::transform("MEDLEYSTART", "MEDLEYSTARTBEAT", millis_to_beats),
            AttributeMapping::transform("MEDLEYEND", "MEDLEYENDBEAT", millis_to_beats),
        ],
    },
    VersionSchema {
        version: FormatVersion::new(2, 0, 0),
        required_keys: AUDIO_REQUIRED,
        optional_keys: V200_OPTIONAL,
        primary_audio_keys: &["MP3", "AUDIO"],
        upgrade_map: &[
            AttributeMapping::rename("MP3", "AUDIO"),
            AttributeMapping::transform("MEDLEYSTARTBEAT", "MEDLEYSTART", beats_to_millis),
            AttributeMapping::transform("MEDLEYENDBEAT", "MEDLEYEND", beats_to_millis),
        ],
        downgrade_map: &[],
    },
];

static REGISTRY: VersionRegistry = VersionRegistry { schemas: &SCHEMAS };

/// Ordered lineage of version schemas, ascending and duplicate free
#[derive(Debug, Clone, Copy)]
pub struct VersionRegistry {
    schemas: &'static [VersionSchema],
}

impl VersionRegistry {
    /// The built-in lineage
    pub fn global() -> &'static VersionRegistry {
        &REGISTRY
    }

    /// Build a registry over a custom table.
    ///
    /// The table must be sorted ascending by version without duplicates.
    pub fn from_static(schemas: &'static [VersionSchema]) -> Self {
        debug_assert!(
            schemas.windows(2).all(|w| w[0].version < w[1].version),
            "registry must be strictly ascending"
        );
        Self { schemas }
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn contains(&self, version: FormatVersion) -> bool {
        self.position(version).is_some()
    }

    fn position(&self, version: FormatVersion) -> Option<usize> {
        self.schemas
            .binary_search_by(|s| s.version.cmp(&version))
            .ok()
    }

    /// Look up the schema for a version
    pub fn schema_for(&self, version: FormatVersion) -> Result<&'static VersionSchema> {
        let schemas = self.schemas;
        self.position(version)
            .map(|i| &schemas[i])
            .ok_or(FormatError::UnknownVersion(version))
    }

    /// The version directly above `version`
    pub fn neighbor_above(&self, version: FormatVersion) -> Result<FormatVersion> {
        let i = self
            .position(version)
            .ok_or(FormatError::UnknownVersion(version))?;
        self.schemas
            .get(i + 1)
            .map(|s| s.version)
            .ok_or(FormatError::VersionChange {
                version,
                boundary: Boundary::Top,
            })
    }

    /// The version directly below `version`
    pub fn neighbor_below(&self, version: FormatVersion) -> Result<FormatVersion> {
        let i = self
            .position(version)
            .ok_or(FormatError::UnknownVersion(version))?;
        i.checked_sub(1)
            .map(|j| self.schemas[j].version)
            .ok_or(FormatError::VersionChange {
                version,
                boundary: Boundary::Bottom,
            })
    }

    /// Oldest registered version
    pub fn oldest(&self) -> Option<FormatVersion> {
        self.schemas.first().map(|s| s.version)
    }

    /// Newest registered version
    pub fn latest(&self) -> Option<FormatVersion> {
        self.schemas.last().map(|s| s.version)
    }

    /// All versions, ascending
    pub fn versions(&self) -> impl DoubleEndedIterator<Item = FormatVersion> + '_ {
        self.schemas.iter().map(|s| s.version)
    }

    /// All versions, newest first (detection order)
    pub fn all_ids_descending(&self) -> Vec<FormatVersion> {
        self.versions().rev().collect()
    }

    /// Schemas, newest first
    pub fn schemas_descending(&self) -> impl Iterator<Item = &'static VersionSchema> {
        self.schemas.iter().rev()
    }
}

impl Default for VersionRegistry {
    fn default() -> Self {
        *Self::global()
    }
}

/// Parse a decimal number as written in song headers ("264,5" or "264.5")
pub(crate) fn parse_decimal(value: &str) -> Option<f64> {
    let value = value.trim().replace(',', ".");
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Milliseconds per beat and the GAP offset, if the header allows timing math
fn beat_timing(attributes: &Attributes) -> Option<(f64, f64)> {
    let bpm = attributes
        .get("BPM")
        .and_then(|v| v.as_deref())
        .and_then(parse_decimal)
        .filter(|bpm| *bpm > 0.0)?;
    let gap = attributes
        .get("GAP")
        .and_then(|v| v.as_deref())
        .and_then(parse_decimal)
        .unwrap_or(0.0);
    Some((60_000.0 / (bpm * 4.0), gap))
}

fn beats_to_millis(value: &str, attributes: &Attributes) -> String {
    match (parse_decimal(value), beat_timing(attributes)) {
        (Some(beat), Some((ms_per_beat, gap))) => format!("{}", (gap + beat * ms_per_beat).round() as i64),
        _ => {
            debug!(value, "keeping medley value, beat timing unavailable");
            value.to_string()
        }
    }
}

fn millis_to_beats(value: &str, attributes: &Attributes) -> String {
    match (parse_decimal(value), beat_timing(attributes)) {
        (Some(ms), Some((ms_per_beat, gap))) => format!("{}", ((ms - gap) / ms_per_beat).round() as i64),
        _ => {
            debug!(value, "keeping medley value, beat timing unavailable");
            value.to_string()
        }
    }
}
