//! Header checks against the active version schema

use serde::Serialize;

use crate::document::Document;
use crate::registry::{parse_decimal, VersionRegistry, FALLBACK_VERSION};
use crate::version::FormatVersion;

/// Keys whose values must be non-negative numbers
pub const NUMERIC_KEYS: &[&str] = &[
    "BPM", "GAP", "VIDEOGAP", "YEAR", "START", "END", "PREVIEWSTART", "MEDLEYSTARTBEAT",
    "MEDLEYENDBEAT", "MEDLEYSTART", "MEDLEYEND",
];

/// Overall verdict of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Ok,
    /// At least one required key is missing
    Missing,
    /// All required keys present, but some values are empty or invalid
    Error,
}

/// Findings of a header check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub version: FormatVersion,
    pub missing_required: Vec<String>,
    pub empty_values: Vec<String>,
    /// Keys the version does not declare (informational)
    pub unknown_keys: Vec<String>,
    pub invalid_numbers: Vec<String>,
}

impl CheckReport {
    pub fn for_document(document: &Document) -> Self {
        let version = document.version();
        let registry = VersionRegistry::global();
        let schema = registry
            .schema_for(version)
            .or_else(|_| registry.schema_for(FALLBACK_VERSION))
            .ok();

        let missing_required = schema
            .map(|s| {
                s.required_keys
                    .iter()
                    .filter(|k| !document.contains(k))
                    .map(|k| k.to_string())
                    .collect()
            })
            .unwrap_or_default();

        let mut empty_values = Vec::new();
        let mut unknown_keys = Vec::new();
        let mut invalid_numbers = Vec::new();

        for (key, value) in document.attributes() {
            if schema.is_some_and(|s| !s.declares(key)) {
                unknown_keys.push(key.clone());
            }
            match value {
                None => empty_values.push(key.clone()),
                Some(value) if NUMERIC_KEYS.iter().any(|k| *k == key.as_str()) => {
                    if !parse_decimal(value).is_some_and(|n| n >= 0.0) {
                        invalid_numbers.push(key.clone());
                    }
                }
                Some(_) => {}
            }
        }

        Self {
            version,
            missing_required,
            empty_values,
            unknown_keys,
            invalid_numbers,
        }
    }

    pub fn status(&self) -> CheckStatus {
        if !self.missing_required.is_empty() {
            CheckStatus::Missing
        } else if !self.empty_values.is_empty() || !self.invalid_numbers.is_empty() {
            CheckStatus::Error
        } else {
            CheckStatus::Ok
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status() == CheckStatus::Ok
    }
}
