//! Version detection from header evidence
//!
//! Files rarely declare their format version, so the version is inferred
//! from which keys are present:
//!
//! 1. A registered, parseable `VERSION` value is trusted as is.
//! 2. Otherwise every schema whose required keys are all present is scored,
//!    newest first. More optional-key matches win; equal matches prefer the
//!    schema with fewer unmatched optional keys (the tightest fit); a full
//!    tie keeps the newer version.
//! 3. If nothing qualifies, [`FALLBACK_VERSION`] is used. Detection never fails.

use serde::Serialize;
use tracing::{debug, warn};

use crate::document::{normalize_key, Attributes, VERSION_KEY};
use crate::registry::{VersionRegistry, FALLBACK_VERSION};
use crate::version::FormatVersion;

/// How a version was arrived at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Taken from a registered `VERSION` header value
    Explicit,
    /// Best match among schemas whose required keys were present
    Scored {
        optional_matches: usize,
        unmatched_optional: usize,
    },
    /// No schema matched
    Fallback,
}

/// Result of version detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub version: FormatVersion,
    #[serde(flatten)]
    pub method: DetectionMethod,
    /// Set when a `VERSION` header was present but could not be used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored_declaration: Option<IgnoredDeclaration>,
}

/// Why an explicit `VERSION` value was not trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoredDeclaration {
    Malformed,
    Unregistered,
}

/// Detect the version of a header using the built-in lineage
pub fn detect_version(attributes: &Attributes) -> FormatVersion {
    detect(VersionRegistry::global(), attributes).version
}

/// Detect from a bare key set (no explicit version value available)
pub fn detect_from_keys<I, S>(keys: I) -> FormatVersion
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let attributes: Attributes = keys
        .into_iter()
        .map(|k| (normalize_key(k.as_ref()), None))
        .collect();
    detect_version(&attributes)
}

/// Detect the version of a header against `registry`
pub fn detect(registry: &VersionRegistry, attributes: &Attributes) -> Detection {
    let mut ignored_declaration = None;

    if let Some(declared) = attributes.get(VERSION_KEY) {
        let declared = declared.as_deref().unwrap_or_default();
        match FormatVersion::parse(declared) {
            Ok(version) if registry.contains(version) => {
                return Detection {
                    version,
                    method: DetectionMethod::Explicit,
                    ignored_declaration: None,
                };
            }
            Ok(version) => {
                warn!(%version, "declared version is not registered, inferring from keys");
                ignored_declaration = Some(IgnoredDeclaration::Unregistered);
            }
            Err(_) => {
                warn!(declared, "declared version is malformed, inferring from keys");
                ignored_declaration = Some(IgnoredDeclaration::Malformed);
            }
        }
    }

    let has = |key: &str| attributes.contains_key(key);

    // (version, optional matches, unmatched optional)
    let mut best: Option<(FormatVersion, usize, usize)> = None;
    for schema in registry.schemas_descending() {
        if !schema.required_satisfied(has) {
            continue;
        }
        let matches = schema.optional_matches(has);
        let unmatched = schema.optional_keys.len() - matches;

        let better = match best {
            None => true,
            Some((_, best_matches, best_unmatched)) => {
                matches > best_matches || (matches == best_matches && unmatched < best_unmatched)
            }
        };
        if better {
            best = Some((schema.version, matches, unmatched));
        }
    }

    let detection = match best {
        Some((version, optional_matches, unmatched_optional)) => Detection {
            version,
            method: DetectionMethod::Scored {
                optional_matches,
                unmatched_optional,
            },
            ignored_declaration,
        },
        None => Detection {
            version: FALLBACK_VERSION,
            method: DetectionMethod::Fallback,
            ignored_declaration,
        },
    };
    debug!(version = %detection.version, method = ?detection.method, "detected version");
    detection
}
