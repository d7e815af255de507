//! Per-version schema records and attribute mappings

use crate::document::Attributes;
use crate::version::FormatVersion;

/// Value transform applied when an attribute is renamed across a hop.
///
/// Receives the attribute value and the full attribute map of the document
/// being migrated (before the hop), and returns the new value.
pub type Transform = fn(&str, &Attributes) -> String;

/// Direction of a single migration hop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upgrade,
    Downgrade,
}

/// A rename (and optional value transform) of one attribute across a hop
#[derive(Clone, Copy)]
pub struct AttributeMapping {
    /// Key in the document before the hop
    pub source: &'static str,
    /// Key in the document after the hop
    pub target: &'static str,
    /// Optional value rewrite
    pub transform: Option<Transform>,
}

impl AttributeMapping {
    /// Plain rename
    pub const fn rename(source: &'static str, target: &'static str) -> Self {
        Self {
            source,
            target,
            transform: None,
        }
    }

    /// Rename with a value transform
    pub const fn transform(source: &'static str, target: &'static str, transform: Transform) -> Self {
        Self {
            source,
            target,
            transform: Some(transform),
        }
    }

    /// Produce the migrated value
    pub fn apply(&self, value: &str, attributes: &Attributes) -> String {
        match self.transform {
            Some(transform) => transform(value, attributes),
            None => value.to_string(),
        }
    }
}

impl std::fmt::Debug for AttributeMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeMapping")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Declaration of one format version.
///
/// The mapping tables describe how a document is rewritten when a hop
/// *arrives* at this version: `upgrade_map` when coming from the version
/// directly below, `downgrade_map` when coming from the version directly
/// above. Neither table reaches more than one hop.
#[derive(Debug, Clone, Copy)]
pub struct VersionSchema {
    pub version: FormatVersion,
    pub required_keys: &'static [&'static str],
    pub optional_keys: &'static [&'static str],
    /// Tried in order; the first present key wins
    pub primary_audio_keys: &'static [&'static str],
    pub upgrade_map: &'static [AttributeMapping],
    pub downgrade_map: &'static [AttributeMapping],
}

impl VersionSchema {
    /// Mapping table used when a hop in `direction` lands on this schema
    pub fn mappings(&self, direction: Direction) -> &'static [AttributeMapping] {
        match direction {
            Direction::Upgrade => self.upgrade_map,
            Direction::Downgrade => self.downgrade_map,
        }
    }

    /// Find the mapping for `key` in the given direction
    pub fn mapping_for(&self, direction: Direction, key: &str) -> Option<&'static AttributeMapping> {
        self.mappings(direction).iter().find(|m| m.source == key)
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.required_keys.iter().any(|k| *k == key)
    }

    pub fn is_optional(&self, key: &str) -> bool {
        self.optional_keys.iter().any(|k| *k == key)
    }

    /// Whether the key is declared by this version at all
    pub fn declares(&self, key: &str) -> bool {
        key == crate::document::VERSION_KEY || self.is_required(key) || self.is_optional(key)
    }

    /// True if `has` reports every required key as present
    pub fn required_satisfied(&self, mut has: impl FnMut(&str) -> bool) -> bool {
        self.required_keys.iter().all(|&k| has(k))
    }

    /// Number of optional keys satisfied by `has`
    pub fn optional_matches(&self, mut has: impl FnMut(&str) -> bool) -> usize {
        self.optional_keys.iter().filter(|&&k| has(k)).count()
    }
}
