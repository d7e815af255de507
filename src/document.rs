//! In-memory song document

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::check::CheckReport;
use crate::error::{FormatError, Result};
use crate::migrate::{self, Migration};
use crate::registry::VersionRegistry;
use crate::schema::VersionSchema;
use crate::version::FormatVersion;

/// Header attributes in file order. `None` means the key is present with an
/// empty value.
pub type Attributes = IndexMap<String, Option<String>>;

/// Header key carrying an explicit version declaration
pub const VERSION_KEY: &str = "VERSION";

/// Header key order recommended by the format documentation
pub const CANONICAL_ORDER: &[&str] = &[
    "VERSION", "TITLE", "ARTIST", "MP3", "AUDIO", "AUDIOURL", "BPM", "GAP", "COVER",
    "COVERURL", "BACKGROUND", "BACKGROUNDURL", "VIDEO", "VIDEOURL", "VIDEOGAP", "VOCALS",
    "INSTRUMENTAL", "GENRE", "TAGS", "EDITION", "CREATOR", "LANGUAGE", "YEAR", "START", "END",
    "PREVIEWSTART", "MEDLEYSTARTBEAT", "MEDLEYENDBEAT", "MEDLEYSTART", "MEDLEYEND",
    "CALCMEDLEY", "P1", "P2", "PROVIDEDBY", "COMMENT",
];

/// Canonical form of a header key
pub fn normalize_key(key: &str) -> String {
    key.trim().to_uppercase()
}

/// Normalize `key` and make sure it survives a `#KEY:VALUE` line
fn header_key(key: &str) -> Result<String> {
    let normalized = normalize_key(key);
    let reason = if normalized.is_empty() {
        "key is empty"
    } else if normalized.contains(':') {
        "key contains ':'"
    } else if normalized.contains(['\r', '\n']) {
        "key contains a line break"
    } else {
        return Ok(normalized);
    };
    Err(FormatError::InvalidAttribute {
        key: key.to_string(),
        reason,
    })
}

/// One song file: version, ordered header and body lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    version: FormatVersion,
    attributes: Attributes,
    body: Vec<String>,
}

impl Document {
    /// Create a document from already-normalized parts
    pub fn new(version: FormatVersion, attributes: Attributes, body: Vec<String>) -> Self {
        Self {
            version,
            attributes,
            body,
        }
    }

    /// Empty document at the given version
    pub fn empty(version: FormatVersion) -> Self {
        Self::new(version, Attributes::new(), Vec::new())
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    pub(crate) fn set_version_id(&mut self, version: FormatVersion) {
        self.version = version;
    }

    /// Schema governing this document
    pub fn schema(&self) -> Result<&'static VersionSchema> {
        VersionRegistry::global().schema_for(self.version)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn body(&self) -> &[String] {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Vec<String> {
        &mut self.body
    }

    /// Consume the document into its parts
    pub fn into_parts(self) -> (FormatVersion, Attributes, Vec<String>) {
        (self.version, self.attributes, self.body)
    }

    /// Value of an attribute. Returns `None` both for a missing key and for a
    /// key with an empty value; use [`Document::contains`] to tell them apart.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(&normalize_key(key))
            .and_then(|v| v.as_deref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(&normalize_key(key))
    }

    /// Set an attribute. Existing keys keep their position, new keys are
    /// appended. The value is trimmed the same way the parser trims it, and
    /// an empty value is stored as present-but-empty.
    ///
    /// Keys that are empty or contain `:` or a line break, and values that
    /// contain a line break, are rejected with
    /// [`FormatError::InvalidAttribute`]. Written out, they would read back
    /// as different keys or spill into the body.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let key = header_key(key)?;
        let value = value.into();
        if value.contains(['\r', '\n']) {
            return Err(FormatError::InvalidAttribute {
                key,
                reason: "value contains a line break",
            });
        }
        let value = value.trim();
        self.attributes
            .insert(key, (!value.is_empty()).then(|| value.to_string()));
        Ok(())
    }

    /// Set an attribute to present-but-empty
    pub fn set_empty(&mut self, key: &str) -> Result<()> {
        let key = header_key(key)?;
        self.attributes.insert(key, None);
        Ok(())
    }

    /// Remove an attribute, preserving the order of the rest
    pub fn remove(&mut self, key: &str) -> Option<Option<String>> {
        self.attributes.shift_remove(&normalize_key(key))
    }

    /// First present key from the active schema's primary audio preference
    pub fn primary_audio_reference(&self) -> Option<&str> {
        let keys: &[&str] = match self.schema() {
            Ok(schema) => schema.primary_audio_keys,
            Err(_) => &["MP3", "AUDIO"],
        };
        keys.iter().find_map(|k| self.get(k))
    }

    /// "ARTIST - TITLE"
    pub fn common_name(&self) -> String {
        format!(
            "{} - {}",
            self.get("ARTIST").unwrap_or_default(),
            self.get("TITLE").unwrap_or_default()
        )
    }

    /// Move the attribute at `from` to index `to`
    pub fn move_attribute(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.attributes.len();
        for index in [from, to] {
            if index >= len {
                return Err(FormatError::InvalidIndex { index, len });
            }
        }
        self.attributes.move_index(from, to);
        Ok(())
    }

    /// Put the listed keys first, in the given order. Keys not listed keep
    /// their relative order after them.
    pub fn reorder<S: AsRef<str>>(&mut self, order: &[S]) {
        let mut target = 0;
        for key in order {
            if let Some(index) = self.attributes.get_index_of(&normalize_key(key.as_ref())) {
                if index >= target {
                    self.attributes.move_index(index, target);
                    target += 1;
                }
            }
        }
    }

    /// Reorder the header into the canonical key order
    pub fn reorder_canonical(&mut self) {
        self.reorder(CANONICAL_ORDER);
    }

    /// Check the header against the active schema
    pub fn check(&self) -> CheckReport {
        CheckReport::for_document(self)
    }

    /// Migrate this document to `target`, see [`migrate::set_version`]
    pub fn migrate_to(&self, target: FormatVersion) -> Result<Migration> {
        migrate::set_version(self.clone(), target)
    }
}

// Header order is part of the document, IndexMap's own equality ignores it.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.body == other.body
            && self.attributes.iter().eq(other.attributes.iter())
    }
}

impl Eq for Document {}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        let mut d = Document::empty(FormatVersion::new(1, 0, 0));
        d.set("title", "Dancing Queen").unwrap();
        d.set("ARTIST", "ABBA").unwrap();
        d.set("mp3", "song.mp3").unwrap();
        d.set("YEAR", "1976").unwrap();
        d
    }

    fn keys(d: &Document) -> Vec<&str> {
        d.attributes().keys().map(String::as_str).collect()
    }

    #[test]
    fn test_case_insensitive_access() {
        let d = doc();
        assert_eq!(d.get("Title"), Some("Dancing Queen"));
        assert!(d.contains("mp3"));
        assert_eq!(d.common_name(), "ABBA - Dancing Queen");
    }

    #[test]
    fn test_empty_value_is_distinct_from_missing() {
        let mut d = doc();
        d.set("GENRE", "").unwrap();
        assert!(d.contains("GENRE"));
        assert_eq!(d.get("GENRE"), None);
        assert_eq!(d.attributes().get("GENRE"), Some(&None));
        assert!(!d.contains("EDITION"));
    }

    #[test]
    fn test_set_keeps_position() {
        let mut d = doc();
        d.set("ARTIST", "Bon Jovi").unwrap();
        assert_eq!(keys(&d), ["TITLE", "ARTIST", "MP3", "YEAR"]);
        assert_eq!(d.get("artist"), Some("Bon Jovi"));
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut d = doc();
        assert_eq!(d.remove("artist"), Some(Some("ABBA".to_string())));
        assert_eq!(keys(&d), ["TITLE", "MP3", "YEAR"]);
        assert_eq!(d.remove("artist"), None);
    }

    #[test]
    fn test_equality_respects_order() {
        let a = doc();
        let mut b = doc();
        assert_eq!(a, b);
        b.move_attribute(0, 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_move_attribute() {
        let mut d = doc();
        d.move_attribute(3, 0).unwrap();
        assert_eq!(keys(&d), ["YEAR", "TITLE", "ARTIST", "MP3"]);
        assert!(matches!(
            d.move_attribute(0, 4),
            Err(FormatError::InvalidIndex { index: 4, len: 4 })
        ));
    }

    #[test]
    fn test_reorder_canonical() {
        let mut d = doc();
        d.set("CUSTOM", "x").unwrap();
        d.set("VERSION", "1.0.0").unwrap();
        d.reorder_canonical();
        assert_eq!(keys(&d), ["VERSION", "TITLE", "ARTIST", "MP3", "YEAR", "CUSTOM"]);
    }

    #[test]
    fn test_reorder_custom_order() {
        let mut d = doc();
        d.reorder(&["artist", "title"]);
        assert_eq!(keys(&d), ["ARTIST", "TITLE", "MP3", "YEAR"]);
    }

    #[test]
    fn test_primary_audio_reference() {
        let mut d = doc();
        assert_eq!(d.primary_audio_reference(), Some("song.mp3"));

        // MP3 is tried before AUDIO while both keys exist
        d.set_version_id(FormatVersion::new(1, 1, 0));
        d.set("AUDIO", "song.ogg").unwrap();
        assert_eq!(d.primary_audio_reference(), Some("song.mp3"));

        d.set_version_id(FormatVersion::new(2, 0, 0));
        d.remove("MP3");
        assert_eq!(d.primary_audio_reference(), Some("song.ogg"));
        d.remove("AUDIO");
        assert_eq!(d.primary_audio_reference(), None);
    }

    #[test]
    fn test_set_trims_values() {
        let mut d = doc();
        d.set("GENRE", " Pop ").unwrap();
        assert_eq!(d.get("GENRE"), Some("Pop"));
        d.set("EDITION", "   ").unwrap();
        assert_eq!(d.attributes().get("EDITION"), Some(&None));
        d.set_empty(" language ").unwrap();
        assert_eq!(d.attributes().get("LANGUAGE"), Some(&None));
    }

    #[test]
    fn test_set_rejects_unwritable_attributes() {
        let mut d = doc();
        let before = d.clone();

        for (key, value) in [
            ("COMMENT", "first\nsecond"),
            ("COMMENT", "first\r"),
            ("A:B", "v"),
            ("", "v"),
            ("TWO\nLINES", "v"),
        ] {
            let err = d.set(key, value).unwrap_err();
            assert!(matches!(err, FormatError::InvalidAttribute { .. }), "{key:?} {value:?}");
        }
        assert!(matches!(d.set_empty("A:B"), Err(FormatError::InvalidAttribute { .. })));
        assert_eq!(d, before);
    }
}
