//! Text codec for song files
//!
//! ```text
//! #TITLE:Dancing Queen
//! #ARTIST:ABBA
//! #MP3:ABBA - Dancing Queen.mp3
//! #BPM:200
//! : 0 4 59 You
//! ...
//! E
//! ```
//!
//! The header is the leading run of `#KEY:VALUE` lines (blank lines
//! allowed). The first other line starts the body. A line consisting of
//! `E` ends the file; nothing after it is kept.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::detect::{self, Detection};
use crate::document::{normalize_key, Attributes, Document};
use crate::error::{FormatError, Result};
use crate::registry::VersionRegistry;

const BOM: char = '\u{feff}';
const END_MARKER: &str = "E";

/// Non-fatal oddities found while parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// A header key appeared again; the first value was kept
    DuplicateKey { key: String, line: usize },
    /// A header line had no ':'; the key was kept with an empty value
    MissingSeparator { key: String, line: usize },
    /// A `VERSION` header could not be used for detection
    IgnoredVersion { value: String },
}

/// A parsed document together with everything the parser tolerated
#[derive(Debug, Clone)]
pub struct Parsed {
    pub document: Document,
    pub detection: Detection,
    pub warnings: Vec<ParseWarning>,
}

/// Line terminator used when writing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Serialization options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WriteOptions {
    #[serde(default)]
    pub line_ending: LineEnding,
    /// Append the `E` end-of-song line
    #[serde(default)]
    pub end_marker: bool,
}

/// Parse raw file bytes. Fails only if the bytes are not valid UTF-8.
pub fn parse(bytes: &[u8]) -> Result<Document> {
    Ok(parse_bytes_with_report(bytes)?.document)
}

/// [`parse_with_report`] over raw file bytes
pub fn parse_bytes_with_report(bytes: &[u8]) -> Result<Parsed> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| FormatError::UnreadableSource(e.to_string()))?;
    Ok(parse_with_report(text))
}

/// Parse decoded text. Never fails.
pub fn parse_str(text: &str) -> Document {
    parse_with_report(text).document
}

/// Parse decoded text, reporting detection details and warnings
pub fn parse_with_report(text: &str) -> Parsed {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut attributes = Attributes::new();
    let mut body = Vec::new();
    let mut warnings = Vec::new();
    let mut in_header = true;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let line_no = index + 1;

        if line == END_MARKER {
            break;
        }

        if in_header {
            if line.is_empty() {
                continue;
            }
            if let Some(entry) = line.strip_prefix('#') {
                let (key, value) = match entry.split_once(':') {
                    Some((key, value)) => (normalize_key(key), value.trim()),
                    None => {
                        let key = normalize_key(entry);
                        warn!(%key, line = line_no, "header line without ':'");
                        warnings.push(ParseWarning::MissingSeparator {
                            key: key.clone(),
                            line: line_no,
                        });
                        (key, "")
                    }
                };

                if attributes.contains_key(&key) {
                    warn!(%key, line = line_no, "duplicate header key, keeping the first value");
                    warnings.push(ParseWarning::DuplicateKey { key, line: line_no });
                    continue;
                }

                let value = (!value.is_empty()).then(|| value.to_string());
                attributes.insert(key, value);
                continue;
            }
            in_header = false;
        }

        body.push(line.to_string());
    }

    let detection = detect::detect(VersionRegistry::global(), &attributes);
    if detection.ignored_declaration.is_some() {
        let value = attributes
            .get(crate::document::VERSION_KEY)
            .cloned()
            .flatten()
            .unwrap_or_default();
        warnings.push(ParseWarning::IgnoredVersion { value });
    }

    Parsed {
        document: Document::new(detection.version, attributes, body),
        detection,
        warnings,
    }
}

/// Render a document with default options
pub fn serialize(document: &Document) -> String {
    serialize_with(document, &WriteOptions::default())
}

/// Render a document: one `#KEY:VALUE` line per attribute in order, then the
/// body. No reordering or filtering happens here.
pub fn serialize_with(document: &Document, options: &WriteOptions) -> String {
    let eol = options.line_ending.as_str();
    let mut out = String::new();

    for (key, value) in document.attributes() {
        out.push('#');
        out.push_str(key);
        out.push(':');
        out.push_str(value.as_deref().unwrap_or_default());
        out.push_str(eol);
    }
    for line in document.body() {
        out.push_str(line);
        out.push_str(eol);
    }
    if options.end_marker {
        out.push_str(END_MARKER);
        out.push_str(eol);
    }

    out
}

/// Render a document to bytes (UTF-8, no BOM)
pub fn to_bytes(document: &Document, options: &WriteOptions) -> Vec<u8> {
    serialize_with(document, options).into_bytes()
}
