//! Line-level change reports between two documents

use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::fmt;

use crate::codec::serialize;
use crate::document::Document;

/// A single changed line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", content = "line", rename_all = "lowercase")]
pub enum LineChange {
    Removed(String),
    Added(String),
}

/// Changes between two serialized documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentDiff {
    pub changes: Vec<LineChange>,
}

impl DocumentDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn added(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().filter_map(|c| match c {
            LineChange::Added(line) => Some(line.as_str()),
            LineChange::Removed(_) => None,
        })
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().filter_map(|c| match c {
            LineChange::Removed(line) => Some(line.as_str()),
            LineChange::Added(_) => None,
        })
    }
}

/// Compare the serialized forms of two documents
pub fn diff(before: &Document, after: &Document) -> DocumentDiff {
    let old_text = serialize(before);
    let new_text = serialize(after);
    let text_diff = TextDiff::from_lines(&old_text, &new_text);

    let changes = text_diff
        .iter_all_changes()
        .filter_map(|change| {
            let line = change.value().trim_end_matches(['\r', '\n']).to_string();
            match change.tag() {
                ChangeTag::Delete => Some(LineChange::Removed(line)),
                ChangeTag::Insert => Some(LineChange::Added(line)),
                ChangeTag::Equal => None,
            }
        })
        .collect();

    DocumentDiff { changes }
}

impl fmt::Display for DocumentDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for change in &self.changes {
            match change {
                LineChange::Removed(line) => writeln!(f, "-{}", line)?,
                LineChange::Added(line) => writeln!(f, "+{}", line)?,
            }
        }
        Ok(())
    }
}
