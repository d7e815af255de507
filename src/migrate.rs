//! Stepwise version migration
//!
//! A migration walks the lineage one hop at a time. Each hop rebuilds the
//! header using only the mapping table of the version it lands on, so keys
//! retired more than one hop ago are never chased. Migrations are lossy:
//! upgrading and then downgrading need not reproduce the original document.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::document::{Attributes, Document, VERSION_KEY};
use crate::error::{Boundary, FormatError, Result};
use crate::registry::VersionRegistry;
use crate::schema::Direction;
use crate::version::FormatVersion;

/// One completed hop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub from: FormatVersion,
    pub to: FormatVersion,
    pub direction: Direction,
}

/// How a `set_version` walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationStatus {
    /// The requested version was reached
    Reached,
    /// The walk hit the end of the lineage before the requested version
    Stopped { boundary: Boundary },
}

/// Result of a `set_version` walk
#[derive(Debug, Clone)]
pub struct Migration {
    pub document: Document,
    pub target: FormatVersion,
    pub hops: Vec<Hop>,
    pub status: MigrationStatus,
}

impl Migration {
    pub fn reached(&self) -> bool {
        self.status == MigrationStatus::Reached
    }
}

/// Move a document one version up
pub fn upgrade(document: &Document) -> Result<Document> {
    hop(VersionRegistry::global(), document, Direction::Upgrade)
}

/// Move a document one version down
pub fn downgrade(document: &Document) -> Result<Document> {
    hop(VersionRegistry::global(), document, Direction::Downgrade)
}

/// Perform a single hop in `direction` against `registry`
pub fn hop(registry: &VersionRegistry, document: &Document, direction: Direction) -> Result<Document> {
    let from = document.version();
    registry.schema_for(from)?;

    let to = match direction {
        Direction::Upgrade => registry.neighbor_above(from)?,
        Direction::Downgrade => registry.neighbor_below(from)?,
    };
    let target = registry.schema_for(to)?;
    let source = document.attributes();

    let mut attributes = Attributes::with_capacity(source.len() + 1);
    for (key, value) in source {
        let Some(mapping) = target.mapping_for(direction, key) else {
            attributes.insert(key.clone(), value.clone());
            continue;
        };

        // A key carried directly under the target name wins over a rename
        if mapping.target != key.as_str() && source.contains_key(mapping.target) {
            warn!(
                from = %key,
                to = mapping.target,
                "dropping renamed attribute, target key already present"
            );
            continue;
        }

        let value = value.as_deref().map(|v| mapping.apply(v, source));
        debug!(from = %key, to = mapping.target, "mapped attribute");
        attributes.insert(mapping.target.to_string(), value);
    }
    attributes.insert(VERSION_KEY.to_string(), Some(to.to_string()));

    debug!(%from, %to, ?direction, "migrated one hop");

    Ok(Document::new(to, attributes, document.body().to_vec()))
}

/// Walk the document to `target` one hop at a time.
///
/// A target beyond either end of the lineage stops at that end and reports
/// [`MigrationStatus::Stopped`]; the document is returned in the last state
/// reached. A target inside the lineage that is not registered is an
/// [`FormatError::UnknownVersion`].
pub fn set_version(document: Document, target: FormatVersion) -> Result<Migration> {
    set_version_in(VersionRegistry::global(), document, target)
}

/// [`set_version`] against a specific registry
pub fn set_version_in(
    registry: &VersionRegistry,
    document: Document,
    target: FormatVersion,
) -> Result<Migration> {
    let start = document.version();
    registry.schema_for(start)?;

    let inside_lineage = match (registry.oldest(), registry.latest()) {
        (Some(oldest), Some(latest)) => target >= oldest && target <= latest,
        _ => false,
    };
    if inside_lineage && !registry.contains(target) {
        return Err(FormatError::UnknownVersion(target));
    }

    let direction = if target > start {
        Direction::Upgrade
    } else {
        Direction::Downgrade
    };

    let mut document = document;
    let mut hops = Vec::new();
    let mut status = MigrationStatus::Reached;

    while document.version() != target {
        match hop(registry, &document, direction) {
            Ok(next) => {
                hops.push(Hop {
                    from: document.version(),
                    to: next.version(),
                    direction,
                });
                document = next;
            }
            Err(FormatError::VersionChange { version, boundary }) => {
                info!(%version, %target, %boundary, "migration stopped at the end of the lineage");
                status = MigrationStatus::Stopped { boundary };
                break;
            }
            Err(e) => return Err(e),
        }
    }

    if status == MigrationStatus::Reached {
        info!(from = %start, to = %target, hops = hops.len(), "migration complete");
    }

    Ok(Migration {
        document,
        target,
        hops,
        status,
    })
}
