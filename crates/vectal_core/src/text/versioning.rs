//! Append-only version bookkeeping for document content.
//!
//! # Invariants
//! - A snapshot is produced only when content differs by exact string
//!   comparison.
//! - The snapshot carries the superseded version number and the content and
//!   timestamp it had; the live counter then moves one past it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable snapshot of prior document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVersion {
    /// Version number this content had while it was live. Starts at 1.
    pub version: u32,
    pub content: String,
    /// When this content was last written.
    pub updated_at: DateTime<Utc>,
    /// Identifier of the editor who replaced this content.
    pub updated_by: String,
}

/// Read access to a document that keeps a version counter.
pub trait VersionedDocument {
    fn content(&self) -> &str;
    fn current_version(&self) -> u32;
    fn updated_at(&self) -> DateTime<Utc>;
}

/// Outcome of [`record_version_on_change`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBump {
    /// Snapshot to append to history, if content changed.
    pub snapshot: Option<DocumentVersion>,
    /// Counter value the document should carry after the update.
    pub next_version: u32,
}

/// Decides whether replacing content with `new_content` creates history.
pub fn record_version_on_change<D: VersionedDocument + ?Sized>(
    document: &D,
    new_content: &str,
    editor: &str,
) -> VersionBump {
    let current = document.current_version();
    if document.content() == new_content {
        return VersionBump {
            snapshot: None,
            next_version: current,
        };
    }

    VersionBump {
        snapshot: Some(DocumentVersion {
            version: current,
            content: document.content().to_string(),
            updated_at: document.updated_at(),
            updated_by: editor.to_string(),
        }),
        next_version: current.saturating_add(1),
    }
}
