//! Note domain model.
//!
//! # Invariants
//! - `current_version` starts at 1 and only grows.
//! - `versions` is ordered by insertion and never rewritten.
//! - Content changes go through [`Note::apply_content_update`].
//! - Link lists keep first-seen order, hold no duplicates and never point a
//!   note at itself.

use crate::model::task::TaskId;
use crate::text::versioning::{record_version_on_change, DocumentVersion, VersionedDocument};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for notes.
pub type NoteId = Uuid;

/// Historical snapshot of note content.
pub type NoteVersion = DocumentVersion;

/// Markdown note owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub user_id: String,
    pub project_id: Option<String>,
    pub title: String,
    /// Markdown body.
    pub content: String,
    /// Normalized lowercase tags, sorted.
    pub tags: Vec<String>,
    pub linked_tasks: Vec<TaskId>,
    pub linked_notes: Vec<NoteId>,
    pub versions: Vec<NoteVersion>,
    pub current_version: u32,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Creates a version-1 note with a generated ID.
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            project_id: None,
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            linked_tasks: Vec::new(),
            linked_notes: Vec::new(),
            versions: Vec::new(),
            current_version: 1,
            is_pinned: false,
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces content, snapshotting the old content when it differs.
    ///
    /// Returns the appended snapshot, if any. `updated_at` is refreshed in
    /// both cases.
    pub fn apply_content_update(
        &mut self,
        new_content: impl Into<String>,
        editor: &str,
        now: DateTime<Utc>,
    ) -> Option<NoteVersion> {
        let new_content = new_content.into();
        let bump = record_version_on_change(self, &new_content, editor);
        if let Some(snapshot) = bump.snapshot.as_ref() {
            self.versions.push(snapshot.clone());
        }
        self.current_version = bump.next_version;
        self.content = new_content;
        self.updated_at = now;
        bump.snapshot
    }

    /// Replaces both link lists, applying the link invariants.
    pub fn set_links(&mut self, tasks: &[TaskId], notes: &[NoteId]) {
        self.linked_tasks = unique_in_order(tasks.iter().copied());
        let own_id = self.id;
        self.linked_notes = unique_in_order(notes.iter().copied().filter(|id| *id != own_id));
    }
}

/// Linked note resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedNote {
    pub id: NoteId,
    pub title: String,
}

/// Everything a note links to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedEntities {
    pub tasks: Vec<TaskId>,
    pub notes: Vec<LinkedNote>,
}

fn unique_in_order(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = Vec::new();
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

impl VersionedDocument for Note {
    fn content(&self) -> &str {
        &self.content
    }

    fn current_version(&self) -> u32 {
        self.current_version
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
