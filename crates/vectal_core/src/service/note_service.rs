//! Note use-case service.
//!
//! # Responsibility
//! - Provide create/get/list/update/delete APIs for notes.
//! - Keep version history in step with content edits.
//! - Shape list summaries (preview, word count) and render markdown.
//! - Resolve note links to tasks and other notes.
//!
//! # Invariants
//! - An update that changes content appends exactly one version snapshot
//!   and bumps `current_version` by one; other updates append nothing.
//! - Note titles are 1..=500 chars after trimming.
//! - All reads and writes are scoped to the calling user, including the
//!   titles resolved for linked notes.

use crate::config::CoreConfig;
use crate::model::note::{LinkedEntities, Note, NoteId, NoteVersion};
use crate::model::task::TaskId;
use crate::repo::note_repo::{normalize_tags, NoteListQuery, NoteRepository};
use crate::repo::{utc_now_millis, RepoError, RepoResult};
use crate::text::preview::{generate_preview, word_count};
use crate::text::render::{CmarkRenderer, MarkdownRenderer};
use chrono::{DateTime, Utc};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const NOTE_TITLE_MAX_CHARS: usize = 500;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    InvalidTitle(String),
    NoteNotFound(NoteId),
    Repo(RepoError),
    /// Write succeeded but read-back disagreed.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle(message) => write!(f, "invalid note title: {message}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Input for [`NoteService::create_note`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub project_id: Option<String>,
    pub tags: Vec<String>,
    pub linked_tasks: Vec<TaskId>,
    pub linked_notes: Vec<NoteId>,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    /// `Some(None)` moves the note out of its project.
    pub project_id: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub linked_tasks: Option<Vec<TaskId>>,
    pub linked_notes: Option<Vec<NoteId>>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
}

/// Filters accepted by [`NoteService::list_notes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub project_id: Option<String>,
    /// Any-of match; empty disables the tag filter.
    pub tags: Vec<String>,
    pub is_pinned: Option<bool>,
    pub is_archived: bool,
}

/// List projection of one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    pub preview: String,
    pub word_count: usize,
    pub tags: Vec<String>,
    pub current_version: u32,
    pub is_pinned: bool,
    pub updated_at: DateTime<Utc>,
}

/// List result envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesListResult {
    /// Sorted by `updated_at DESC`.
    pub items: Vec<NoteSummary>,
    /// Page size actually used.
    pub applied_limit: u32,
    /// Notes matching the filter across all pages.
    pub total: u64,
}

/// Note service facade over a repository and a markdown renderer.
pub struct NoteService<R: NoteRepository, M: MarkdownRenderer = CmarkRenderer> {
    repo: R,
    renderer: M,
    config: CoreConfig,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service with default configuration.
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, CoreConfig::default())
    }

    pub fn with_config(repo: R, config: CoreConfig) -> Self {
        Self {
            repo,
            renderer: CmarkRenderer,
            config,
        }
    }
}

impl<R: NoteRepository, M: MarkdownRenderer> NoteService<R, M> {
    /// Swaps the markdown renderer.
    pub fn with_renderer<N: MarkdownRenderer>(self, renderer: N) -> NoteService<R, N> {
        NoteService {
            repo: self.repo,
            renderer,
            config: self.config,
        }
    }

    /// Creates a version-1 note owned by `user_id`.
    pub fn create_note(&self, user_id: &str, input: NewNote) -> Result<Note, NoteServiceError> {
        let title = validate_title(&input.title)?;
        let mut note = Note::new(user_id, title, input.content, utc_now_millis());
        note.project_id = input.project_id;
        note.tags = normalize_tags(&input.tags);
        note.set_links(&input.linked_tasks, &input.linked_notes);

        let id = self.repo.insert_note(&note)?;
        info!("event=note_create module=service status=ok note_id={id}");
        self.read_back(id, user_id, "created note not found in read-back")
    }

    /// Gets one note with its version history.
    pub fn get_note(&self, id: NoteId, user_id: &str) -> RepoResult<Option<Note>> {
        self.repo.get_note(id, user_id)
    }

    /// Lists note summaries, newest first.
    pub fn list_notes(
        &self,
        user_id: &str,
        filter: NoteFilter,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<NotesListResult, NoteServiceError> {
        let applied_limit = self.config.effective_notes_limit(limit);
        let query = NoteListQuery {
            user_id: user_id.to_string(),
            project_id: filter.project_id,
            tags: filter.tags,
            is_pinned: filter.is_pinned,
            is_archived: filter.is_archived,
            limit: applied_limit,
            offset,
        };
        let items = self
            .repo
            .list_notes(&query)?
            .iter()
            .map(|note| self.summarize(note))
            .collect();
        let total = self.repo.count_notes(&query)?;
        Ok(NotesListResult {
            items,
            applied_limit,
            total,
        })
    }

    /// Applies a partial update, recording history when content changes.
    pub fn update_note(
        &self,
        id: NoteId,
        user_id: &str,
        update: NoteUpdate,
    ) -> Result<Note, NoteServiceError> {
        let mut note = self
            .repo
            .get_note(id, user_id)?
            .ok_or(NoteServiceError::NoteNotFound(id))?;
        let now = utc_now_millis();

        if let Some(title) = update.title.as_deref() {
            note.title = validate_title(title)?;
        }
        let snapshot = match update.content {
            Some(content) => note.apply_content_update(content, user_id, now),
            None => {
                note.updated_at = now;
                None
            }
        };
        if let Some(project_id) = update.project_id {
            note.project_id = project_id;
        }
        if let Some(tags) = update.tags.as_deref() {
            note.tags = normalize_tags(tags);
        }
        if update.linked_tasks.is_some() || update.linked_notes.is_some() {
            let tasks = update.linked_tasks.unwrap_or_else(|| note.linked_tasks.clone());
            let notes = update.linked_notes.unwrap_or_else(|| note.linked_notes.clone());
            note.set_links(&tasks, &notes);
        }
        if let Some(is_pinned) = update.is_pinned {
            note.is_pinned = is_pinned;
        }
        if let Some(is_archived) = update.is_archived {
            note.is_archived = is_archived;
        }

        self.repo.save_note(&note, snapshot.as_ref())?;
        info!(
            "event=note_update module=service status=ok note_id={id} version={} versioned={}",
            note.current_version,
            snapshot.is_some()
        );
        self.read_back(id, user_id, "updated note not found in read-back")
    }

    /// Version history in insertion order.
    pub fn list_versions(&self, id: NoteId, user_id: &str) -> RepoResult<Vec<NoteVersion>> {
        self.repo.list_versions(id, user_id)
    }

    /// Linked task ids plus linked notes with their titles.
    ///
    /// Linked notes that were deleted or belong to someone else are left out.
    pub fn get_linked_entities(
        &self,
        id: NoteId,
        user_id: &str,
    ) -> Result<LinkedEntities, NoteServiceError> {
        let note = self
            .repo
            .get_note(id, user_id)?
            .ok_or(NoteServiceError::NoteNotFound(id))?;
        let notes = self.repo.linked_note_titles(&note.linked_notes, user_id)?;
        Ok(LinkedEntities {
            tasks: note.linked_tasks,
            notes,
        })
    }

    /// Deletes a note and its history.
    pub fn delete_note(&self, id: NoteId, user_id: &str) -> Result<(), NoteServiceError> {
        if !self.repo.delete_note(id, user_id)? {
            return Err(NoteServiceError::NoteNotFound(id));
        }
        info!("event=note_delete module=service status=ok note_id={id}");
        Ok(())
    }

    /// Renders markdown content to HTML.
    pub fn render_markdown(&self, content: &str) -> String {
        self.renderer.render(content)
    }

    fn summarize(&self, note: &Note) -> NoteSummary {
        NoteSummary {
            id: note.id,
            title: note.title.clone(),
            preview: generate_preview(&note.content, "", self.config.preview_max_length),
            word_count: word_count(&note.content),
            tags: note.tags.clone(),
            current_version: note.current_version,
            is_pinned: note.is_pinned,
            updated_at: note.updated_at,
        }
    }

    fn read_back(
        &self,
        id: NoteId,
        user_id: &str,
        details: &'static str,
    ) -> Result<Note, NoteServiceError> {
        self.repo
            .get_note(id, user_id)?
            .ok_or(NoteServiceError::InconsistentState(details))
    }
}

fn validate_title(title: &str) -> Result<String, NoteServiceError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(NoteServiceError::InvalidTitle(
            "title must not be blank".to_string(),
        ));
    }
    let chars = trimmed.chars().count();
    if chars > NOTE_TITLE_MAX_CHARS {
        return Err(NoteServiceError::InvalidTitle(format!(
            "title has {chars} chars; limit is {NOTE_TITLE_MAX_CHARS}"
        )));
    }
    Ok(trimmed.to_string())
}
