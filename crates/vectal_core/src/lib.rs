//! Core domain logic for the Vectal productivity backend.
//!
//! Two pure components carry the real logic: recurrence computation for
//! repeating tasks and document text processing for notes. The storage,
//! repository and service layers around them are thin consumers.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod recurrence;
pub mod repo;
pub mod search;
pub mod service;
pub mod text;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::note::{LinkedEntities, LinkedNote, Note, NoteId, NoteVersion};
pub use model::task::{Task, TaskId, TaskStatus, TaskValidationError};
pub use recurrence::{
    generate_occurrences, next_occurrence, parse, serialize, Frequency, ParsedRecurrence, RawRule,
    RecurrenceSpec,
};
pub use repo::note_repo::{NoteListQuery, NoteRepository, SqliteNoteRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use search::fts::{
    search_notes, FtsResult, NoteSearchHit, NoteSearchPage, NoteSearchQuery, SearchError,
};
pub use service::note_service::{
    NewNote, NoteFilter, NoteService, NoteServiceError, NoteSummary, NoteUpdate, NotesListResult,
};
pub use service::task_service::{NewTask, TaskService, TaskServiceError};
pub use text::{
    extract_highlights, generate_preview, record_version_on_change, render_to_html,
    DocumentVersion, VersionBump,
};

/// Minimal health check for callers linking the crate.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
