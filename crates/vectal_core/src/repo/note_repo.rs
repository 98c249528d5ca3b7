//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes with their tags, links and append-only version history.
//! - Scope every read and write to the owning user.
//!
//! # Invariants
//! - Note row, tag set, link set and new version rows are written in one
//!   transaction.
//! - Existing `note_versions` rows are never updated or deleted, except by
//!   cascade when the note itself is deleted.
//! - Tags are normalized to trimmed lowercase and deduplicated.
//! - Lists are ordered by `updated_at DESC, uuid ASC`.
//! - Links are stored by id only; resolving a linked note goes through the
//!   owner filter, so another user's note never surfaces.

use crate::model::note::{LinkedNote, Note, NoteId, NoteVersion};
use crate::repo::{epoch_ms_to_utc, int_to_bool, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use std::collections::BTreeSet;
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    user_id,
    project_id,
    title,
    content,
    current_version,
    is_pinned,
    is_archived,
    created_at,
    updated_at
FROM notes";

/// Filters for listing one user's notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    pub user_id: String,
    pub project_id: Option<String>,
    /// Matches notes carrying any of these tags; empty means no tag filter.
    pub tags: Vec<String>,
    pub is_pinned: Option<bool>,
    pub is_archived: bool,
    pub limit: u32,
    pub offset: u32,
}

/// Repository interface for note persistence.
pub trait NoteRepository {
    /// Inserts a new note with its tags and any existing history.
    fn insert_note(&self, note: &Note) -> RepoResult<NoteId>;
    /// Writes all mutable note fields and appends `new_version` if given.
    fn save_note(&self, note: &Note, new_version: Option<&NoteVersion>) -> RepoResult<()>;
    fn get_note(&self, id: NoteId, user_id: &str) -> RepoResult<Option<Note>>;
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    /// Rows matching the query filters, ignoring limit and offset.
    fn count_notes(&self, query: &NoteListQuery) -> RepoResult<u64>;
    /// Titles for the given ids that `user_id` owns, in input order.
    fn linked_note_titles(&self, ids: &[NoteId], user_id: &str) -> RepoResult<Vec<LinkedNote>>;
    /// Version history in insertion order; empty when the note is missing.
    fn list_versions(&self, id: NoteId, user_id: &str) -> RepoResult<Vec<NoteVersion>>;
    /// Returns whether a note was deleted.
    fn delete_note(&self, id: NoteId, user_id: &str) -> RepoResult<bool>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a migrated connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, note: &Note) -> RepoResult<NoteId> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO notes (
                uuid,
                user_id,
                project_id,
                title,
                content,
                current_version,
                is_pinned,
                is_archived,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                note.id.to_string(),
                note.user_id.as_str(),
                note.project_id.as_deref(),
                note.title.as_str(),
                note.content.as_str(),
                note.current_version,
                note.is_pinned,
                note.is_archived,
                note.created_at.timestamp_millis(),
                note.updated_at.timestamp_millis(),
            ],
        )?;
        replace_tags_in_tx(&tx, note.id, &note.tags)?;
        replace_links_in_tx(&tx, note)?;
        for version in &note.versions {
            insert_version_in_tx(&tx, note.id, version)?;
        }
        tx.commit()?;
        Ok(note.id)
    }

    fn save_note(&self, note: &Note, new_version: Option<&NoteVersion>) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE notes
             SET
                project_id = ?3,
                title = ?4,
                content = ?5,
                current_version = ?6,
                is_pinned = ?7,
                is_archived = ?8,
                updated_at = ?9
             WHERE uuid = ?1
               AND user_id = ?2;",
            params![
                note.id.to_string(),
                note.user_id.as_str(),
                note.project_id.as_deref(),
                note.title.as_str(),
                note.content.as_str(),
                note.current_version,
                note.is_pinned,
                note.is_archived,
                note.updated_at.timestamp_millis(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(note.id));
        }

        replace_tags_in_tx(&tx, note.id, &note.tags)?;
        replace_links_in_tx(&tx, note)?;
        if let Some(version) = new_version {
            insert_version_in_tx(&tx, note.id, version)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_note(&self, id: NoteId, user_id: &str) -> RepoResult<Option<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE uuid = ?1
               AND user_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![id.to_string(), user_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(self.hydrate(row)?)),
            None => Ok(None),
        }
    }

    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let (filter_sql, mut bind_values) = filter_clause(query);
        let sql = format!(
            "{NOTE_SELECT_SQL}{filter_sql} ORDER BY updated_at DESC, uuid ASC LIMIT ? OFFSET ?"
        );
        bind_values.push(Value::Integer(i64::from(query.limit)));
        bind_values.push(Value::Integer(i64::from(query.offset)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(self.hydrate(row)?);
        }
        Ok(notes)
    }

    fn count_notes(&self, query: &NoteListQuery) -> RepoResult<u64> {
        let (filter_sql, bind_values) = filter_clause(query);
        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM notes{filter_sql}"),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    fn linked_note_titles(&self, ids: &[NoteId], user_id: &str) -> RepoResult<Vec<LinkedNote>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title FROM notes WHERE uuid = ?1 AND user_id = ?2;")?;
        let mut linked = Vec::with_capacity(ids.len());
        for id in ids {
            let mut rows = stmt.query(params![id.to_string(), user_id])?;
            if let Some(row) = rows.next()? {
                linked.push(LinkedNote {
                    id: *id,
                    title: row.get(0)?,
                });
            }
        }
        Ok(linked)
    }

    fn list_versions(&self, id: NoteId, user_id: &str) -> RepoResult<Vec<NoteVersion>> {
        let owned: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM notes WHERE uuid = ?1 AND user_id = ?2);",
            params![id.to_string(), user_id],
            |row| row.get(0),
        )?;
        if owned == 0 {
            return Ok(Vec::new());
        }
        load_versions(self.conn, &id.to_string())
    }

    fn delete_note(&self, id: NoteId, user_id: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM notes WHERE uuid = ?1 AND user_id = ?2;",
            params![id.to_string(), user_id],
        )?;
        Ok(changed > 0)
    }
}

impl SqliteNoteRepository<'_> {
    fn hydrate(&self, row: &Row<'_>) -> RepoResult<Note> {
        let uuid_text: String = row.get("uuid")?;
        let current_version: u32 = row.get("current_version")?;
        if current_version == 0 {
            return Err(RepoError::InvalidData(format!(
                "invalid current_version `0` for note {uuid_text}"
            )));
        }

        Ok(Note {
            id: parse_uuid(&uuid_text, "notes.uuid")?,
            user_id: row.get("user_id")?,
            project_id: row.get("project_id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            tags: load_tags(self.conn, &uuid_text)?,
            linked_tasks: load_links(self.conn, &uuid_text, LINK_TASK)?,
            linked_notes: load_links(self.conn, &uuid_text, LINK_NOTE)?,
            versions: load_versions(self.conn, &uuid_text)?,
            current_version,
            is_pinned: int_to_bool(row.get("is_pinned")?, "notes.is_pinned")?,
            is_archived: int_to_bool(row.get("is_archived")?, "notes.is_archived")?,
            created_at: epoch_ms_to_utc(row.get("created_at")?, "notes.created_at")?,
            updated_at: epoch_ms_to_utc(row.get("updated_at")?, "notes.updated_at")?,
        })
    }
}

const LINK_TASK: &str = "task";
const LINK_NOTE: &str = "note";

// Shared WHERE clause for list and count.
fn filter_clause(query: &NoteListQuery) -> (String, Vec<Value>) {
    let mut sql = String::from(" WHERE user_id = ? AND is_archived = ?");
    let mut bind_values: Vec<Value> = vec![
        Value::Text(query.user_id.clone()),
        Value::Integer(i64::from(query.is_archived)),
    ];

    if let Some(project_id) = query.project_id.as_ref() {
        sql.push_str(" AND project_id = ?");
        bind_values.push(Value::Text(project_id.clone()));
    }

    let tags = normalize_tags(&query.tags);
    if !tags.is_empty() {
        let placeholders = vec!["?"; tags.len()].join(", ");
        sql.push_str(&format!(
            " AND EXISTS (
                SELECT 1
                FROM note_tags nt
                WHERE nt.note_uuid = notes.uuid
                  AND nt.tag IN ({placeholders})
            )"
        ));
        bind_values.extend(tags.into_iter().map(Value::Text));
    }

    if let Some(is_pinned) = query.is_pinned {
        sql.push_str(" AND is_pinned = ?");
        bind_values.push(Value::Integer(i64::from(is_pinned)));
    }
    (sql, bind_values)
}

/// Normalizes one tag; blank tags are dropped.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes, deduplicates and sorts tags.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .filter_map(|tag| normalize_tag(tag))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn replace_tags_in_tx(tx: &Transaction<'_>, id: NoteId, tags: &[String]) -> RepoResult<()> {
    let uuid = id.to_string();
    tx.execute("DELETE FROM note_tags WHERE note_uuid = ?1;", [uuid.as_str()])?;
    for tag in normalize_tags(tags) {
        tx.execute(
            "INSERT INTO note_tags (note_uuid, tag) VALUES (?1, ?2);",
            params![uuid.as_str(), tag],
        )?;
    }
    Ok(())
}

fn replace_links_in_tx(tx: &Transaction<'_>, note: &Note) -> RepoResult<()> {
    let uuid = note.id.to_string();
    tx.execute("DELETE FROM note_links WHERE note_uuid = ?1;", [uuid.as_str()])?;
    let tasks = note.linked_tasks.iter().map(|id| (LINK_TASK, id));
    let notes = note.linked_notes.iter().map(|id| (LINK_NOTE, id));
    for (position, (kind, target)) in tasks.chain(notes).enumerate() {
        tx.execute(
            "INSERT OR IGNORE INTO note_links (note_uuid, target_kind, target_uuid, position)
             VALUES (?1, ?2, ?3, ?4);",
            params![uuid.as_str(), kind, target.to_string(), position as i64],
        )?;
    }
    Ok(())
}

fn load_links(conn: &Connection, note_uuid: &str, kind: &str) -> RepoResult<Vec<Uuid>> {
    let mut stmt = conn.prepare(
        "SELECT target_uuid
         FROM note_links
         WHERE note_uuid = ?1
           AND target_kind = ?2
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query(params![note_uuid, kind])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        ids.push(parse_uuid(&text, "note_links.target_uuid")?);
    }
    Ok(ids)
}

fn insert_version_in_tx(
    tx: &Transaction<'_>,
    id: NoteId,
    version: &NoteVersion,
) -> RepoResult<()> {
    tx.execute(
        "INSERT INTO note_versions (note_uuid, version, content, updated_at, updated_by)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            id.to_string(),
            version.version,
            version.content.as_str(),
            version.updated_at.timestamp_millis(),
            version.updated_by.as_str(),
        ],
    )?;
    Ok(())
}

pub(crate) fn load_tags(conn: &Connection, note_uuid: &str) -> RepoResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT tag FROM note_tags WHERE note_uuid = ?1 ORDER BY tag ASC;")?;
    let mut rows = stmt.query([note_uuid])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}

fn load_versions(conn: &Connection, note_uuid: &str) -> RepoResult<Vec<NoteVersion>> {
    let mut stmt = conn.prepare(
        "SELECT version, content, updated_at, updated_by
         FROM note_versions
         WHERE note_uuid = ?1
         ORDER BY version ASC;",
    )?;
    let mut rows = stmt.query([note_uuid])?;
    let mut versions = Vec::new();
    while let Some(row) = rows.next()? {
        versions.push(NoteVersion {
            version: row.get("version")?,
            content: row.get("content")?,
            updated_at: epoch_ms_to_utc(row.get("updated_at")?, "note_versions.updated_at")?,
            updated_by: row.get("updated_by")?,
        });
    }
    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::{normalize_tag, normalize_tags};

    #[test]
    fn tags_are_trimmed_lowercased_and_deduplicated() {
        let tags = vec![
            " Work ".to_string(),
            "IMPORTANT".to_string(),
            "work".to_string(),
            "  ".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["important", "work"]);
        assert_eq!(normalize_tag("   "), None);
    }
}
