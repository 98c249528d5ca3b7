//! SQLite FTS5-based note search.
//!
//! # Responsibility
//! - Keyword search over note titles and content for one user.
//! - Shape each hit with a query-centered preview and sentence highlights.
//!
//! # Invariants
//! - Only the requesting user's notes are returned.
//! - Ordering is deterministic: bm25 rank, then `updated_at DESC`, then uuid.
//! - Previews and highlights are computed fresh per query, never stored.

use crate::config::CoreConfig;
use crate::db::DbError;
use crate::model::note::NoteId;
use crate::repo::note_repo::load_tags;
use crate::repo::{epoch_ms_to_utc, parse_uuid, RepoError};
use crate::text::preview::{
    extract_highlights, generate_preview, DEFAULT_MAX_HIGHLIGHTS, DEFAULT_PREVIEW_MAX_LENGTH,
};
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for full-text search APIs.
pub type FtsResult<T> = Result<T, SearchError>;

/// Search-layer error for query parsing, DB interaction and row decoding.
#[derive(Debug)]
pub enum SearchError {
    /// Raw FTS5 syntax that SQLite could not parse.
    InvalidQuery { query: String, message: String },
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidQuery { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Options for one search request.
#[derive(Debug, Clone)]
pub struct NoteSearchQuery {
    pub user_id: String,
    /// User query text.
    pub text: String,
    pub limit: u32,
    pub offset: u32,
    /// Pass `text` to FTS5 unchanged instead of quoting each term.
    ///
    /// Off by default so type-as-you-search input cannot hit syntax errors.
    pub raw_fts_syntax: bool,
    pub preview_max_length: usize,
    pub max_highlights: usize,
}

impl NoteSearchQuery {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            limit: 50,
            offset: 0,
            raw_fts_syntax: false,
            preview_max_length: DEFAULT_PREVIEW_MAX_LENGTH,
            max_highlights: DEFAULT_MAX_HIGHLIGHTS,
        }
    }

    /// Like [`NoteSearchQuery::new`], with preview, highlight and page
    /// sizes taken from `config`.
    pub fn from_config(
        config: &CoreConfig,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            limit: config.effective_notes_limit(None),
            preview_max_length: config.preview_max_length,
            max_highlights: config.max_highlights,
            ..Self::new(user_id, text)
        }
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSearchHit {
    pub note_id: NoteId,
    pub title: String,
    pub preview: String,
    pub highlights: Vec<String>,
    /// Relevance, higher is better.
    pub score: f64,
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// One page of hits plus the number of matches across all pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteSearchPage {
    pub hits: Vec<NoteSearchHit>,
    pub total: u64,
}

/// Searches one user's notes and returns ranked, shaped hits.
///
/// Blank queries return an empty page. A zero limit returns no hits but
/// still reports `total`.
pub fn search_notes(conn: &Connection, query: &NoteSearchQuery) -> FtsResult<NoteSearchPage> {
    let Some(match_expr) = build_match_expression(query) else {
        return Ok(NoteSearchPage::default());
    };

    let total: i64 = conn
        .query_row(
            "SELECT COUNT(*)
             FROM notes_fts
             JOIN notes ON notes.id = notes_fts.rowid
             WHERE notes_fts MATCH ?1
               AND notes.user_id = ?2;",
            params![match_expr.as_str(), query.user_id.as_str()],
            |row| row.get(0),
        )
        .map_err(|err| classify_match_error(err, &match_expr))?;
    let total = u64::try_from(total).unwrap_or(0);
    if query.limit == 0 {
        return Ok(NoteSearchPage {
            hits: Vec::new(),
            total,
        });
    }

    let mut stmt = conn.prepare(
        "SELECT
            notes.uuid AS uuid,
            notes.title AS title,
            notes.content AS content,
            notes.updated_at AS updated_at,
            bm25(notes_fts) AS match_rank
         FROM notes_fts
         JOIN notes ON notes.id = notes_fts.rowid
         WHERE notes_fts MATCH ?1
           AND notes.user_id = ?2
         ORDER BY match_rank ASC, notes.updated_at DESC, notes.uuid ASC
         LIMIT ?3 OFFSET ?4;",
    )?;
    let mut rows = stmt
        .query(params![
            match_expr.as_str(),
            query.user_id.as_str(),
            i64::from(query.limit),
            i64::from(query.offset),
        ])
        .map_err(|err| classify_match_error(err, &match_expr))?;

    let mut hits = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|err| classify_match_error(err, &match_expr))?
    {
        hits.push(shape_hit(conn, row, query)?);
    }

    debug!(
        "event=note_search module=search status=ok hits={} total={total} limit={}",
        hits.len(),
        query.limit
    );
    Ok(NoteSearchPage { hits, total })
}

fn shape_hit(
    conn: &Connection,
    row: &Row<'_>,
    query: &NoteSearchQuery,
) -> FtsResult<NoteSearchHit> {
    let uuid_text: String = row.get("uuid")?;
    let content: String = row.get("content")?;
    let rank: f64 = row.get("match_rank")?;

    Ok(NoteSearchHit {
        note_id: parse_uuid(&uuid_text, "notes.uuid")?,
        title: row.get("title")?,
        preview: generate_preview(&content, &query.text, query.preview_max_length),
        highlights: extract_highlights(&content, &query.text, query.max_highlights),
        score: -rank,
        tags: load_tags(conn, &uuid_text)?,
        updated_at: epoch_ms_to_utc(row.get("updated_at")?, "notes.updated_at")?,
    })
}

fn build_match_expression(query: &NoteSearchQuery) -> Option<String> {
    let text = query.text.trim();
    if text.is_empty() {
        None
    } else if query.raw_fts_syntax {
        Some(text.to_string())
    } else {
        Some(text.split_whitespace().map(quote_term).collect::<Vec<_>>().join(" AND "))
    }
}

// FTS5 string literal; inner quotes are doubled.
fn quote_term(term: &str) -> String {
    let mut quoted = String::with_capacity(term.len() + 2);
    quoted.push('"');
    for ch in term.chars() {
        if ch == '"' {
            quoted.push('"');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

const MATCH_ERROR_MARKERS: &[&str] = &[
    "fts5: syntax error",
    "malformed match expression",
    "unterminated string",
    "no such column",
];

fn classify_match_error(err: rusqlite::Error, match_expr: &str) -> SearchError {
    let rejected_by_parser = match &err {
        rusqlite::Error::SqliteFailure(_, Some(detail)) => {
            let detail = detail.to_ascii_lowercase();
            MATCH_ERROR_MARKERS.iter().any(|marker| detail.contains(marker))
        }
        _ => false,
    };
    if rejected_by_parser {
        SearchError::InvalidQuery {
            query: match_expr.to_string(),
            message: err.to_string(),
        }
    } else {
        SearchError::Db(DbError::Sqlite(err))
    }
}
