use rusqlite::Connection;
use vectal_core::db::open_db_in_memory;
use vectal_core::{
    search_notes, CoreConfig, FtsResult, NewNote, Note, NoteSearchHit, NoteSearchQuery,
    NoteService, NoteUpdate, SearchError, SqliteNoteRepository,
};

fn hits(conn: &Connection, user_id: &str, text: &str) -> Vec<NoteSearchHit> {
    search_notes(conn, &NoteSearchQuery::new(user_id, text))
        .unwrap()
        .hits
}

fn create(conn: &Connection, user_id: &str, title: &str, content: &str) -> Note {
    NoteService::new(SqliteNoteRepository::new(conn))
        .create_note(
            user_id,
            NewNote {
                title: title.to_string(),
                content: content.to_string(),
                tags: vec!["Lang".to_string()],
                ..NewNote::default()
            },
        )
        .unwrap()
}

#[test]
fn search_returns_shaped_hits() {
    let conn = open_db_in_memory().unwrap();
    let note = create(
        &conn,
        "user-1",
        "Languages",
        "Intro sentence. I write **Python** at work! Rust at home.",
    );
    create(&conn, "user-1", "Groceries", "Milk and eggs.");

    let hits = hits(&conn, "user-1", "python");
    assert_eq!(hits.len(), 1);

    let hit = &hits[0];
    assert_eq!(hit.note_id, note.id);
    assert_eq!(hit.title, "Languages");
    assert_eq!(hit.tags, vec!["lang"]);
    assert_eq!(hit.highlights, vec!["I write **Python** at work"]);
    assert!(hit.preview.contains("Python"));
    assert!(!hit.preview.contains("**"));
    assert!(hit.score.is_finite());
}

#[test]
fn title_matches_are_found() {
    let conn = open_db_in_memory().unwrap();
    create(&conn, "user-1", "Quarterly roadmap", "Nothing else here.");

    let hits = hits(&conn, "user-1", "roadmap");
    assert_eq!(hits.len(), 1);
    assert!(hits[0].highlights.is_empty());
}

#[test]
fn search_is_scoped_to_user() {
    let conn = open_db_in_memory().unwrap();
    create(&conn, "user-1", "Mine", "shared keyword");
    create(&conn, "user-2", "Theirs", "shared keyword");

    let hits = hits(&conn, "user-2", "keyword");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Theirs");
}

#[test]
fn all_terms_must_match() {
    let conn = open_db_in_memory().unwrap();
    create(&conn, "user-1", "Both", "alpha beta");
    create(&conn, "user-1", "One", "alpha only");

    let hits = hits(&conn, "user-1", "alpha beta");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Both");
}

#[test]
fn blank_query_and_zero_limit_return_no_hits() {
    let conn = open_db_in_memory().unwrap();
    create(&conn, "user-1", "Any", "content");

    let blank = search_notes(&conn, &NoteSearchQuery::new("user-1", "   ")).unwrap();
    assert!(blank.hits.is_empty());
    assert_eq!(blank.total, 0);

    let mut query = NoteSearchQuery::new("user-1", "content");
    query.limit = 0;
    let counted = search_notes(&conn, &query).unwrap();
    assert!(counted.hits.is_empty());
    assert_eq!(counted.total, 1);
}

#[test]
fn total_counts_matches_beyond_the_page() {
    let conn = open_db_in_memory().unwrap();
    for title in ["One", "Two", "Three"] {
        create(&conn, "user-1", title, "paged keyword");
    }
    create(&conn, "user-2", "Other", "paged keyword");

    let mut query = NoteSearchQuery::new("user-1", "paged");
    query.limit = 2;
    let first = search_notes(&conn, &query).unwrap();
    assert_eq!(first.hits.len(), 2);
    assert_eq!(first.total, 3);

    query.offset = 2;
    let second = search_notes(&conn, &query).unwrap();
    assert_eq!(second.hits.len(), 1);
    assert_eq!(second.total, 3);
}

#[test]
fn configured_sizes_shape_hits() {
    let conn = open_db_in_memory().unwrap();
    create(
        &conn,
        "user-1",
        "Long",
        "First match sentence. Second match sentence. Third match sentence.",
    );
    let config = CoreConfig {
        preview_max_length: 10,
        max_highlights: 1,
        ..CoreConfig::default()
    };

    let page = search_notes(&conn, &NoteSearchQuery::from_config(&config, "user-1", "zzz match"))
        .unwrap();
    assert!(page.hits.is_empty());

    let page =
        search_notes(&conn, &NoteSearchQuery::from_config(&config, "user-1", "match")).unwrap();
    assert_eq!(page.hits.len(), 1);
    assert_eq!(page.hits[0].highlights, vec!["First match sentence"]);
}

#[test]
fn punctuation_in_plain_queries_is_safe() {
    let conn = open_db_in_memory().unwrap();
    create(&conn, "user-1", "Quote", r#"she said "hello" loudly"#);

    let hits = hits(&conn, "user-1", r#"hello" said"#);
    assert_eq!(hits.len(), 1);
}

#[test]
fn malformed_raw_syntax_is_invalid_query() {
    let conn = open_db_in_memory().unwrap();
    create(&conn, "user-1", "Any", "content");

    let mut query = NoteSearchQuery::new("user-1", "content AND (");
    query.raw_fts_syntax = true;
    let result: FtsResult<_> = search_notes(&conn, &query);
    assert!(matches!(result, Err(SearchError::InvalidQuery { .. })));
}

#[test]
fn updates_and_deletes_are_reflected_in_index() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::new(&conn));
    let note = create(&conn, "user-1", "Draft", "old wording");

    service
        .update_note(
            note.id,
            "user-1",
            NoteUpdate {
                content: Some("fresh wording".to_string()),
                ..NoteUpdate::default()
            },
        )
        .unwrap();
    assert!(hits(&conn, "user-1", "old").is_empty());
    assert_eq!(hits(&conn, "user-1", "fresh").len(), 1);

    service.delete_note(note.id, "user-1").unwrap();
    assert!(hits(&conn, "user-1", "fresh").is_empty());
}
