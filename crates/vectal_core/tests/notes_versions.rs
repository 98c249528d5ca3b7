use rusqlite::Connection;
use vectal_core::db::open_db_in_memory;
use vectal_core::text::MarkdownRenderer;
use vectal_core::{
    LinkedNote, NewNote, NewTask, NoteFilter, NoteService, NoteServiceError, NoteUpdate,
    SqliteNoteRepository, SqliteTaskRepository, TaskService,
};

fn service(conn: &Connection) -> NoteService<SqliteNoteRepository<'_>> {
    NoteService::new(SqliteNoteRepository::new(conn))
}

fn draft(title: &str, content: &str) -> NewNote {
    NewNote {
        title: title.to_string(),
        content: content.to_string(),
        ..NewNote::default()
    }
}

#[test]
fn create_starts_at_version_one_without_history() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);

    let note = notes
        .create_note("user-1", draft("  Plan  ", "first body"))
        .unwrap();
    assert_eq!(note.title, "Plan");
    assert_eq!(note.current_version, 1);
    assert!(note.versions.is_empty());
    assert_eq!(note.created_at, note.updated_at);
}

#[test]
fn content_change_appends_snapshot_of_previous_content() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);
    let created = notes.create_note("user-1", draft("Plan", "v1")).unwrap();

    let updated = notes
        .update_note(
            created.id,
            "user-1",
            NoteUpdate {
                content: Some("v2".to_string()),
                ..NoteUpdate::default()
            },
        )
        .unwrap();

    assert_eq!(updated.content, "v2");
    assert_eq!(updated.current_version, 2);
    assert_eq!(updated.versions.len(), 1);
    let snapshot = &updated.versions[0];
    assert_eq!(snapshot.version, 1);
    assert_eq!(snapshot.content, "v1");
    assert_eq!(snapshot.updated_at, created.updated_at);
    assert_eq!(snapshot.updated_by, "user-1");
}

#[test]
fn identical_content_and_metadata_edits_do_not_version() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);
    let created = notes.create_note("user-1", draft("Plan", "same")).unwrap();

    let updated = notes
        .update_note(
            created.id,
            "user-1",
            NoteUpdate {
                title: Some("Renamed".to_string()),
                content: Some("same".to_string()),
                is_pinned: Some(true),
                ..NoteUpdate::default()
            },
        )
        .unwrap();

    assert_eq!(updated.title, "Renamed");
    assert!(updated.is_pinned);
    assert_eq!(updated.current_version, 1);
    assert!(notes.list_versions(created.id, "user-1").unwrap().is_empty());
}

#[test]
fn repeated_edits_build_ordered_history() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);
    let created = notes.create_note("user-1", draft("Plan", "a")).unwrap();

    for content in ["b", "c", "d"] {
        notes
            .update_note(
                created.id,
                "user-1",
                NoteUpdate {
                    content: Some(content.to_string()),
                    ..NoteUpdate::default()
                },
            )
            .unwrap();
    }

    let versions = notes.list_versions(created.id, "user-1").unwrap();
    let numbers: Vec<u32> = versions.iter().map(|version| version.version).collect();
    let contents: Vec<&str> = versions.iter().map(|version| version.content.as_str()).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(contents, vec!["a", "b", "c"]);

    let note = notes.get_note(created.id, "user-1").unwrap().unwrap();
    assert_eq!(note.current_version, 4);
    assert_eq!(note.content, "d");
}

#[test]
fn tags_are_normalized_and_filterable() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);
    let tagged = notes
        .create_note(
            "user-1",
            NewNote {
                tags: vec!["Work".to_string(), " work ".to_string(), "Ideas".to_string()],
                ..draft("Tagged", "body")
            },
        )
        .unwrap();
    let personal = notes
        .create_note(
            "user-1",
            NewNote {
                tags: vec!["personal".to_string()],
                ..draft("Personal", "body")
            },
        )
        .unwrap();
    notes.create_note("user-1", draft("Plain", "body")).unwrap();
    assert_eq!(tagged.tags, vec!["ideas", "work"]);

    let filter = NoteFilter {
        tags: vec!["WORK".to_string()],
        ..NoteFilter::default()
    };
    let listed = notes.list_notes("user-1", filter, None, 0).unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].id, tagged.id);
    assert_eq!(listed.total, 1);

    let any_of = NoteFilter {
        tags: vec!["ideas".to_string(), " Personal ".to_string(), "missing".to_string()],
        ..NoteFilter::default()
    };
    let listed = notes.list_notes("user-1", any_of, None, 0).unwrap();
    let mut ids: Vec<_> = listed.items.iter().map(|item| item.id).collect();
    ids.sort();
    let mut expected = vec![tagged.id, personal.id];
    expected.sort();
    assert_eq!(ids, expected);
    assert_eq!(listed.total, 2);
}

#[test]
fn total_counts_every_page() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);
    for title in ["A", "B", "C", "D", "E"] {
        notes.create_note("user-1", draft(title, "body")).unwrap();
    }
    notes.create_note("user-2", draft("Other", "body")).unwrap();

    let page = notes
        .list_notes("user-1", NoteFilter::default(), Some(2), 4)
        .unwrap();
    assert_eq!(page.applied_limit, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, 5);
}

#[test]
fn project_can_be_set_and_cleared() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);
    let note = notes
        .create_note(
            "user-1",
            NewNote {
                project_id: Some("proj-a".to_string()),
                ..draft("Scoped", "body")
            },
        )
        .unwrap();
    assert_eq!(note.project_id.as_deref(), Some("proj-a"));

    let untouched = notes
        .update_note(note.id, "user-1", NoteUpdate::default())
        .unwrap();
    assert_eq!(untouched.project_id.as_deref(), Some("proj-a"));

    let moved = notes
        .update_note(
            note.id,
            "user-1",
            NoteUpdate {
                project_id: Some(Some("proj-b".to_string())),
                ..NoteUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(moved.project_id.as_deref(), Some("proj-b"));

    let cleared = notes
        .update_note(
            note.id,
            "user-1",
            NoteUpdate {
                project_id: Some(None),
                ..NoteUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.project_id, None);
    let listed = notes
        .list_notes(
            "user-1",
            NoteFilter {
                project_id: Some("proj-b".to_string()),
                ..NoteFilter::default()
            },
            None,
            0,
        )
        .unwrap();
    assert_eq!(listed.total, 0);
}

#[test]
fn linked_entities_resolve_owned_notes_only() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);
    let tasks = TaskService::new(SqliteTaskRepository::new(&conn));
    let task = tasks
        .create_task(
            "user-1",
            NewTask {
                title: "Follow up".to_string(),
                ..NewTask::default()
            },
        )
        .unwrap();
    let target = notes.create_note("user-1", draft("Target", "body")).unwrap();
    let gone = notes.create_note("user-1", draft("Gone", "body")).unwrap();
    let foreign = notes.create_note("user-2", draft("Foreign", "body")).unwrap();

    let hub = notes
        .create_note(
            "user-1",
            NewNote {
                linked_tasks: vec![task.id, task.id],
                linked_notes: vec![foreign.id, gone.id, target.id],
                ..draft("Hub", "body")
            },
        )
        .unwrap();
    assert_eq!(hub.linked_tasks, vec![task.id]);
    assert_eq!(hub.linked_notes, vec![foreign.id, gone.id, target.id]);
    notes.delete_note(gone.id, "user-1").unwrap();

    let linked = notes.get_linked_entities(hub.id, "user-1").unwrap();
    assert_eq!(linked.tasks, vec![task.id]);
    assert_eq!(
        linked.notes,
        vec![LinkedNote {
            id: target.id,
            title: "Target".to_string(),
        }]
    );

    assert!(matches!(
        notes.get_linked_entities(hub.id, "user-2"),
        Err(NoteServiceError::NoteNotFound(_))
    ));
}

#[test]
fn links_are_replaced_independently_and_skip_self() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);
    let other = notes.create_note("user-1", draft("Other", "body")).unwrap();
    let task_id = uuid::Uuid::new_v4();
    let hub = notes
        .create_note(
            "user-1",
            NewNote {
                linked_tasks: vec![task_id],
                ..draft("Hub", "body")
            },
        )
        .unwrap();

    let updated = notes
        .update_note(
            hub.id,
            "user-1",
            NoteUpdate {
                linked_notes: Some(vec![hub.id, other.id]),
                ..NoteUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.linked_tasks, vec![task_id]);
    assert_eq!(updated.linked_notes, vec![other.id]);

    let cleared = notes
        .update_note(
            hub.id,
            "user-1",
            NoteUpdate {
                linked_tasks: Some(Vec::new()),
                ..NoteUpdate::default()
            },
        )
        .unwrap();
    assert!(cleared.linked_tasks.is_empty());
    assert_eq!(cleared.linked_notes, vec![other.id]);
}

#[test]
fn list_returns_summaries_scoped_to_owner() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);
    notes
        .create_note("user-1", draft("Long", &format!("# Heading\n\n{}", "word ".repeat(100))))
        .unwrap();
    notes.create_note("user-2", draft("Other", "hidden")).unwrap();

    let listed = notes
        .list_notes("user-1", NoteFilter::default(), None, 0)
        .unwrap();
    assert_eq!(listed.applied_limit, 50);
    assert_eq!(listed.items.len(), 1);

    let summary = &listed.items[0];
    assert_eq!(summary.title, "Long");
    assert_eq!(summary.word_count, 102);
    assert!(summary.preview.starts_with("Heading word"));
    assert!(summary.preview.ends_with("..."));
}

#[test]
fn archived_notes_are_listed_separately() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);
    let note = notes.create_note("user-1", draft("Old", "body")).unwrap();
    notes
        .update_note(
            note.id,
            "user-1",
            NoteUpdate {
                is_archived: Some(true),
                ..NoteUpdate::default()
            },
        )
        .unwrap();

    let active = notes
        .list_notes("user-1", NoteFilter::default(), None, 0)
        .unwrap();
    assert!(active.items.is_empty());

    let archived = notes
        .list_notes(
            "user-1",
            NoteFilter {
                is_archived: true,
                ..NoteFilter::default()
            },
            Some(500),
            0,
        )
        .unwrap();
    assert_eq!(archived.applied_limit, 100);
    assert_eq!(archived.items.len(), 1);
}

#[test]
fn other_users_cannot_read_update_or_delete() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);
    let note = notes.create_note("user-1", draft("Private", "body")).unwrap();

    assert!(notes.get_note(note.id, "user-2").unwrap().is_none());
    assert!(notes.list_versions(note.id, "user-2").unwrap().is_empty());
    assert!(matches!(
        notes.update_note(note.id, "user-2", NoteUpdate::default()),
        Err(NoteServiceError::NoteNotFound(id)) if id == note.id
    ));
    assert!(matches!(
        notes.delete_note(note.id, "user-2"),
        Err(NoteServiceError::NoteNotFound(_))
    ));
}

#[test]
fn delete_removes_note_and_history() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);
    let note = notes.create_note("user-1", draft("Temp", "a")).unwrap();
    notes
        .update_note(
            note.id,
            "user-1",
            NoteUpdate {
                content: Some("b".to_string()),
                ..NoteUpdate::default()
            },
        )
        .unwrap();

    notes.delete_note(note.id, "user-1").unwrap();

    assert!(notes.get_note(note.id, "user-1").unwrap().is_none());
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM note_versions;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn blank_title_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let notes = service(&conn);
    assert!(matches!(
        notes.create_note("user-1", draft("   ", "body")),
        Err(NoteServiceError::InvalidTitle(_))
    ));
}

struct ShoutingRenderer;

impl MarkdownRenderer for ShoutingRenderer {
    fn render(&self, markdown: &str) -> String {
        markdown.to_uppercase()
    }
}

#[test]
fn renderer_can_be_swapped() {
    let conn = open_db_in_memory().unwrap();
    let default_html = service(&conn).render_markdown("# Title");
    assert!(default_html.contains("<h1>Title</h1>"));

    let custom = service(&conn).with_renderer(ShoutingRenderer);
    assert_eq!(custom.render_markdown("quiet"), "QUIET");
}
