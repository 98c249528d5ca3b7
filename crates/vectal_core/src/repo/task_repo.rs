//! Task repository contract and SQLite implementation.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Read paths call `Task::validate_record()`, which leaves the stored
//!   `recurrence_rule` opaque so one odd rule cannot break a whole list.
//! - A task row and its label set are written in one transaction.
//! - Lists are ordered by `due_date ASC` (undated last), then `created_at`.

use crate::model::task::{normalize_labels, Task, TaskId, TaskStatus};
use crate::repo::{epoch_ms_to_utc, parse_uuid, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    user_id,
    project_id,
    title,
    description,
    status,
    priority,
    due_date,
    completed_at,
    recurrence_rule,
    created_at,
    updated_at
FROM tasks";

/// Filters for listing one user's tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    pub user_id: String,
    pub status: Option<TaskStatus>,
    pub project_id: Option<String>,
    /// Matches tasks carrying this normalized label.
    pub label: Option<String>,
    /// Inclusive lower bound on `due_date`.
    pub due_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `due_date`.
    pub due_before: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for task persistence.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId, user_id: &str) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    /// Rows matching the query filters, ignoring limit and offset.
    fn count_tasks(&self, query: &TaskListQuery) -> RepoResult<u64>;
    fn delete_task(&self, id: TaskId, user_id: &str) -> RepoResult<bool>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO tasks (
                uuid,
                user_id,
                project_id,
                title,
                description,
                status,
                priority,
                due_date,
                completed_at,
                recurrence_rule,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                task.id.to_string(),
                task.user_id.as_str(),
                task.project_id.as_deref(),
                task.title.as_str(),
                task.description.as_deref(),
                task.status.as_str(),
                task.priority,
                task.due_date.map(|at| at.timestamp_millis()),
                task.completed_at.map(|at| at.timestamp_millis()),
                task.recurrence_rule.as_deref(),
                task.created_at.timestamp_millis(),
                task.updated_at.timestamp_millis(),
            ],
        )?;
        replace_labels_in_tx(&tx, task.id, &task.labels)?;
        tx.commit()?;

        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE tasks
             SET
                project_id = ?3,
                title = ?4,
                description = ?5,
                status = ?6,
                priority = ?7,
                due_date = ?8,
                completed_at = ?9,
                recurrence_rule = ?10,
                updated_at = ?11
             WHERE uuid = ?1
               AND user_id = ?2;",
            params![
                task.id.to_string(),
                task.user_id.as_str(),
                task.project_id.as_deref(),
                task.title.as_str(),
                task.description.as_deref(),
                task.status.as_str(),
                task.priority,
                task.due_date.map(|at| at.timestamp_millis()),
                task.completed_at.map(|at| at.timestamp_millis()),
                task.recurrence_rule.as_deref(),
                task.updated_at.timestamp_millis(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        replace_labels_in_tx(&tx, task.id, &task.labels)?;
        tx.commit()?;
        Ok(())
    }

    fn get_task(&self, id: TaskId, user_id: &str) -> RepoResult<Option<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE uuid = ?1
               AND user_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![id.to_string(), user_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(self.hydrate(row)?)),
            None => Ok(None),
        }
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let (filter_sql, mut bind_values) = filter_clause(query);
        let mut sql = format!(
            "{TASK_SELECT_SQL}{filter_sql} \
             ORDER BY due_date IS NULL, due_date ASC, created_at ASC, uuid ASC"
        );

        match query.limit {
            Some(limit) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                bind_values.push(Value::Integer(i64::from(limit)));
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
            None if query.offset > 0 => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
            None => {}
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(self.hydrate(row)?);
        }
        Ok(tasks)
    }

    fn count_tasks(&self, query: &TaskListQuery) -> RepoResult<u64> {
        let (filter_sql, bind_values) = filter_clause(query);
        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM tasks{filter_sql}"),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    fn delete_task(&self, id: TaskId, user_id: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE uuid = ?1 AND user_id = ?2;",
            params![id.to_string(), user_id],
        )?;
        Ok(changed > 0)
    }
}

impl SqliteTaskRepository<'_> {
    fn hydrate(&self, row: &Row<'_>) -> RepoResult<Task> {
        let uuid_text: String = row.get("uuid")?;
        let status_text: String = row.get("status")?;
        let status = TaskStatus::parse(&status_text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
        })?;

        let task = Task {
            id: parse_uuid(&uuid_text, "tasks.uuid")?,
            user_id: row.get("user_id")?,
            project_id: row.get("project_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            status,
            priority: row.get("priority")?,
            due_date: optional_timestamp(row.get("due_date")?, "tasks.due_date")?,
            completed_at: optional_timestamp(row.get("completed_at")?, "tasks.completed_at")?,
            recurrence_rule: row.get("recurrence_rule")?,
            labels: load_labels(self.conn, &uuid_text)?,
            created_at: epoch_ms_to_utc(row.get("created_at")?, "tasks.created_at")?,
            updated_at: epoch_ms_to_utc(row.get("updated_at")?, "tasks.updated_at")?,
        };
        task.validate_record()?;
        Ok(task)
    }
}

// Shared WHERE clause for list and count.
fn filter_clause(query: &TaskListQuery) -> (String, Vec<Value>) {
    let mut sql = String::from(" WHERE user_id = ?");
    let mut bind_values = vec![Value::Text(query.user_id.clone())];

    if let Some(status) = query.status {
        sql.push_str(" AND status = ?");
        bind_values.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(project_id) = query.project_id.as_ref() {
        sql.push_str(" AND project_id = ?");
        bind_values.push(Value::Text(project_id.clone()));
    }
    if let Some(label) = query.label.as_deref() {
        sql.push_str(
            " AND EXISTS (
                SELECT 1
                FROM task_labels tl
                WHERE tl.task_uuid = tasks.uuid
                  AND tl.label = ?
            )",
        );
        bind_values.push(Value::Text(label.trim().to_lowercase()));
    }
    if let Some(from) = query.due_from {
        sql.push_str(" AND due_date >= ?");
        bind_values.push(Value::Integer(from.timestamp_millis()));
    }
    if let Some(before) = query.due_before {
        sql.push_str(" AND due_date < ?");
        bind_values.push(Value::Integer(before.timestamp_millis()));
    }
    (sql, bind_values)
}

fn replace_labels_in_tx(tx: &Transaction<'_>, id: TaskId, labels: &[String]) -> RepoResult<()> {
    let uuid = id.to_string();
    tx.execute("DELETE FROM task_labels WHERE task_uuid = ?1;", [uuid.as_str()])?;
    for label in normalize_labels(labels) {
        tx.execute(
            "INSERT INTO task_labels (task_uuid, label) VALUES (?1, ?2);",
            params![uuid.as_str(), label],
        )?;
    }
    Ok(())
}

fn load_labels(conn: &Connection, task_uuid: &str) -> RepoResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT label FROM task_labels WHERE task_uuid = ?1 ORDER BY label ASC;")?;
    let mut rows = stmt.query([task_uuid])?;
    let mut labels = Vec::new();
    while let Some(row) = rows.next()? {
        labels.push(row.get(0)?);
    }
    Ok(labels)
}

fn optional_timestamp(value: Option<i64>, column: &str) -> RepoResult<Option<DateTime<Utc>>> {
    value.map(|ms| epoch_ms_to_utc(ms, column)).transpose()
}
