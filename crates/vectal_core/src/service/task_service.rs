//! Task use-case service.
//!
//! # Responsibility
//! - Provide task create/get/list/status/delete APIs.
//! - Manage labels and project assignment; answer the "due today" view.
//! - Manage the serialized recurrence rule on a task and expand it into
//!   upcoming due dates.
//!
//! # Invariants
//! - Stored recurrence rules are always produced by `recurrence::serialize`.
//! - `completed_at` is set exactly when `status == Completed`.
//! - "Today" is the UTC calendar day containing the caller's `now`.

use crate::model::task::{normalize_labels, Task, TaskId, TaskStatus};
use crate::recurrence::{generate_occurrences, Frequency, RecurrenceError, RecurrenceSpec};
use crate::repo::task_repo::{TaskListQuery, TaskRepository};
use crate::repo::{utc_now_millis, RepoError, RepoResult};
use chrono::{DateTime, Days, NaiveTime, Utc};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    InvalidRecurrence(RecurrenceError),
    TaskNotFound(TaskId),
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRecurrence(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent task state: {details}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRecurrence(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<RecurrenceError> for TaskServiceError {
    fn from(value: RecurrenceError) -> Self {
        Self::InvalidRecurrence(value)
    }
}

/// Input for [`TaskService::create_task`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: u8,
    pub due_date: Option<DateTime<Utc>>,
    pub recurrence: Option<RecurrenceSpec>,
    pub project_id: Option<String>,
    pub labels: Vec<String>,
}

/// Task service facade over repository implementations.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a pending task owned by `user_id`.
    pub fn create_task(&self, user_id: &str, input: NewTask) -> Result<Task, TaskServiceError> {
        let mut task = Task::new(user_id, input.title, utc_now_millis());
        task.description = input.description;
        task.priority = input.priority;
        task.due_date = input.due_date;
        task.recurrence_rule = input.recurrence.map(|spec| spec.to_rule_string());
        task.project_id = input.project_id;
        task.labels = normalize_labels(&input.labels);

        let id = self.repo.create_task(&task)?;
        info!("event=task_create module=service status=ok task_id={id}");
        self.read_back(id, user_id, "created task not found in read-back")
    }

    pub fn get_task(&self, id: TaskId, user_id: &str) -> RepoResult<Option<Task>> {
        self.repo.get_task(id, user_id)
    }

    pub fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        self.repo.list_tasks(query)
    }

    pub fn count_tasks(&self, query: &TaskListQuery) -> RepoResult<u64> {
        self.repo.count_tasks(query)
    }

    /// Tasks due on the UTC day containing `now`, any status.
    pub fn tasks_due_today(&self, user_id: &str, now: DateTime<Utc>) -> RepoResult<Vec<Task>> {
        let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        self.repo.list_tasks(&TaskListQuery {
            user_id: user_id.to_string(),
            due_from: Some(start),
            due_before: start.checked_add_days(Days::new(1)),
            ..TaskListQuery::default()
        })
    }

    /// Replaces the label set; input is normalized first.
    pub fn set_labels(
        &self,
        id: TaskId,
        user_id: &str,
        labels: &[String],
    ) -> Result<Task, TaskServiceError> {
        let labels = normalize_labels(labels);
        self.modify(id, user_id, move |task, _| task.labels = labels)
    }

    /// Moves the task into `project_id`, or out of any project with `None`.
    pub fn set_project(
        &self,
        id: TaskId,
        user_id: &str,
        project_id: Option<String>,
    ) -> Result<Task, TaskServiceError> {
        self.modify(id, user_id, move |task, _| task.project_id = project_id)
    }

    /// Moves a task to `status`, stamping or clearing `completed_at`.
    pub fn set_status(
        &self,
        id: TaskId,
        user_id: &str,
        status: TaskStatus,
    ) -> Result<Task, TaskServiceError> {
        self.modify(id, user_id, |task, now| {
            task.status = status;
            task.completed_at = (status == TaskStatus::Completed).then_some(now);
        })
    }

    /// Sets the recurrence from request-style inputs, e.g. `("daily", 1)`.
    pub fn set_recurrence(
        &self,
        id: TaskId,
        user_id: &str,
        frequency: &str,
        interval: u32,
    ) -> Result<Task, TaskServiceError> {
        let frequency: Frequency = frequency.parse()?;
        let spec = RecurrenceSpec::new(frequency, interval)?;
        let task = self.modify(id, user_id, |task, _| {
            task.recurrence_rule = Some(spec.to_rule_string());
        })?;
        info!(
            "event=task_recurrence module=service status=ok task_id={id} freq={} interval={}",
            spec.frequency(),
            spec.interval()
        );
        Ok(task)
    }

    /// Removes any recurrence from the task.
    pub fn clear_recurrence(&self, id: TaskId, user_id: &str) -> Result<Task, TaskServiceError> {
        self.modify(id, user_id, |task, _| task.recurrence_rule = None)
    }

    /// Next `n` due dates after the current one.
    ///
    /// Empty when the task has no due date or no recurrence.
    pub fn upcoming_occurrences(
        &self,
        id: TaskId,
        user_id: &str,
        n: u32,
    ) -> Result<Vec<DateTime<Utc>>, TaskServiceError> {
        let task = self
            .repo
            .get_task(id, user_id)?
            .ok_or(TaskServiceError::TaskNotFound(id))?;
        let (Some(due_date), Some(rule)) = (task.due_date, task.recurrence_rule.as_deref()) else {
            return Ok(Vec::new());
        };
        Ok(generate_occurrences(&due_date, rule, n))
    }

    pub fn delete_task(&self, id: TaskId, user_id: &str) -> Result<(), TaskServiceError> {
        if !self.repo.delete_task(id, user_id)? {
            return Err(TaskServiceError::TaskNotFound(id));
        }
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }

    fn modify(
        &self,
        id: TaskId,
        user_id: &str,
        change: impl FnOnce(&mut Task, DateTime<Utc>),
    ) -> Result<Task, TaskServiceError> {
        let mut task = self
            .repo
            .get_task(id, user_id)?
            .ok_or(TaskServiceError::TaskNotFound(id))?;
        let now = utc_now_millis();
        change(&mut task, now);
        task.updated_at = now;
        self.repo.update_task(&task)?;
        self.read_back(id, user_id, "updated task not found in read-back")
    }

    fn read_back(
        &self,
        id: TaskId,
        user_id: &str,
        details: &'static str,
    ) -> Result<Task, TaskServiceError> {
        self.repo
            .get_task(id, user_id)?
            .ok_or(TaskServiceError::InconsistentState(details))
    }
}
