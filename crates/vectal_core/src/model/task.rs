//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record, including its recurrence rule.
//! - Provide validation shared by repository write/read paths.
//!
//! # Invariants
//! - `title` is non-blank and at most 500 chars.
//! - `priority` is in `0..=4` (none, low, medium, high, urgent).
//! - `labels` are trimmed, lowercased, deduplicated and sorted; each is at
//!   most 100 chars.
//! - Writes require `recurrence_rule`, when set, to be a general-form rule
//!   with a known frequency and a positive interval. Reads tolerate any
//!   stored text and treat an unknown rule as no recurrence.

use crate::recurrence::{next_occurrence, parse_general, RecurrenceSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for tasks.
pub type TaskId = Uuid;

pub const TASK_TITLE_MAX_CHARS: usize = 500;
pub const TASK_PRIORITY_MAX: u8 = 4;
pub const TASK_LABEL_MAX_CHARS: usize = 100;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Storage/wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Validation failure for task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    NilId,
    EmptyTitle,
    TitleTooLong { chars: usize },
    PriorityOutOfRange(u8),
    LabelTooLong { label: String },
    InvalidRecurrenceRule(String),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be nil"),
            Self::EmptyTitle => write!(f, "task title must not be blank"),
            Self::TitleTooLong { chars } => write!(
                f,
                "task title has {chars} chars; limit is {TASK_TITLE_MAX_CHARS}"
            ),
            Self::PriorityOutOfRange(value) => write!(
                f,
                "task priority {value} is out of range 0..={TASK_PRIORITY_MAX}"
            ),
            Self::LabelTooLong { label } => write!(
                f,
                "task label `{label}` exceeds {TASK_LABEL_MAX_CHARS} chars"
            ),
            Self::InvalidRecurrenceRule(rule) => {
                write!(f, "invalid recurrence rule `{rule}`")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// Actionable task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: u8,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Serialized general-form rule, e.g. `FREQ=DAILY;INTERVAL=1`.
    pub recurrence_rule: Option<String>,
    /// Normalized categorization labels.
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a pending task with a generated ID.
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            project_id: None,
            title: title.into(),
            description: None,
            status: TaskStatus::Pending,
            priority: 0,
            due_date: None,
            completed_at: None,
            recurrence_rule: None,
            labels: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks everything a write must satisfy, including the recurrence rule.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        self.validate_record()?;
        if let Some(rule) = self.recurrence_rule.as_deref() {
            if parse_general(rule).to_spec().is_none() {
                return Err(TaskValidationError::InvalidRecurrenceRule(rule.to_string()));
            }
        }
        Ok(())
    }

    /// Checks the invariants persisted rows must keep.
    ///
    /// The recurrence rule is opaque here; [`Task::recurrence`] reads an
    /// unknown rule as `None`.
    pub fn validate_record(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        let chars = self.title.chars().count();
        if chars > TASK_TITLE_MAX_CHARS {
            return Err(TaskValidationError::TitleTooLong { chars });
        }
        if self.priority > TASK_PRIORITY_MAX {
            return Err(TaskValidationError::PriorityOutOfRange(self.priority));
        }
        if let Some(label) = self
            .labels
            .iter()
            .find(|label| label.chars().count() > TASK_LABEL_MAX_CHARS)
        {
            return Err(TaskValidationError::LabelTooLong {
                label: label.clone(),
            });
        }
        Ok(())
    }

    /// Typed view of `recurrence_rule`.
    pub fn recurrence(&self) -> Option<RecurrenceSpec> {
        self.recurrence_rule
            .as_deref()
            .and_then(|rule| parse_general(rule).to_spec())
    }

    /// Due date `count` periods after the current one.
    pub fn due_date_after(&self, count: u32) -> Option<DateTime<Utc>> {
        let due_date = self.due_date?;
        let rule = self.recurrence_rule.as_deref()?;
        next_occurrence(&due_date, rule, count)
    }
}

/// Trims, lowercases, deduplicates and sorts labels; blanks are dropped.
pub fn normalize_labels(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .map(|label| label.trim().to_lowercase())
        .filter(|label| !label.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
