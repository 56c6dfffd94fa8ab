//! Task records as supplied by the storage collaborator.
//!
//! The scoring, planning and insight engines read tasks immutably. Status
//! transitions only happen through [`Task::start`], [`Task::complete`] and
//! [`Task::archive`], which the tracker calls at the storage boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// User-set task priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Base weight contributed to the urgency score.
    pub fn weight(self) -> i64 {
        match self {
            TaskPriority::High => 100,
            TaskPriority::Medium => 50,
            TaskPriority::Low => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(ValidationError::InvalidValue {
                field: "priority",
                message: format!("expected low, medium or high, got '{other}'"),
            }),
        }
    }
}

/// Task lifecycle status.
///
/// ```text
///   pending ──start──> in-progress ──complete──> completed
///      │                    │
///      └──────complete──────┘        any non-archived ──archive──> archived
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Archived,
}

impl TaskStatus {
    /// Check if a transition is valid.
    pub fn can_transition_to(&self, to: &TaskStatus) -> bool {
        match self {
            TaskStatus::Pending => matches!(
                to,
                TaskStatus::InProgress | TaskStatus::Completed | TaskStatus::Archived
            ),
            TaskStatus::InProgress => matches!(
                to,
                TaskStatus::Pending | TaskStatus::Completed | TaskStatus::Archived
            ),
            TaskStatus::Completed => matches!(to, TaskStatus::Archived),
            TaskStatus::Archived => false,
        }
    }

    /// Pending or in progress: the statuses the planner considers.
    pub fn is_open(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Archived => "archived",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" | "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "archived" => Ok(TaskStatus::Archived),
            other => Err(ValidationError::InvalidValue {
                field: "status",
                message: format!("unknown status '{other}'"),
            }),
        }
    }
}

/// A to-do item owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Task {
    /// Create a pending task with a fresh id.
    ///
    /// # Errors
    /// Returns an error if `title` is blank.
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        priority: TaskPriority,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            title,
            description: None,
            priority,
            status: TaskStatus::Pending,
            due_date: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
        })
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Whole days elapsed since creation (truncated).
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.created_at).num_days()
    }

    /// Move to in-progress. Returns false if the transition is not allowed.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        self.transition(TaskStatus::InProgress, now)
    }

    /// Mark completed at `now`. Returns false if already completed or archived.
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if !self.transition(TaskStatus::Completed, now) {
            return false;
        }
        self.completed_at = Some(now);
        true
    }

    pub fn archive(&mut self, now: DateTime<Utc>) -> bool {
        self.transition(TaskStatus::Archived, now)
    }

    fn transition(&mut self, to: TaskStatus, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(&to) {
            return false;
        }
        self.status = to;
        self.updated_at = now;
        true
    }
}
