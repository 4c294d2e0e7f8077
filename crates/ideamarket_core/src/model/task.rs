//! Task record model.
//!
//! # Invariants
//! - `idea_id` and `dependencies` are stored as given; nothing checks that
//!   they point at existing records.

use super::RecordId;
use crate::input::InputError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Board column a task sits in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Board column order.
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = InputError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| InputError::UnknownStatus(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for TaskPriority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = InputError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == normalized)
            .ok_or_else(|| InputError::UnknownPriority(value.to_string()))
    }
}

/// Stored unit of work attached to one idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub idea_id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub assignee: String,
    /// Free-form date text as entered; empty when unset.
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub dependencies: Vec<RecordId>,
}

impl Task {
    pub(crate) fn from_new(id: RecordId, created_at: i64, fields: NewTask) -> Self {
        Self {
            id,
            created_at,
            idea_id: fields.idea_id,
            name: fields.name,
            description: fields.description,
            priority: fields.priority,
            status: fields.status,
            assignee: fields.assignee,
            due_date: fields.due_date,
            dependencies: fields.dependencies,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Caller-supplied fields for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub idea_id: RecordId,
    pub name: String,
    pub description: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub assignee: String,
    pub due_date: String,
    pub dependencies: Vec<RecordId>,
}

impl NewTask {
    pub fn for_idea(idea_id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            idea_id: idea_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}

/// Partial task update. `Some` overwrites, `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub idea_id: Option<RecordId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub assignee: Option<String>,
    pub due_date: Option<String>,
    pub dependencies: Option<Vec<RecordId>>,
}

impl TaskPatch {
    /// Patch that only moves the task to another board column.
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, task: &mut Task) {
        if let Some(idea_id) = self.idea_id {
            task.idea_id = idea_id;
        }
        if let Some(name) = self.name {
            task.name = name;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assignee) = self.assignee {
            task.assignee = assignee;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(dependencies) = self.dependencies {
            task.dependencies = dependencies;
        }
    }
}
