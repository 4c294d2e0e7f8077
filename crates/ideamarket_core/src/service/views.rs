//! Read-only projections over the idea store.
//!
//! Nothing here is persisted; every view is recomputed from the current
//! collections on each call.

use crate::kv::KvStore;
use crate::model::task::{Task, TaskStatus};
use crate::service::idea_store::{IdeaFilter, IdeaStore};

/// Label shown for a task whose idea no longer exists.
pub const UNKNOWN_IDEA_LABEL: &str = "Unknown";

/// Headline counters for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_ideas: usize,
    /// Ideas not yet in the `market` stage.
    pub active_projects: usize,
    /// Completed tasks across every idea.
    pub completed_tasks: usize,
}

/// Tasks grouped into the three board columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskBoard<'a> {
    pub todo: Vec<&'a Task>,
    pub in_progress: Vec<&'a Task>,
    pub completed: Vec<&'a Task>,
}

impl<'a> TaskBoard<'a> {
    pub fn column(&self, status: TaskStatus) -> &[&'a Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Completed => &self.completed,
        }
    }

    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rounded completion percentage; 0 when there are no tasks.
///
/// Rounds halves up, so 1 of 8 is 13 and 2 of 3 is 67.
pub fn completion_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    ((200 * completed + total) / (2 * total)) as u8
}

impl<K: KvStore> IdeaStore<K> {
    /// Completion percentage of the tasks attached to `idea_id`.
    pub fn progress_percent(&self, idea_id: &str) -> u8 {
        let tasks = self.tasks_for_idea(idea_id);
        let completed = tasks.iter().filter(|task| task.is_completed()).count();
        completion_percent(completed, tasks.len())
    }

    pub fn dashboard_stats(&self) -> DashboardStats {
        DashboardStats {
            total_ideas: self.ideas().len(),
            active_projects: self.ideas().iter().filter(|idea| idea.is_active()).count(),
            completed_tasks: self.tasks().iter().filter(|task| task.is_completed()).count(),
        }
    }

    /// Splits tasks into board columns, narrowed by `filter`.
    pub fn task_board(&self, filter: &IdeaFilter) -> TaskBoard<'_> {
        TaskBoard {
            todo: self.tasks_by_status(TaskStatus::Todo, filter),
            in_progress: self.tasks_by_status(TaskStatus::InProgress, filter),
            completed: self.tasks_by_status(TaskStatus::Completed, filter),
        }
    }

    /// Name of the idea a task belongs to, or `"Unknown"` for a dangling id.
    pub fn idea_name_for_task(&self, task: &Task) -> &str {
        self.idea(&task.idea_id)
            .map_or(UNKNOWN_IDEA_LABEL, |idea| idea.name.as_str())
    }
}
