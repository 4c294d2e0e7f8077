//! Core of the ideamarket idea-and-task tracker.
//! This crate owns the records, their persistence and the derived views;
//! presentation layers call into it and re-render from its results.

pub mod db;
pub mod input;
pub mod kv;
pub mod logging;
pub mod model;
pub mod provider;
pub mod service;

pub use input::{parse_budget, parse_timeline, split_list, InputError};
pub use kv::{KvError, KvResult, KvStore, MemoryKvStore, SqliteKvStore, IDEAS_KEY, TASKS_KEY};
pub use logging::{
    default_log_level, init_logging, logging_status, LogLevel, LogSettings, LoggingError,
};
pub use model::idea::{Idea, IdeaPatch, IdeaStage, IdeaValidationError, NewIdea};
pub use model::task::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
pub use model::RecordId;
pub use provider::{
    Clock, IdGenerator, Providers, SequentialIdGenerator, SystemClock, UuidIdGenerator,
};
pub use service::idea_store::{
    IdeaFilter, IdeaStore, MalformedDataPolicy, StoreConfig, StoreError, StoreResult,
    ALL_IDEAS, STORE_DB_FILE_NAME,
};
pub use service::views::{completion_percent, DashboardStats, TaskBoard, UNKNOWN_IDEA_LABEL};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
