//! Idea/task store.
//!
//! # Responsibility
//! - Single owner of the idea and task collections for a session.
//! - CRUD with cascade from ideas to their tasks.
//! - Persist the full affected collection after each mutation.
//!
//! # Invariants
//! - Ids are unique within their collection and never reassigned.
//! - After `delete_idea` returns, no task references the deleted id.
//! - A failed write leaves memory exactly as it was before the call.
//! - Ideas are validated before writing, so everything written loads back.
//! - Update/delete of an unknown id is a silent no-op, not an error.
//! - Collections keep creation order.

use crate::kv::{KvError, KvStore, SqliteKvStore, IDEAS_KEY, TASKS_KEY};
use crate::model::idea::{Idea, IdeaPatch, IdeaValidationError, NewIdea};
use crate::model::task::{NewTask, Task, TaskPatch, TaskStatus};
use crate::model::RecordId;
use crate::provider::{IdGenerator, Providers};
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;

/// File name used by `IdeaStore::open_in_dir`.
pub const STORE_DB_FILE_NAME: &str = "ideamarket.sqlite3";

/// Sentinel accepted by `IdeaFilter::parse` for "every idea".
pub const ALL_IDEAS: &str = "all";

/// Extra id draws allowed beyond the number of stored records.
const ID_ATTEMPT_MARGIN: u32 = 8;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the idea store.
#[derive(Debug)]
pub enum StoreError {
    /// The key-value store failed to read or write.
    Persistence(KvError),
    /// A record holds a value the stored shape cannot represent.
    Validation(IdeaValidationError),
    /// A collection could not be serialized.
    Encode(serde_json::Error),
    /// Stored bytes do not decode into the expected collection shape.
    MalformedData {
        key: &'static str,
        source: serde_json::Error,
    },
    /// The id generator kept producing ids that are already taken.
    IdExhausted { attempts: u32 },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persistence(err) => write!(f, "persistence failed: {err}"),
            Self::Validation(err) => write!(f, "invalid record: {err}"),
            Self::Encode(err) => write!(f, "failed to encode collection: {err}"),
            Self::MalformedData { key, source } => {
                write!(f, "malformed stored data under `{key}`: {source}")
            }
            Self::IdExhausted { attempts } => {
                write!(f, "no unused id after {attempts} attempts")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::MalformedData { source, .. } => Some(source),
            Self::IdExhausted { .. } => None,
        }
    }
}

impl From<IdeaValidationError> for StoreError {
    fn from(value: IdeaValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<KvError> for StoreError {
    fn from(value: KvError) -> Self {
        Self::Persistence(value)
    }
}

/// What loading does when a stored collection cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedDataPolicy {
    /// Refuse to start; the stored bytes are left untouched.
    #[default]
    FailFast,
    /// Start that collection empty; the bad bytes are replaced on the next
    /// write to it.
    ResetToEmpty,
}

/// Load-time configuration for the idea store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub on_malformed: MalformedDataPolicy,
}

/// Restricts status views to one idea, or to none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IdeaFilter {
    #[default]
    All,
    Idea(RecordId),
}

impl IdeaFilter {
    /// Maps the board's filter value; `"all"` and blank mean no restriction.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == ALL_IDEAS {
            Self::All
        } else {
            Self::Idea(trimmed.to_string())
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Idea(idea_id) => task.idea_id == *idea_id,
        }
    }
}

impl From<Option<&str>> for IdeaFilter {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::All, Self::parse)
    }
}

/// Session-owned store of ideas and their tasks.
///
/// Construct one per session with `load`/`load_with` and hand it to whatever
/// needs it; there is no ambient global instance.
pub struct IdeaStore<K: KvStore> {
    kv: K,
    providers: Providers,
    ideas: Vec<Idea>,
    tasks: Vec<Task>,
}

impl IdeaStore<SqliteKvStore> {
    /// Opens the SQLite-backed store at `path` with default providers.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let kv = SqliteKvStore::open(path)?;
        Self::load_with(kv, config, Providers::default())
    }

    /// Opens `ideamarket.sqlite3` inside `dir`.
    pub fn open_in_dir(dir: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        Self::open(dir.as_ref().join(STORE_DB_FILE_NAME), config)
    }
}

impl<K: KvStore> IdeaStore<K> {
    /// Loads both collections with fail-fast decoding and system providers.
    pub fn load(kv: K) -> StoreResult<Self> {
        Self::load_with(kv, StoreConfig::default(), Providers::default())
    }

    /// Loads both collections from `kv`.
    ///
    /// An absent key yields an empty collection. Undecodable data follows
    /// `config.on_malformed`.
    pub fn load_with(kv: K, config: StoreConfig, providers: Providers) -> StoreResult<Self> {
        let started_at = Instant::now();
        let ideas = load_collection::<Idea, K>(&kv, IDEAS_KEY, config.on_malformed)?;
        let tasks = load_collection::<Task, K>(&kv, TASKS_KEY, config.on_malformed)?;
        info!(
            "event=store_load module=store status=ok ideas={} tasks={} duration_ms={}",
            ideas.len(),
            tasks.len(),
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            kv,
            providers,
            ideas,
            tasks,
        })
    }

    /// All ideas in creation order.
    pub fn ideas(&self) -> &[Idea] {
        &self.ideas
    }

    /// All tasks in creation order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Gives back the key-value store, dropping in-memory state.
    pub fn into_kv(self) -> K {
        self.kv
    }

    /// Adds an idea with a fresh id and creation time.
    pub fn add_idea(&mut self, fields: NewIdea) -> StoreResult<Idea> {
        let ideas = &self.ideas;
        let id = draw_id(self.providers.ids.as_mut(), ideas.len(), |candidate| {
            ideas.iter().any(|idea| idea.id == candidate)
        })?;
        let idea = Idea::from_new(id, self.providers.clock.now_ms(), fields);
        if let Err(err) = idea.validate() {
            warn!("event=idea_create module=store status=rejected id={} error={err}", idea.id);
            return Err(err.into());
        }

        let mut next = self.ideas.clone();
        next.push(idea.clone());
        self.commit_ideas(next, "idea_create", &idea.id)?;
        Ok(idea)
    }

    /// Merges `patch` over the idea with `id`.
    ///
    /// Returns `Ok(None)` without writing when no such idea exists.
    pub fn update_idea(&mut self, id: &str, patch: IdeaPatch) -> StoreResult<Option<Idea>> {
        let Some(index) = self.ideas.iter().position(|idea| idea.id == id) else {
            debug!("event=idea_update module=store status=not_found id={id}");
            return Ok(None);
        };

        let mut next = self.ideas.clone();
        patch.apply(&mut next[index]);
        if let Err(err) = next[index].validate() {
            warn!("event=idea_update module=store status=rejected id={id} error={err}");
            return Err(err.into());
        }
        let updated = next[index].clone();
        self.commit_ideas(next, "idea_update", id)?;
        Ok(Some(updated))
    }

    /// Deletes the idea with `id` and every task that references it.
    ///
    /// Both collections are written in one atomic batch. Deleting an unknown
    /// id with no referencing tasks writes nothing.
    pub fn delete_idea(&mut self, id: &str) -> StoreResult<()> {
        let next_ideas: Vec<Idea> = self
            .ideas
            .iter()
            .filter(|idea| idea.id != id)
            .cloned()
            .collect();
        let next_tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| task.idea_id != id)
            .cloned()
            .collect();

        let removed_tasks = self.tasks.len() - next_tasks.len();
        if next_ideas.len() == self.ideas.len() && removed_tasks == 0 {
            debug!("event=idea_delete module=store status=not_found id={id}");
            return Ok(());
        }

        let ideas_bytes = encode(&next_ideas)?;
        let tasks_bytes = encode(&next_tasks)?;
        let batch: [(&str, &[u8]); 2] = [
            (IDEAS_KEY, ideas_bytes.as_slice()),
            (TASKS_KEY, tasks_bytes.as_slice()),
        ];
        if let Err(err) = self.kv.put_all(&batch) {
            error!(
                "event=idea_delete module=store status=error id={id} error_code=persist_failed error={err}"
            );
            return Err(err.into());
        }

        self.ideas = next_ideas;
        self.tasks = next_tasks;
        info!("event=idea_delete module=store status=ok id={id} cascaded_tasks={removed_tasks}");
        Ok(())
    }

    /// Looks up one idea by id.
    pub fn idea(&self, id: &str) -> Option<&Idea> {
        self.ideas.iter().find(|idea| idea.id == id)
    }

    /// Adds a task with a fresh id and creation time.
    ///
    /// `idea_id` is stored as given, even if no such idea exists.
    pub fn add_task(&mut self, fields: NewTask) -> StoreResult<Task> {
        let tasks = &self.tasks;
        let id = draw_id(self.providers.ids.as_mut(), tasks.len(), |candidate| {
            tasks.iter().any(|task| task.id == candidate)
        })?;
        let task = Task::from_new(id, self.providers.clock.now_ms(), fields);

        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit_tasks(next, "task_create", &task.id)?;
        Ok(task)
    }

    /// Merges `patch` over the task with `id`; `Ok(None)` when absent.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> StoreResult<Option<Task>> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            debug!("event=task_update module=store status=not_found id={id}");
            return Ok(None);
        };

        let mut next = self.tasks.clone();
        patch.apply(&mut next[index]);
        let updated = next[index].clone();
        self.commit_tasks(next, "task_update", id)?;
        Ok(Some(updated))
    }

    /// Moves a task to another board column.
    pub fn set_task_status(&mut self, id: &str, status: TaskStatus) -> StoreResult<Option<Task>> {
        self.update_task(id, TaskPatch::status(status))
    }

    /// Deletes one task. Ideas are never affected.
    pub fn delete_task(&mut self, id: &str) -> StoreResult<()> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            debug!("event=task_delete module=store status=not_found id={id}");
            return Ok(());
        };

        let mut next = self.tasks.clone();
        next.remove(index);
        self.commit_tasks(next, "task_delete", id)
    }

    /// Looks up one task by id.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Tasks attached to `idea_id`, in creation order.
    pub fn tasks_for_idea(&self, idea_id: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.idea_id == idea_id)
            .collect()
    }

    /// Tasks in `status`, optionally narrowed to one idea, in creation order.
    pub fn tasks_by_status(&self, status: TaskStatus, filter: &IdeaFilter) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.status == status && filter.matches(task))
            .collect()
    }

    fn commit_ideas(&mut self, next: Vec<Idea>, event: &str, id: &str) -> StoreResult<()> {
        persist(&mut self.kv, IDEAS_KEY, &next, event, id)?;
        self.ideas = next;
        Ok(())
    }

    fn commit_tasks(&mut self, next: Vec<Task>, event: &str, id: &str) -> StoreResult<()> {
        persist(&mut self.kv, TASKS_KEY, &next, event, id)?;
        self.tasks = next;
        Ok(())
    }
}

fn load_collection<T, K>(
    kv: &K,
    key: &'static str,
    on_malformed: MalformedDataPolicy,
) -> StoreResult<Vec<T>>
where
    T: DeserializeOwned,
    K: KvStore,
{
    let bytes = match kv.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Ok(Vec::new()),
        Err(err) => {
            error!(
                "event=collection_load module=store status=error key={key} error_code=read_failed error={err}"
            );
            return Err(err.into());
        }
    };

    match serde_json::from_slice::<Vec<T>>(&bytes) {
        Ok(records) => Ok(records),
        Err(source) => match on_malformed {
            MalformedDataPolicy::FailFast => {
                error!(
                    "event=collection_load module=store status=error key={key} error_code=malformed_data bytes={} error={source}",
                    bytes.len()
                );
                Err(StoreError::MalformedData { key, source })
            }
            MalformedDataPolicy::ResetToEmpty => {
                warn!(
                    "event=collection_load module=store status=reset key={key} error_code=malformed_data bytes={} error={source}",
                    bytes.len()
                );
                Ok(Vec::new())
            }
        },
    }
}

fn persist<T, K>(
    kv: &mut K,
    key: &'static str,
    records: &[T],
    event: &str,
    id: &str,
) -> StoreResult<()>
where
    T: Serialize,
    K: KvStore,
{
    let bytes = encode(records)?;
    match kv.put(key, &bytes) {
        Ok(()) => {
            info!(
                "event={event} module=store status=ok id={id} key={key} records={}",
                records.len()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event={event} module=store status=error id={id} key={key} error_code=persist_failed error={err}"
            );
            Err(err.into())
        }
    }
}

fn encode<T: Serialize>(records: &[T]) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(records).map_err(StoreError::Encode)
}

/// Draws ids until one is free.
///
/// A generator restarted over `stored` records may replay every stored id
/// before reaching a free one, so the budget grows with the collection.
fn draw_id<F>(ids: &mut dyn IdGenerator, stored: usize, is_taken: F) -> StoreResult<RecordId>
where
    F: Fn(&str) -> bool,
{
    let attempts = u32::try_from(stored)
        .unwrap_or(u32::MAX)
        .saturating_add(ID_ATTEMPT_MARGIN);
    for _ in 0..attempts {
        let candidate = ids.next_id();
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
        warn!("event=id_draw module=store status=collision id={candidate}");
    }
    Err(StoreError::IdExhausted { attempts })
}
