use ideamarket_core::{
    IdeaPatch, IdeaStage, IdeaStore, IdeaValidationError, KvError, KvResult, KvStore, MalformedDataPolicy,
    MemoryKvStore, NewIdea, NewTask, SqliteKvStore, StoreConfig, StoreError, TaskStatus,
    IDEAS_KEY, STORE_DB_FILE_NAME, TASKS_KEY,
};
use std::cell::Cell;
use std::rc::Rc;

/// Memory store whose writes can be switched off from outside the store.
struct SwitchableKv {
    inner: MemoryKvStore,
    writable: Rc<Cell<bool>>,
}

impl SwitchableKv {
    fn new() -> (Self, Rc<Cell<bool>>) {
        let writable = Rc::new(Cell::new(true));
        let kv = Self {
            inner: MemoryKvStore::new(),
            writable: Rc::clone(&writable),
        };
        (kv, writable)
    }

    fn check(&self) -> KvResult<()> {
        if self.writable.get() {
            Ok(())
        } else {
            Err(KvError::Unavailable("quota exceeded".to_string()))
        }
    }
}

impl KvStore for SwitchableKv {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &str, value: &[u8]) -> KvResult<()> {
        self.check()?;
        self.inner.put(key, value)
    }

    fn put_all(&mut self, entries: &[(&str, &[u8])]) -> KvResult<()> {
        self.check()?;
        self.inner.put_all(entries)
    }
}

fn seed(store: &mut IdeaStore<impl KvStore>) {
    let idea = store
        .add_idea(NewIdea {
            budget: 2_500.5,
            tags: vec!["retail".to_string()],
            team_members: vec!["ana".to_string()],
            ..NewIdea::named("Kiosk")
        })
        .unwrap();
    store.add_idea(NewIdea::named("Snack box")).unwrap();
    store
        .add_task(NewTask {
            dependencies: vec!["not-a-task".to_string()],
            ..NewTask::for_idea(idea.id.clone(), "Lease").with_status(TaskStatus::InProgress)
        })
        .unwrap();
    store
        .add_task(NewTask::for_idea(idea.id, "Permits"))
        .unwrap();
}

#[test]
fn reload_from_memory_kv_yields_equal_collections() {
    let mut store = IdeaStore::load(MemoryKvStore::new()).unwrap();
    seed(&mut store);
    let ideas = store.ideas().to_vec();
    let tasks = store.tasks().to_vec();

    let reloaded = IdeaStore::load(store.into_kv()).unwrap();

    assert_eq!(reloaded.ideas(), ideas.as_slice());
    assert_eq!(reloaded.tasks(), tasks.as_slice());
}

#[test]
fn reload_from_sqlite_file_yields_equal_collections() {
    let dir = tempfile::tempdir().unwrap();

    let mut store = IdeaStore::open_in_dir(dir.path(), StoreConfig::default()).unwrap();
    seed(&mut store);
    let ideas = store.ideas().to_vec();
    let tasks = store.tasks().to_vec();
    drop(store);

    assert!(dir.path().join(STORE_DB_FILE_NAME).exists());
    let reopened = IdeaStore::open_in_dir(dir.path(), StoreConfig::default()).unwrap();
    assert_eq!(reopened.ideas(), ideas.as_slice());
    assert_eq!(reopened.tasks(), tasks.as_slice());
}

#[test]
fn absent_keys_load_as_empty_collections() {
    let store = IdeaStore::load(MemoryKvStore::new()).unwrap();

    assert!(store.ideas().is_empty());
    assert!(store.tasks().is_empty());
    assert!(store.kv().is_empty());
}

#[test]
fn every_mutation_is_written_before_returning() {
    let mut store = IdeaStore::load(MemoryKvStore::new()).unwrap();
    let idea = store.add_idea(NewIdea::named("Kiosk")).unwrap();
    store
        .update_idea(
            &idea.id,
            IdeaPatch {
                notes: Some("call landlord".to_string()),
                ..IdeaPatch::default()
            },
        )
        .unwrap();
    store.add_task(NewTask::for_idea(idea.id.clone(), "Lease")).unwrap();

    let stored: serde_json::Value =
        serde_json::from_slice(&store.kv().get(IDEAS_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored[0]["notes"], "call landlord");
    assert_eq!(stored[0]["id"], idea.id.as_str());

    let stored_tasks: serde_json::Value =
        serde_json::from_slice(&store.kv().get(TASKS_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored_tasks[0]["ideaId"], idea.id.as_str());
    assert_eq!(stored_tasks[0]["status"], "todo");
}

#[test]
fn failed_writes_leave_memory_and_storage_unchanged() {
    let (kv, writable) = SwitchableKv::new();
    let mut store = IdeaStore::load(kv).unwrap();
    seed(&mut store);
    let ideas = store.ideas().to_vec();
    let tasks = store.tasks().to_vec();
    let kiosk = ideas[0].id.clone();
    let lease = tasks[0].id.clone();

    writable.set(false);

    assert!(matches!(
        store.add_idea(NewIdea::named("Nope")),
        Err(StoreError::Persistence(_))
    ));
    assert!(matches!(
        store.update_idea(
            &kiosk,
            IdeaPatch {
                stage: Some(IdeaStage::Market),
                ..IdeaPatch::default()
            }
        ),
        Err(StoreError::Persistence(_))
    ));
    assert!(matches!(
        store.delete_idea(&kiosk),
        Err(StoreError::Persistence(_))
    ));
    assert!(matches!(
        store.set_task_status(&lease, TaskStatus::Completed),
        Err(StoreError::Persistence(_))
    ));
    assert!(matches!(
        store.delete_task(&lease),
        Err(StoreError::Persistence(_))
    ));

    assert_eq!(store.ideas(), ideas.as_slice());
    assert_eq!(store.tasks(), tasks.as_slice());

    writable.set(true);
    let reloaded = IdeaStore::load(store.into_kv()).unwrap();
    assert_eq!(reloaded.ideas(), ideas.as_slice());
    assert_eq!(reloaded.tasks(), tasks.as_slice());
}

#[test]
fn no_op_mutations_do_not_touch_storage() {
    let (kv, writable) = SwitchableKv::new();
    let mut store = IdeaStore::load(kv).unwrap();
    writable.set(false);

    assert!(store
        .update_idea("missing", IdeaPatch::default())
        .unwrap()
        .is_none());
    store.delete_idea("missing").unwrap();
    store.delete_task("missing").unwrap();
}

#[test]
fn sqlite_quota_exhaustion_surfaces_as_persistence_failure() {
    let kv = SqliteKvStore::open_in_memory().unwrap();
    kv.connection()
        .query_row("PRAGMA max_page_count = 1;", [], |row| row.get::<_, i64>(0))
        .unwrap();
    let mut store = IdeaStore::load(kv).unwrap();

    let err = store
        .add_idea(NewIdea {
            notes: "x".repeat(256 * 1024),
            ..NewIdea::named("Huge")
        })
        .unwrap_err();

    match &err {
        StoreError::Persistence(KvError::Db(db)) => assert!(db.is_storage_full()),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("quota"));
    assert!(store.ideas().is_empty());
    assert_eq!(store.into_kv().get(IDEAS_KEY).unwrap(), None);
}

#[test]
fn malformed_data_fails_fast_by_default() {
    let mut kv = MemoryKvStore::new();
    kv.put(IDEAS_KEY, b"{not json").unwrap();

    let err = match IdeaStore::load(kv) {
        Err(err) => err,
        Ok(_) => panic!("malformed ideas must not load"),
    };
    assert!(matches!(err, StoreError::MalformedData { key: "ideas", .. }));
}

#[test]
fn wrong_shape_counts_as_malformed() {
    let mut kv = MemoryKvStore::new();
    kv.put(TASKS_KEY, br#"{"id":"1"}"#).unwrap();

    assert!(matches!(
        IdeaStore::load(kv),
        Err(StoreError::MalformedData { key: "tasks", .. })
    ));
}

#[test]
fn malformed_collection_can_reset_to_empty() {
    let mut seeded = IdeaStore::load(MemoryKvStore::new()).unwrap();
    seed(&mut seeded);
    let ideas = seeded.ideas().to_vec();
    let mut kv = seeded.into_kv();
    kv.put(TASKS_KEY, b"\xff\xfe").unwrap();

    let config = StoreConfig {
        on_malformed: MalformedDataPolicy::ResetToEmpty,
    };
    let mut store = IdeaStore::load_with(kv, config, Default::default()).unwrap();

    assert_eq!(store.ideas(), ideas.as_slice());
    assert!(store.tasks().is_empty());
    assert_eq!(
        store.kv().get(TASKS_KEY).unwrap().as_deref(),
        Some(&b"\xff\xfe"[..])
    );

    store
        .add_task(NewTask::for_idea(ideas[0].id.clone(), "fresh start"))
        .unwrap();
    let reloaded = IdeaStore::load(store.into_kv()).unwrap();
    assert_eq!(reloaded.tasks().len(), 1);
}

#[test]
fn non_finite_budget_is_rejected_before_writing() {
    let mut store = IdeaStore::load(MemoryKvStore::new()).unwrap();
    seed(&mut store);
    let ideas = store.ideas().to_vec();
    let stored_before = store.kv().get(IDEAS_KEY).unwrap();

    let err = store
        .add_idea(NewIdea {
            budget: f64::INFINITY,
            ..NewIdea::named("Moonshot")
        })
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(IdeaValidationError::NonFiniteBudget(_))
    ));

    let err = store
        .update_idea(
            &ideas[0].id,
            IdeaPatch {
                budget: Some(f64::NAN),
                ..IdeaPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    assert_eq!(store.ideas(), ideas.as_slice());
    assert_eq!(store.kv().get(IDEAS_KEY).unwrap(), stored_before);

    let reloaded = IdeaStore::load(store.into_kv()).unwrap();
    assert_eq!(reloaded.ideas(), ideas.as_slice());
}
