use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use futures::lock::Mutex;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::book::{INITIAL_COUNTER, TaskBook};
use crate::config::StorageKeys;
use crate::storage::{Storage, StorageError};
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// A newer snapshot for the same key was committed first; this one was
    /// dropped.
    Superseded,
}

/// Serializes the writes for one storage key. Every staged write gets the
/// next sequence number; commits pass through a single gate and only a
/// snapshot newer than the last committed one reaches storage.
pub struct KeyWriter {
    key: String,
    storage: Rc<dyn Storage>,
    issued: Cell<u64>,
    committed: Cell<u64>,
    gate: Mutex<()>,
}

impl fmt::Debug for KeyWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyWriter")
            .field("key", &self.key)
            .field("issued", &self.issued.get())
            .field("committed", &self.committed.get())
            .finish()
    }
}

impl KeyWriter {
    pub fn new(key: impl Into<String>, storage: Rc<dyn Storage>) -> Rc<Self> {
        Rc::new(Self {
            key: key.into(),
            storage,
            issued: Cell::new(0),
            committed: Cell::new(0),
            gate: Mutex::new(()),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn last_committed(&self) -> u64 {
        self.committed.get()
    }

    pub fn stage(self: &Rc<Self>, value: String) -> PendingWrite {
        let seq = self.issued.get() + 1;
        self.issued.set(seq);
        PendingWrite {
            writer: Rc::clone(self),
            seq,
            value,
        }
    }
}

/// A serialized snapshot waiting to be written. Dropping it without calling
/// [`PendingWrite::commit`] discards the write.
#[must_use = "a pending write does nothing until committed"]
#[derive(Debug)]
pub struct PendingWrite {
    writer: Rc<KeyWriter>,
    seq: u64,
    value: String,
}

impl PendingWrite {
    pub fn key(&self) -> &str {
        &self.writer.key
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Writes the snapshot unless a newer one for the same key already
    /// landed. A failed write does not advance the committed mark, so an
    /// older snapshot committed afterwards can still reach storage.
    #[tracing::instrument(skip(self), fields(key = %self.writer.key, seq = self.seq))]
    pub async fn commit(self) -> Result<WriteOutcome, StorageError> {
        let _gate = self.writer.gate.lock().await;

        if self.seq <= self.writer.committed.get() {
            debug!(committed = self.writer.committed.get(), "dropping stale snapshot");
            return Ok(WriteOutcome::Superseded);
        }

        self.writer.storage.set(&self.writer.key, &self.value).await?;
        self.writer.committed.set(self.seq);
        debug!(bytes = self.value.len(), "committed snapshot");
        Ok(WriteOutcome::Written)
    }
}

/// Loads the task book from storage and stages full-snapshot writes back.
pub struct TaskStore {
    storage: Rc<dyn Storage>,
    tasks: Rc<KeyWriter>,
    counter: Rc<KeyWriter>,
}

impl fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.tasks)
            .field("counter", &self.counter)
            .finish()
    }
}

impl TaskStore {
    pub fn new(storage: Rc<dyn Storage>, keys: &StorageKeys) -> Self {
        Self {
            tasks: KeyWriter::new(keys.tasks_key.clone(), Rc::clone(&storage)),
            counter: KeyWriter::new(keys.counter_key.clone(), Rc::clone(&storage)),
            storage,
        }
    }

    pub fn tasks_writer(&self) -> &Rc<KeyWriter> {
        &self.tasks
    }

    pub fn counter_writer(&self) -> &Rc<KeyWriter> {
        &self.counter
    }

    /// Absent keys load as an empty collection and an initial counter. Only
    /// a failure on the tasks key is an error; an unreadable counter is
    /// logged and rebuilt from the stored ids.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) -> Result<TaskBook, StorageError> {
        let tasks: Vec<Task> = self.read_json(self.tasks.key()).await?.unwrap_or_default();
        let counter: Option<u64> = match self.read_json(self.counter.key()).await {
            Ok(counter) => counter,
            Err(err) => {
                error!(key = self.counter.key(), error = %err, "unreadable id counter; rebuilding from tasks");
                None
            }
        };

        let book = TaskBook::from_parts(tasks, counter);
        info!(
            count = book.len(),
            next_id = book.next_id(),
            "loaded task book"
        );
        Ok(book)
    }

    /// Like [`TaskStore::load`], but a failure is logged and an empty book is
    /// returned, so "no data yet" and "failed to load" look the same.
    pub async fn load_or_default(&self) -> TaskBook {
        match self.load().await {
            Ok(book) => book,
            Err(err) => {
                error!(error = %err, "failed to load tasks; starting empty");
                TaskBook::default()
            }
        }
    }

    #[tracing::instrument(skip(self, book), fields(count = book.len()))]
    pub fn stage_tasks(&self, book: &TaskBook) -> Result<PendingWrite, StorageError> {
        let value = serde_json::to_string(book.tasks())?;
        Ok(self.tasks.stage(value))
    }

    /// The counter is only written once it has moved past its initial value,
    /// so a default never overwrites a stored counter.
    pub fn stage_counter(&self, book: &TaskBook) -> Option<PendingWrite> {
        (book.next_id() > INITIAL_COUNTER).then(|| self.counter.stage(book.next_id().to_string()))
    }

    /// Stages every write a mutation of `book` requires.
    pub fn stage(&self, book: &TaskBook) -> Result<Vec<PendingWrite>, StorageError> {
        let mut writes = vec![self.stage_tasks(book)?];
        writes.extend(self.stage_counter(book));
        Ok(writes)
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.storage.get(key).await? else {
            debug!(key, "key absent");
            return Ok(None);
        };
        if raw.trim().is_empty() {
            debug!(key, "key empty");
            return Ok(None);
        }

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Decode {
                key: key.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::storage::MemoryStorage;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
    }

    fn store_over(storage: &Rc<MemoryStorage>) -> TaskStore {
        let dyn_storage: Rc<dyn Storage> = storage.clone();
        TaskStore::new(dyn_storage, &StorageKeys::default())
    }

    #[tokio::test]
    async fn empty_storage_loads_default_book() {
        let storage = Rc::new(MemoryStorage::new());
        let book = store_over(&storage).load().await.expect("load");
        assert_eq!(book, TaskBook::default());
    }

    #[tokio::test]
    async fn undecodable_tasks_are_an_error() {
        let storage = Rc::new(MemoryStorage::with_entries([("todos-v3", "{not json")]));
        let store = store_over(&storage);

        let err = store.load().await.expect_err("decode failure");
        assert!(matches!(err, StorageError::Decode { ref key, .. } if key == "todos-v3"));
        assert_eq!(store.load_or_default().await, TaskBook::default());
    }

    #[tokio::test]
    async fn garbage_counter_keeps_stored_tasks() {
        let mut seeded = TaskBook::default();
        for title in ["a", "b", "c", "keep me"] {
            seeded.create(title, day()).expect("created");
        }
        let tasks_json = serde_json::to_string(seeded.tasks()).expect("encode");
        let storage = Rc::new(MemoryStorage::with_entries([
            ("todos-v3", tasks_json.as_str()),
            ("nextId-v3", "garbage"),
        ]));
        let store = store_over(&storage);

        let mut book = store.load_or_default().await;
        assert_eq!(book.len(), 4);
        assert_eq!(book.next_id(), 5);

        let id = book.create("new", day()).expect("created");
        assert_eq!(id, 5);
        for write in store.stage(&book).expect("stage") {
            write.commit().await.expect("commit");
        }

        let stored: Vec<Task> =
            serde_json::from_str(&storage.snapshot()["todos-v3"]).expect("decode stored tasks");
        assert_eq!(stored.len(), 5);
        assert!(stored.iter().any(|t| t.title == "keep me" && t.id == 4));
        assert_eq!(storage.snapshot().get("nextId-v3").map(String::as_str), Some("6"));
    }

    /// Refuses to store one particular value.
    struct RejectingStorage {
        inner: MemoryStorage,
        reject: String,
    }

    #[async_trait::async_trait(?Send)]
    impl Storage for RejectingStorage {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if value == self.reject {
                return Err(StorageError::Write {
                    key: key.to_string(),
                    message: "quota exceeded".to_string(),
                });
            }
            self.inner.set(key, value).await
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_older_snapshot_committable() {
        let mut book = TaskBook::default();
        book.create("one", day()).expect("created");
        let older_json = serde_json::to_string(book.tasks()).expect("encode");
        book.create("two", day()).expect("created");
        let newer_json = serde_json::to_string(book.tasks()).expect("encode");

        let storage = Rc::new(RejectingStorage {
            inner: MemoryStorage::new(),
            reject: newer_json,
        });
        let writer = KeyWriter::new("todos-v3", storage.clone());
        let older = writer.stage(older_json.clone());
        let newer = writer.stage(storage.reject.clone());

        assert!(matches!(newer.commit().await, Err(StorageError::Write { .. })));
        assert_eq!(writer.last_committed(), 0);
        assert_eq!(older.commit().await.expect("commit"), WriteOutcome::Written);
        assert_eq!(
            storage.inner.snapshot().get("todos-v3").map(String::as_str),
            Some(older_json.as_str())
        );
    }

    #[tokio::test]
    async fn counter_is_not_written_while_initial() {
        let storage = Rc::new(MemoryStorage::new());
        let store = store_over(&storage);
        let mut book = TaskBook::default();

        assert!(store.stage_counter(&book).is_none());
        assert_eq!(store.stage(&book).expect("stage").len(), 1);

        book.create("first", day()).expect("created");
        let writes = store.stage(&book).expect("stage");
        assert_eq!(writes.len(), 2);
        for write in writes {
            assert_eq!(write.commit().await.expect("commit"), WriteOutcome::Written);
        }
        assert_eq!(storage.snapshot().get("nextId-v3").map(String::as_str), Some("2"));
        assert_eq!(store.counter_writer().key(), "nextId-v3");
        assert_eq!(store.counter_writer().last_committed(), 1);
    }

    #[tokio::test]
    async fn out_of_order_commits_keep_latest_snapshot() {
        let storage = Rc::new(MemoryStorage::new());
        let store = store_over(&storage);
        let mut book = TaskBook::default();

        book.create("one", day()).expect("created");
        let older = store.stage_tasks(&book).expect("stage");
        book.create("two", day()).expect("created");
        let newer = store.stage_tasks(&book).expect("stage");
        assert!(newer.seq() > older.seq());

        assert_eq!(newer.commit().await.expect("commit"), WriteOutcome::Written);
        assert_eq!(older.commit().await.expect("commit"), WriteOutcome::Superseded);

        let reloaded = store.load().await.expect("load");
        assert_eq!(reloaded.len(), 2);
        assert_eq!(store.tasks_writer().last_committed(), 2);
    }

    #[tokio::test]
    async fn concurrent_commits_resolve_to_latest() {
        let storage = Rc::new(MemoryStorage::new());
        let store = store_over(&storage);
        let mut book = TaskBook::default();

        let mut writes = Vec::new();
        for title in ["a", "b", "c"] {
            book.create(title, day()).expect("created");
            writes.push(store.stage_tasks(&book).expect("stage"));
        }
        writes.reverse();

        let outcomes = futures::future::join_all(writes.into_iter().map(PendingWrite::commit)).await;
        let written = outcomes
            .iter()
            .filter(|o| matches!(o, Ok(WriteOutcome::Written)))
            .count();
        assert_eq!(written, 1);
        assert_eq!(store.load().await.expect("load").len(), 3);
    }
}
