/// Record store: whole-collection load/save over a `StorageBackend`
///
/// Each collection is a single JSON array. Every access to a collection goes
/// through that collection's async mutex, so a `mutate` (load, change, save)
/// is observed by other callers as one step. `mutate_pair` holds two locks,
/// always taken in declaration order: users, then posts, then comments.
use super::backend::StorageBackend;
use super::retry::{with_retry, RetryConfig};
use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Users,
    Posts,
    Comments,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Posts => "posts",
            Collection::Comments => "comments",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Default)]
struct CollectionLocks {
    users: Mutex<()>,
    posts: Mutex<()>,
    comments: Mutex<()>,
}

impl CollectionLocks {
    fn get(&self, collection: Collection) -> &Mutex<()> {
        match collection {
            Collection::Users => &self.users,
            Collection::Posts => &self.posts,
            Collection::Comments => &self.comments,
        }
    }
}

pub struct RecordStore {
    backend: Arc<dyn StorageBackend>,
    locks: CollectionLocks,
    retry: RetryConfig,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_retry(backend, RetryConfig::default())
    }

    pub fn with_retry(backend: Arc<dyn StorageBackend>, retry: RetryConfig) -> Self {
        Self {
            backend,
            locks: CollectionLocks::default(),
            retry,
        }
    }

    /// Whole collection in stored order. Absent blob → empty vector.
    pub async fn load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let _guard = self.locks.get(collection).lock().await;
        self.read_unlocked(collection).await
    }

    /// Overwrite the whole collection.
    pub async fn save<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<()> {
        let _guard = self.locks.get(collection).lock().await;
        self.write_unlocked(collection, records).await
    }

    /// Load, apply `f`, save, all under the collection lock.
    ///
    /// When `f` fails nothing is written and its error is returned.
    pub async fn mutate<T, R, F>(&self, collection: Collection, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> Result<R>,
    {
        let _guard = self.locks.get(collection).lock().await;
        let mut records = self.read_unlocked(collection).await?;
        let outcome = f(&mut records)?;
        self.write_unlocked(collection, &records).await?;
        Ok(outcome)
    }

    /// Load two collections, apply `f` to both, save both, under both locks.
    ///
    /// A collection `f` leaves unchanged is not rewritten. When the write of
    /// `second` fails, `first` is put back as it was before the error is
    /// returned, so callers see all of `f` or none of it.
    pub async fn mutate_pair<A, B, R, F>(&self, first: Collection, second: Collection, f: F) -> Result<R>
    where
        A: Serialize + DeserializeOwned,
        B: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<A>, &mut Vec<B>) -> Result<R>,
    {
        if first == second {
            return Err(AppError::Internal(format!(
                "collection '{}' cannot be paired with itself",
                first
            )));
        }

        let (outer, inner) = if first < second { (first, second) } else { (second, first) };
        let _outer = self.locks.get(outer).lock().await;
        let _inner = self.locks.get(inner).lock().await;

        let first_raw = self.read_raw(first).await?;
        let second_raw = self.read_raw(second).await?;
        let mut first_records: Vec<A> = decode(first, first_raw.as_deref())?;
        let mut second_records: Vec<B> = decode(second, second_raw.as_deref())?;

        let outcome = f(&mut first_records, &mut second_records)?;

        let first_body = serde_json::to_string_pretty(&first_records)?;
        let second_body = serde_json::to_string_pretty(&second_records)?;
        let first_changed = first_raw.as_deref() != Some(first_body.as_str());
        let second_changed = second_raw.as_deref() != Some(second_body.as_str());

        if first_changed {
            self.write_body(first, &first_body, first_records.len()).await?;
        }
        if second_changed {
            if let Err(e) = self.write_body(second, &second_body, second_records.len()).await {
                if first_changed {
                    self.restore(first, first_raw.as_deref()).await;
                }
                return Err(e);
            }
        }
        Ok(outcome)
    }

    pub async fn check_health(&self) -> Result<()> {
        self.backend.check().await.map_err(AppError::from)
    }

    async fn read_raw(&self, collection: Collection) -> Result<Option<String>> {
        let name = collection.name();
        Ok(with_retry(&self.retry, "load", || self.backend.read(name)).await?)
    }

    async fn read_unlocked<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let raw = self.read_raw(collection).await?;
        decode(collection, raw.as_deref())
    }

    async fn write_unlocked<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<()> {
        let body = serde_json::to_string_pretty(records)?;
        self.write_body(collection, &body, records.len()).await
    }

    async fn write_body(&self, collection: Collection, body: &str, records: usize) -> Result<()> {
        let name = collection.name();
        with_retry(&self.retry, "save", || self.backend.write(name, body)).await?;
        tracing::debug!(collection = name, records, "Collection saved");
        Ok(())
    }

    /// Put back a collection's previous contents. An absent blob comes back
    /// as an empty array, which loads the same way.
    async fn restore(&self, collection: Collection, original: Option<&str>) {
        let name = collection.name();
        let body = original.unwrap_or("[]");
        match with_retry(&self.retry, "restore", || self.backend.write(name, body)).await {
            Ok(()) => tracing::warn!(collection = name, "Collection restored after a failed paired write"),
            Err(e) => tracing::error!(
                collection = name,
                error = %e,
                "Failed to restore collection after a failed paired write"
            ),
        }
    }
}

fn decode<T: DeserializeOwned>(collection: Collection, raw: Option<&str>) -> Result<Vec<T>> {
    match raw {
        None => Ok(Vec::new()),
        Some(contents) if contents.trim().is_empty() => Ok(Vec::new()),
        Some(contents) => serde_json::from_str(contents).map_err(|e| {
            AppError::StorageError(format!("collection '{}' is unreadable: {}", collection, e))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::backend::testing::RejectingBackend;
    use crate::db::backend::{JsonFileBackend, MemoryBackend};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u32,
        name: String,
    }

    fn row(id: u32, name: &str) -> Row {
        Row {
            id,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_load_absent_collection_is_empty() {
        let store = RecordStore::new(Arc::new(MemoryBackend::new()));
        let rows: Vec<Row> = store.load(Collection::Posts).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_order() {
        let store = RecordStore::new(Arc::new(MemoryBackend::new()));
        let rows = vec![row(2, "b"), row(1, "a")];
        store.save(Collection::Posts, &rows).await.unwrap();

        let loaded: Vec<Row> = store.load(Collection::Posts).await.unwrap();
        assert_eq!(loaded, rows);
    }

    #[tokio::test]
    async fn test_file_store_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("data");
        let store = RecordStore::new(Arc::new(JsonFileBackend::new(&dir)));

        store.save(Collection::Users, &[row(1, "a")]).await.unwrap();

        assert!(dir.join("users.json").exists());
        let loaded: Vec<Row> = store.load(Collection::Users).await.unwrap();
        assert_eq!(loaded, vec![row(1, "a")]);
    }

    #[tokio::test]
    async fn test_failed_mutation_writes_nothing() {
        let backend = Arc::new(MemoryBackend::new());
        let store = RecordStore::new(backend.clone());
        store.save(Collection::Comments, &[row(1, "keep")]).await.unwrap();

        let result: Result<()> = store
            .mutate(Collection::Comments, |rows: &mut Vec<Row>| {
                rows.clear();
                Err(AppError::Forbidden("nope".into()))
            })
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        let loaded: Vec<Row> = store.load(Collection::Comments).await.unwrap();
        assert_eq!(loaded, vec![row(1, "keep")]);
    }

    #[tokio::test]
    async fn test_unreadable_collection_is_storage_error() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_raw("posts", "{not json").await;
        let store = RecordStore::new(backend);

        let result: Result<Vec<Row>> = store.load(Collection::Posts).await;
        assert!(matches!(result, Err(AppError::StorageError(_))));
    }

    #[tokio::test]
    async fn test_concurrent_mutations_do_not_lose_updates() {
        let store = Arc::new(RecordStore::new(Arc::new(MemoryBackend::new())));

        let mut handles = Vec::new();
        for i in 0..20u32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .mutate(Collection::Posts, move |rows: &mut Vec<Row>| {
                        rows.push(row(i, "n"));
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rows: Vec<Row> = store.load(Collection::Posts).await.unwrap();
        assert_eq!(rows.len(), 20);
    }

    #[tokio::test]
    async fn test_pair_restores_first_when_second_write_fails() {
        let backend = Arc::new(RejectingBackend::new());
        let store = RecordStore::new(backend.clone());
        store.save(Collection::Posts, &[row(1, "post")]).await.unwrap();
        store
            .save(Collection::Comments, &[row(10, "a"), row(11, "b")])
            .await
            .unwrap();
        backend.reject_writes("comments");

        let result: Result<()> = store
            .mutate_pair(
                Collection::Posts,
                Collection::Comments,
                |posts: &mut Vec<Row>, comments: &mut Vec<Row>| {
                    posts.clear();
                    comments.clear();
                    Ok(())
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::StorageError(_))));
        let posts: Vec<Row> = store.load(Collection::Posts).await.unwrap();
        assert_eq!(posts, vec![row(1, "post")]);
        let comments: Vec<Row> = store.load(Collection::Comments).await.unwrap();
        assert_eq!(comments, vec![row(10, "a"), row(11, "b")]);
    }

    #[tokio::test]
    async fn test_pair_restores_absent_first_collection_as_empty() {
        let backend = Arc::new(RejectingBackend::new());
        let store = RecordStore::new(backend.clone());
        backend.reject_writes("posts");

        let result: Result<()> = store
            .mutate_pair(
                Collection::Users,
                Collection::Posts,
                |users: &mut Vec<Row>, posts: &mut Vec<Row>| {
                    users.push(row(1, "u"));
                    posts.push(row(2, "p"));
                    Ok(())
                },
            )
            .await;

        assert!(result.is_err());
        let users: Vec<Row> = store.load(Collection::Users).await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_pair_leaves_unchanged_collection_unwritten() {
        let backend = Arc::new(RejectingBackend::new());
        let store = RecordStore::new(backend.clone());
        store.save(Collection::Posts, &[row(1, "post")]).await.unwrap();
        backend.reject_writes("posts");

        let count = store
            .mutate_pair(
                Collection::Posts,
                Collection::Comments,
                |posts: &mut Vec<Row>, comments: &mut Vec<Row>| {
                    comments.push(row(10, "on post"));
                    Ok(posts.len())
                },
            )
            .await
            .unwrap();

        assert_eq!(count, 1);
        let comments: Vec<Row> = store.load(Collection::Comments).await.unwrap();
        assert_eq!(comments, vec![row(10, "on post")]);
    }

    #[tokio::test]
    async fn test_pair_rejects_same_collection_twice() {
        let store = RecordStore::new(Arc::new(MemoryBackend::new()));
        let result: Result<()> = store
            .mutate_pair(
                Collection::Posts,
                Collection::Posts,
                |_: &mut Vec<Row>, _: &mut Vec<Row>| Ok(()),
            )
            .await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_pairs_in_either_order_do_not_deadlock() {
        let store = Arc::new(RecordStore::new(Arc::new(MemoryBackend::new())));

        let mut handles = Vec::new();
        for i in 0..20u32 {
            let store = store.clone();
            let (first, second) = if i % 2 == 0 {
                (Collection::Posts, Collection::Comments)
            } else {
                (Collection::Comments, Collection::Posts)
            };
            handles.push(tokio::spawn(async move {
                store
                    .mutate_pair(first, second, move |a: &mut Vec<Row>, b: &mut Vec<Row>| {
                        a.push(row(i, "a"));
                        b.push(row(i, "b"));
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let posts: Vec<Row> = store.load(Collection::Posts).await.unwrap();
        let comments: Vec<Row> = store.load(Collection::Comments).await.unwrap();
        assert_eq!(posts.len(), 20);
        assert_eq!(comments.len(), 20);
    }
}
