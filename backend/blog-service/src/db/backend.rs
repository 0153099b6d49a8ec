/// Blob storage backends for the record store
///
/// A backend only knows how to read and replace a named blob of text. The
/// JSON encoding, locking and retries live in `RecordStore`.
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use tokio::sync::RwLock;
use uuid::Uuid;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Returns `Ok(None)` when the blob, or the directory holding it, is absent.
    async fn read(&self, name: &str) -> io::Result<Option<String>>;

    /// Replaces the blob, creating any missing container first.
    async fn write(&self, name: &str, contents: &str) -> io::Result<()>;

    /// Cheap probe used by the health endpoint
    async fn check(&self) -> io::Result<()> {
        Ok(())
    }
}

/// One pretty-printed `<name>.json` file per collection under `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl StorageBackend for JsonFileBackend {
    async fn read(&self, name: &str) -> io::Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(name)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, name: &str, contents: &str) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write beside the target, then rename over it: readers see either
        // the old array or the new one.
        let target = self.path_for(name);
        let tmp = self
            .dir
            .join(format!(".{}.json.{}.tmp", name, Uuid::new_v4().simple()));

        tokio::fs::write(&tmp, contents).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }

    async fn check(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let meta = tokio::fs::metadata(&self.dir).await?;
        if meta.permissions().readonly() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("data directory {} is read-only", self.dir.display()),
            ));
        }
        Ok(())
    }
}

/// Process-local backend for tests and throwaway instances.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw access for seeding fixtures, including malformed ones.
    pub async fn insert_raw(&self, name: &str, contents: impl Into<String>) {
        self.blobs
            .write()
            .await
            .insert(name.to_string(), contents.into());
    }

    pub async fn raw(&self, name: &str) -> Option<String> {
        self.blobs.read().await.get(name).cloned()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self, name: &str) -> io::Result<Option<String>> {
        Ok(self.blobs.read().await.get(name).cloned())
    }

    async fn write(&self, name: &str, contents: &str) -> io::Result<()> {
        self.blobs
            .write()
            .await
            .insert(name.to_string(), contents.to_string());
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_directory_reads_as_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(tmp.path().join("not").join("there"));
        assert_eq!(backend.read("posts").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_creates_directory_and_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("data");
        let backend = JsonFileBackend::new(&dir);

        backend.write("posts", "[]").await.unwrap();
        backend.write("posts", "[1]").await.unwrap();

        assert_eq!(backend.read("posts").await.unwrap().as_deref(), Some("[1]"));
        let names: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["posts.json".to_string()]);
    }

    #[tokio::test]
    async fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.read("users").await.unwrap(), None);
        backend.write("users", "[]").await.unwrap();
        assert_eq!(backend.raw("users").await.as_deref(), Some("[]"));
    }
}
