//! Keyed persistence behind the hub.
//!
//! The persisted layout is one record per key; keys carry a schema
//! version so a format change lands under a fresh name instead of
//! colliding with data written by an older build.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Serialized `PagesBuffer` of the current schema.
pub const PAGES_BUFFER_KEY: &str = "pages-buffer.v2";

/// Serialized viewer `Config`.
pub const VIEWER_CONFIG_KEY: &str = "viewer-config.v1";

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>>;
    async fn write(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Ephemeral store for tests and history-off sessions.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
///
/// Writes go through a sibling temp file and a rename, so a crash mid-write
/// leaves the previous record intact rather than a truncated one.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KvStore for JsonFileStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, value).await?;
        tokio::fs::rename(&staging, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips() -> Result<()> {
        let store = MemoryStore::new();
        assert_eq!(store.read("missing").await?, None);

        store.write(PAGES_BUFFER_KEY, "{}").await?;
        assert_eq!(store.read(PAGES_BUFFER_KEY).await?, Some("{}".to_string()));

        store.remove(PAGES_BUFFER_KEY).await?;
        assert_eq!(store.read(PAGES_BUFFER_KEY).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn file_store_round_trips() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = JsonFileStore::new(dir.path());

        assert_eq!(store.read(PAGES_BUFFER_KEY).await?, None);

        store.write(PAGES_BUFFER_KEY, r#"{"pages":[]}"#).await?;
        assert_eq!(
            store.read(PAGES_BUFFER_KEY).await?,
            Some(r#"{"pages":[]}"#.to_string())
        );

        // Overwrites replace the record in place.
        store.write(PAGES_BUFFER_KEY, "{}").await?;
        assert_eq!(store.read(PAGES_BUFFER_KEY).await?, Some("{}".to_string()));

        store.remove(PAGES_BUFFER_KEY).await?;
        store.remove(PAGES_BUFFER_KEY).await?;
        assert_eq!(store.read(PAGES_BUFFER_KEY).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn file_store_leaves_no_staging_file_behind() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = JsonFileStore::new(dir.path());
        store.write(VIEWER_CONFIG_KEY, "{}").await?;

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec![format!("{VIEWER_CONFIG_KEY}.json")]);
        Ok(())
    }
}
