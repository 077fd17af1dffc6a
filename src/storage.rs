use crate::diary_entry::{DecodeError, DiaryEntry};
use directories::ProjectDirs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DATA_FILE_NAME: &str = "atrides_diary_data.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no application data directory available on this platform")]
    NoDataDir,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed diary file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("entry {index}: {source}")]
    Decode { index: usize, source: DecodeError },
}

/// Per-user data directory owned by this application. Stable across restarts;
/// deleting it loses the diary but never breaks the next start.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dirs = ProjectDirs::from("com", "atrides", "atrides_diary").ok_or(StorageError::NoDataDir)?;
    Ok(dirs.data_dir().to_path_buf())
}

/// Whole-collection persistence over a single JSON file. Holds nothing but
/// the resolved path; every call is a fresh read or write of the full list.
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn open() -> Result<Self, StorageError> {
        Ok(Self::at(data_dir()?.join(DATA_FILE_NAME)))
    }

    pub fn at(path: PathBuf) -> Self {
        Storage { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every stored entry, in file order. A missing or empty file means
    /// "no entries yet"; anything unreadable or undecodable means the same
    /// after a log line. The caller never sees a partial list.
    pub async fn load_all(&self) -> Vec<DiaryEntry> {
        match self.try_load().await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %err,
                    "could not load diary, starting empty"
                );
                Vec::new()
            }
        }
    }

    /// Replace the stored collection with `entries`, in the order given.
    /// Best-effort: a failed save is logged and dropped, and the in-memory
    /// list stays ahead of the file until the next save lands.
    pub async fn save_all(&self, entries: &[DiaryEntry]) {
        if let Err(err) = self.try_save(entries).await {
            tracing::error!(path = %self.path.display(), %err, "could not save diary");
        }
    }

    async fn try_load(&self) -> Result<Vec<DiaryEntry>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        let docs: Vec<serde_json::Value> = serde_json::from_str(&raw)?;
        docs.iter()
            .enumerate()
            .map(|(index, doc)| {
                DiaryEntry::from_json(doc).map_err(|source| StorageError::Decode { index, source })
            })
            .collect()
    }

    async fn try_save(&self, entries: &[DiaryEntry]) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let raw = serde_json::to_string(entries)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn entry(id: &str, title: &str) -> DiaryEntry {
        DiaryEntry {
            id: id.to_string(),
            title: title.to_string(),
            content: format!("content of {title}"),
            date: "2024-05-01T14:30:00.000".parse().unwrap(),
        }
    }

    fn scratch_storage() -> (TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::at(dir.path().join(DATA_FILE_NAME));
        (dir, storage)
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let (_dir, storage) = scratch_storage();
        assert!(storage.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn zero_byte_file_loads_empty() {
        let (_dir, storage) = scratch_storage();
        fs::write(storage.path(), "").unwrap();
        assert!(storage.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_preserves_contents_and_order() {
        let (_dir, storage) = scratch_storage();
        let entries = vec![entry("3", "c"), entry("2", "b"), entry("1", "a")];
        storage.save_all(&entries).await;
        assert_eq!(storage.load_all().await, entries);
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let (_dir, storage) = scratch_storage();
        fs::write(storage.path(), b"definitely { not json").unwrap();
        assert!(storage.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn undecodable_element_fails_the_whole_load() {
        let (_dir, storage) = scratch_storage();
        storage.save_all(&[entry("1", "a")]).await;
        let mut docs: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(storage.path()).unwrap()).unwrap();
        docs.push(serde_json::json!({"title": "no id"}));
        fs::write(storage.path(), serde_json::to_string(&docs).unwrap()).unwrap();

        // One bad element poisons the load, not just its own slot.
        assert!(storage.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn add_from_empty_store() {
        let (_dir, storage) = scratch_storage();
        let mut entries = storage.load_all().await;
        assert!(entries.is_empty());

        entries.insert(0, entry("1", "first"));
        storage.save_all(&entries).await;
        assert_eq!(storage.load_all().await, entries);
    }

    #[tokio::test]
    async fn delete_by_id() {
        let (_dir, storage) = scratch_storage();
        storage.save_all(&[entry("1", "a"), entry("2", "b")]).await;

        let mut entries = storage.load_all().await;
        entries.retain(|e| e.id != "1");
        storage.save_all(&entries).await;

        let reloaded = storage.load_all().await;
        assert_eq!(reloaded, vec![entry("2", "b")]);
    }

    #[tokio::test]
    async fn head_insertion_reloads_newest_first() {
        let (_dir, storage) = scratch_storage();
        let mut entries = Vec::new();
        for id in ["1", "2", "3"] {
            entries.insert(0, entry(id, id));
            storage.save_all(&entries).await;
        }

        let ids: Vec<String> = storage.load_all().await.into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["3", "2", "1"]);
    }

    #[tokio::test]
    async fn save_recreates_a_removed_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::at(dir.path().join("gone").join(DATA_FILE_NAME));

        let entries = vec![entry("1", "a")];
        storage.save_all(&entries).await;
        assert_eq!(storage.load_all().await, entries);
    }
}
