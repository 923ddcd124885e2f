use crate::record::{LiteraryRecord, RecordStatus};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum FavoritesError {
    #[error("Failed to create favorites directory: {0}")]
    CreateDir(std::io::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Record is missing its {0}")]
    MissingField(&'static str),
    #[error("Invalid user id: {0:?}")]
    InvalidUserId(String),
}

/// Per-user storage of saved records
pub trait FavoritesStore: Send + Sync {
    /// Save a copy of `record`; returns false when the same id and status is already saved
    fn save_record(&self, user_id: &str, record: &LiteraryRecord) -> Result<bool, FavoritesError>;

    /// Saved records with the given status, newest first
    fn list_records(
        &self,
        user_id: &str,
        status: RecordStatus,
    ) -> Result<Vec<LiteraryRecord>, FavoritesError>;

    /// Remove every saved record with this id; returns false when none matched
    fn delete_record(&self, user_id: &str, record_id: &str) -> Result<bool, FavoritesError>;

    /// Remove everything saved for the user
    fn clear_records(&self, user_id: &str) -> Result<(), FavoritesError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserFile {
    /// Oldest first
    records: Vec<LiteraryRecord>,
}

/// Stores each user's favorites as a JSON file in one directory
pub struct JsonFavoritesStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFavoritesStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, FavoritesError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(FavoritesError::CreateDir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Store under the platform data directory
    pub fn open_default() -> Result<Self, FavoritesError> {
        Self::new(default_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn user_path(&self, user_id: &str) -> Result<PathBuf, FavoritesError> {
        let valid = !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(FavoritesError::InvalidUserId(user_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", user_id)))
    }

    fn load(&self, path: &Path) -> Result<UserFile, FavoritesError> {
        if !path.exists() {
            return Ok(UserFile::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn store(&self, path: &Path, file: &UserFile) -> Result<(), FavoritesError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(file)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Load, modify and write back one user's file while holding the write lock
    fn update<T>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut UserFile) -> T,
    ) -> Result<T, FavoritesError> {
        let path = self.user_path(user_id)?;
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = self.load(&path)?;
        let result = f(&mut file);
        self.store(&path, &file)?;
        Ok(result)
    }
}

/// Default favorites directory
pub fn default_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".data"))
        .join("litfinder")
        .join("favorites")
}

impl FavoritesStore for JsonFavoritesStore {
    fn save_record(&self, user_id: &str, record: &LiteraryRecord) -> Result<bool, FavoritesError> {
        if record.id.trim().is_empty() {
            return Err(FavoritesError::MissingField("id"));
        }
        if record.title.trim().is_empty() {
            return Err(FavoritesError::MissingField("title"));
        }

        let mut saved = record.clone();
        if saved.status == RecordStatus::None {
            saved.status = RecordStatus::Favorite;
        }

        let inserted = self.update(user_id, |file| {
            let exists = file
                .records
                .iter()
                .any(|r| r.id == saved.id && r.status == saved.status);
            if !exists {
                file.records.push(saved.clone());
            }
            !exists
        })?;

        if inserted {
            info!(user_id, record_id = %saved.id, "Saved record");
        }
        Ok(inserted)
    }

    fn list_records(
        &self,
        user_id: &str,
        status: RecordStatus,
    ) -> Result<Vec<LiteraryRecord>, FavoritesError> {
        let path = self.user_path(user_id)?;
        let file = self.load(&path)?;
        Ok(file
            .records
            .into_iter()
            .rev()
            .filter(|r| r.status == status)
            .collect())
    }

    fn delete_record(&self, user_id: &str, record_id: &str) -> Result<bool, FavoritesError> {
        let removed = self.update(user_id, |file| {
            let before = file.records.len();
            file.records.retain(|r| r.id != record_id);
            before - file.records.len()
        })?;

        if removed == 0 {
            info!(user_id, record_id, "No saved record to delete");
        } else {
            info!(user_id, record_id, removed, "Deleted record");
        }
        Ok(removed > 0)
    }

    fn clear_records(&self, user_id: &str) -> Result<(), FavoritesError> {
        self.update(user_id, |file| file.records.clear())?;
        info!(user_id, "Cleared favorites");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn book(id: &str, title: &str) -> LiteraryRecord {
        let mut record = LiteraryRecord::new(id, title);
        record.authors = vec!["Ursula K. Le Guin".to_string(), "Co; Author".to_string()];
        record.year = "1969".to_string();
        record
    }

    #[test]
    fn saved_records_list_newest_first() {
        let dir = tempdir().unwrap();
        let store = JsonFavoritesStore::new(dir.path()).unwrap();

        assert!(store.save_record("u1", &book("a", "First")).unwrap());
        assert!(store.save_record("u1", &book("b", "Second")).unwrap());

        let listed = store.list_records("u1", RecordStatus::Favorite).unwrap();
        let titles: Vec<_> = listed.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
        assert!(listed.iter().all(|r| r.status == RecordStatus::Favorite));
        assert_eq!(listed[1].authors, book("a", "First").authors);

        assert!(store.list_records("u1", RecordStatus::None).unwrap().is_empty());
    }

    #[test]
    fn saving_twice_keeps_one_copy() {
        let dir = tempdir().unwrap();
        let store = JsonFavoritesStore::new(dir.path()).unwrap();

        assert!(store.save_record("u1", &book("a", "First")).unwrap());
        assert!(!store.save_record("u1", &book("a", "First again")).unwrap());
        assert_eq!(store.list_records("u1", RecordStatus::Favorite).unwrap().len(), 1);
    }

    #[test]
    fn users_do_not_see_each_other() {
        let dir = tempdir().unwrap();
        let store = JsonFavoritesStore::new(dir.path()).unwrap();

        store.save_record("u1", &book("a", "First")).unwrap();
        assert!(store.list_records("u2", RecordStatus::Favorite).unwrap().is_empty());
    }

    #[test]
    fn id_and_title_are_required() {
        let dir = tempdir().unwrap();
        let store = JsonFavoritesStore::new(dir.path()).unwrap();

        assert!(matches!(
            store.save_record("u1", &book("", "No id")),
            Err(FavoritesError::MissingField("id"))
        ));
        assert!(matches!(
            store.save_record("u1", &book("a", " ")),
            Err(FavoritesError::MissingField("title"))
        ));
    }

    #[test]
    fn delete_and_clear() {
        let dir = tempdir().unwrap();
        let store = JsonFavoritesStore::new(dir.path()).unwrap();

        store.save_record("u1", &book("a", "First")).unwrap();
        store.save_record("u1", &book("b", "Second")).unwrap();

        assert!(store.delete_record("u1", "a").unwrap());
        assert!(!store.delete_record("u1", "a").unwrap());
        assert_eq!(store.list_records("u1", RecordStatus::Favorite).unwrap().len(), 1);

        store.clear_records("u1").unwrap();
        assert!(store.list_records("u1", RecordStatus::Favorite).unwrap().is_empty());
    }

    #[test]
    fn rejects_path_like_user_ids() {
        let dir = tempdir().unwrap();
        let store = JsonFavoritesStore::new(dir.path()).unwrap();

        assert!(matches!(
            store.list_records("../etc", RecordStatus::Favorite),
            Err(FavoritesError::InvalidUserId(_))
        ));
        assert!(matches!(
            store.clear_records(""),
            Err(FavoritesError::InvalidUserId(_))
        ));
    }

    #[test]
    fn survives_reopening() {
        let dir = tempdir().unwrap();
        JsonFavoritesStore::new(dir.path())
            .unwrap()
            .save_record("u1", &book("a", "First"))
            .unwrap();

        let reopened = JsonFavoritesStore::new(dir.path()).unwrap();
        assert_eq!(reopened.list_records("u1", RecordStatus::Favorite).unwrap().len(), 1);
    }
}
