// # File Subscriber Store
//
// JSON-file implementation of SubscriberStore with crash recovery.
//
// ## Durability
//
// - Every state change is written before the call returns
// - Writes go to `<path>.tmp` and are renamed over the store file
// - The previous store file is copied to `<path>.backup` before each rename
// - A corrupt store file is recovered from the backup
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "subscribers": [
//     {
//       "id": "0d3c6b1e-…",
//       "email": "ursula@example.com",
//       "created_at": "2025-01-09T12:00:00Z",
//       "updated_at": "2025-01-09T12:00:00Z",
//       "deleted_at": null
//     }
//   ]
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::Error;
use crate::store::memory::{active_records, insert_record, remove_record, restore_record};
use crate::subscriber::{Subscriber, SubscriberEmail};
use crate::traits::SubscriberStore;

const STORE_FILE_VERSION: &str = "1.0";

/// File-backed subscriber store
///
/// The whole record set is held in memory and rewritten on every change.
/// A change is applied to a copy, persisted, and only then committed, so a
/// failed write leaves both the file and the in-memory view untouched.
///
/// # Example
///
/// ```rust,no_run
/// use listsync_core::store::FileSubscriberStore;
/// use listsync_core::subscriber::SubscriberEmail;
/// use listsync_core::traits::SubscriberStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSubscriberStore::new("/var/lib/listsync/subscribers.json").await?;
///     store.insert(&SubscriberEmail::parse("ursula@example.com")?).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileSubscriberStore {
    path: PathBuf,
    records: RwLock<HashMap<String, Subscriber>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFileFormat {
    version: String,
    subscribers: Vec<Subscriber>,
}

/// Why a store file could not be loaded
enum LoadError {
    /// Present but not a valid store file
    Corrupt(String),
    /// Could not be read at all
    Unreadable(Error),
}

impl FileSubscriberStore {
    /// Open or create a store at `path`
    ///
    /// Missing parent directories are created. A corrupt store file is
    /// replaced by its backup; with no usable backup the store starts empty.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let records = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Path of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_with_recovery(path: &Path) -> Result<HashMap<String, Subscriber>, Error> {
        let reason = match Self::load(path).await {
            Ok(records) => {
                tracing::debug!("Loaded {} subscribers from {}", records.len(), path.display());
                return Ok(records);
            }
            Err(LoadError::Unreadable(e)) => return Err(e),
            Err(LoadError::Corrupt(reason)) => reason,
        };

        tracing::warn!(
            "Subscriber store {} is corrupted ({}). Attempting recovery from backup.",
            path.display(),
            reason
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with an empty store.");
            return Ok(HashMap::new());
        }

        match Self::load(&backup_path).await {
            Ok(records) => {
                tracing::info!("Recovered {} subscribers from backup", records.len());
                if let Err(e) = fs::copy(&backup_path, path).await {
                    tracing::error!("Failed to restore store file from backup: {}", e);
                }
                Ok(records)
            }
            Err(_) => {
                tracing::error!("Backup is unusable too. Starting with an empty store.");
                Ok(HashMap::new())
            }
        }
    }

    async fn load(path: &Path) -> Result<HashMap<String, Subscriber>, LoadError> {
        if !path.exists() {
            tracing::debug!("Store file does not exist yet: {}", path.display());
            return Ok(HashMap::new());
        }

        let content = fs::read(path).await.map_err(|e| {
            LoadError::Unreadable(Error::subscriber_store(format!(
                "Failed to read store file {}: {}",
                path.display(),
                e
            )))
        })?;

        // Invalid UTF-8 surfaces here as a parse error
        let file: StoreFileFormat =
            serde_json::from_slice(&content).map_err(|e| LoadError::Corrupt(e.to_string()))?;

        if file.version != STORE_FILE_VERSION {
            tracing::warn!(
                "Store file version mismatch: expected {}, got {}. Loading anyway.",
                STORE_FILE_VERSION,
                file.version
            );
        }

        Ok(file
            .subscribers
            .into_iter()
            .map(|subscriber| (subscriber.key(), subscriber))
            .collect())
    }

    /// Write a record set to disk atomically
    async fn persist(&self, records: &HashMap<String, Subscriber>) -> Result<(), Error> {
        let mut subscribers: Vec<Subscriber> = records.values().cloned().collect();
        subscribers.sort_by_key(|subscriber| subscriber.created_at);

        let file = StoreFileFormat {
            version: STORE_FILE_VERSION.to_string(),
            subscribers,
        };
        let json = serde_json::to_string_pretty(&file)?;

        let temp_path = self.temp_path();
        {
            let mut temp = fs::File::create(&temp_path).await.map_err(|e| {
                Error::subscriber_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            temp.write_all(json.as_bytes()).await.map_err(|e| {
                Error::subscriber_store(format!(
                    "Failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            temp.flush().await?;
        }

        if self.path.exists() {
            if let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::subscriber_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Subscriber store written to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl SubscriberStore for FileSubscriberStore {
    async fn find_with_removed(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, Error> {
        let guard = self.records.read().await;
        Ok(guard.get(&email.normalized()).cloned())
    }

    async fn insert(&self, email: &SubscriberEmail) -> Result<Subscriber, Error> {
        let mut guard = self.records.write().await;
        let mut next = guard.clone();
        let subscriber = insert_record(&mut next, email)?;

        self.persist(&next).await?;
        *guard = next;
        Ok(subscriber)
    }

    async fn restore(&self, id: Uuid) -> Result<Option<Subscriber>, Error> {
        let mut guard = self.records.write().await;
        let mut next = guard.clone();
        let Some(subscriber) = restore_record(&mut next, id)? else {
            return Ok(None);
        };

        self.persist(&next).await?;
        *guard = next;
        Ok(Some(subscriber))
    }

    async fn soft_remove(&self, email: &SubscriberEmail) -> Result<Option<Subscriber>, Error> {
        let mut guard = self.records.write().await;
        let mut next = guard.clone();
        let Some(subscriber) = remove_record(&mut next, email) else {
            return Ok(None);
        };

        self.persist(&next).await?;
        *guard = next;
        Ok(Some(subscriber))
    }

    async fn list_active(&self) -> Result<Vec<Subscriber>, Error> {
        let guard = self.records.read().await;
        Ok(active_records(&guard))
    }

    async fn count_with_removed(&self) -> Result<usize, Error> {
        Ok(self.records.read().await.len())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Exclusive, since writers share the temp file
        let guard = self.records.write().await;
        self.persist(&guard).await
    }
}
