//! Durable campaign snapshots, one record per campaign id.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::campaign::Campaign;
use crate::errors::StoreError;

pub trait SnapshotStore: Send + Sync {
    fn save(&self, campaign: &Campaign) -> Result<(), StoreError>;
    fn load(&self, id: &str) -> Result<Option<Campaign>, StoreError>;
    /// Deleting a missing snapshot is not an error.
    fn delete(&self, id: &str) -> Result<(), StoreError>;
    fn load_all(&self) -> Result<Vec<Campaign>, StoreError>;
}

/// One pretty-printed JSON file per campaign under a directory.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| self.dir.join(format!("{}.json", id)))
    }

    fn io_err(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&self, campaign: &Campaign) -> Result<(), StoreError> {
        let path = self.path_for(&campaign.id).ok_or_else(|| StoreError::Io {
            path: self.dir.join(&campaign.id),
            source: std::io::Error::new(ErrorKind::InvalidInput, "invalid campaign id"),
        })?;
        fs::create_dir_all(&self.dir).map_err(|e| Self::io_err(&self.dir, e))?;

        let json = serde_json::to_string_pretty(campaign).map_err(|source| StoreError::Serde {
            id: campaign.id.clone(),
            source,
        })?;
        // Write then rename so a crash never leaves a truncated snapshot.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| Self::io_err(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| Self::io_err(&path, e))?;
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<Campaign>, StoreError> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_err(&path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Serde {
                id: id.to_string(),
                source,
            })
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let Some(path) = self.path_for(id) else {
            return Ok(());
        };
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_err(&path, e)),
        }
    }

    fn load_all(&self) -> Result<Vec<Campaign>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::io_err(&self.dir, e)),
        };

        let mut campaigns = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Self::io_err(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|c| serde_json::from_str::<Campaign>(&c).map_err(|e| e.to_string()));
            match parsed {
                Ok(campaign) => campaigns.push(campaign),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable snapshot");
                }
            }
        }
        campaigns.sort_by_key(|c| c.created_at);
        Ok(campaigns)
    }
}

/// Volatile store for tests and `--no-persist` runs.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: Mutex<HashMap<String, Campaign>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn save(&self, campaign: &Campaign) -> Result<(), StoreError> {
        self.snapshots
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?
            .insert(campaign.id.clone(), campaign.clone());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<Campaign>, StoreError> {
        Ok(self
            .snapshots
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?
            .get(id)
            .cloned())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.snapshots
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?
            .remove(id);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<Campaign>, StoreError> {
        let mut campaigns: Vec<Campaign> = self
            .snapshots
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?
            .values()
            .cloned()
            .collect();
        campaigns.sort_by_key(|c| c.created_at);
        Ok(campaigns)
    }
}
