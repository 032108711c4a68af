//! Durable storage for the selected profile.
//!
//! The only thing that outlives a session is the last-selected profile
//! tag. The port is injected so the presentation layer and tests can swap
//! the backing store.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::profile::CognitiveProfile;

/// Key-value port for the persisted profile selection.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Read the stored profile, if a valid one is present.
    async fn load(&self) -> Result<Option<CognitiveProfile>>;

    /// Persist the profile tag.
    async fn store(&self, profile: CognitiveProfile) -> Result<()>;
}

/// Stores the profile tag as a single small file.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the user data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cogniadapt")
            .join("profile")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn load(&self) -> Result<Option<CognitiveProfile>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CoreError::StorageError {
                    path: self.path.display().to_string(),
                    cause: e,
                });
            }
        };

        // A stale or hand-edited tag is ignored, not an error
        match CognitiveProfile::from_str(content.trim()) {
            Ok(profile) => Ok(Some(profile)),
            Err(_) => {
                tracing::warn!(
                    path = %self.path.display(),
                    tag = content.trim(),
                    "ignoring invalid stored profile tag"
                );
                Ok(None)
            }
        }
    }

    async fn store(&self, profile: CognitiveProfile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::StorageError {
                    path: parent.display().to_string(),
                    cause: e,
                })?;
        }

        tokio::fs::write(&self.path, profile.as_str())
            .await
            .map_err(|e| CoreError::StorageError {
                path: self.path.display().to_string(),
                cause: e,
            })
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    value: Mutex<Option<CognitiveProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn load(&self) -> Result<Option<CognitiveProfile>> {
        Ok(*self.value.lock())
    }

    async fn store(&self, profile: CognitiveProfile) -> Result<()> {
        *self.value.lock() = Some(profile);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProfileStore::new(dir.path().join("profile"));

        assert_eq!(store.load().await.unwrap(), None);
        store.store(CognitiveProfile::Dyslexia).await.unwrap();
        assert_eq!(
            store.load().await.unwrap(),
            Some(CognitiveProfile::Dyslexia)
        );
    }

    #[tokio::test]
    async fn file_store_ignores_invalid_tag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile");
        std::fs::write(&path, "NotAProfile").unwrap();

        let store = FileProfileStore::new(path);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryProfileStore::new();
        assert_eq!(store.load().await.unwrap(), None);
        store.store(CognitiveProfile::Adhd).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(CognitiveProfile::Adhd));
    }
}
