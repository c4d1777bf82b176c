//! Persistence of the memory set
//!
//! The on-disk form is a JSON array of `{"id", "content"}` objects, rewritten
//! completely on every save.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::{MemchatError, Result};
use crate::types::MemorySet;

/// Storage backend for the memory set
///
/// Implementations must be thread-safe (Send + Sync) so a session can be
/// driven from any tokio task.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Load the persisted set; an absent store is an empty set
    async fn load(&self) -> Result<MemorySet>;

    /// Replace the persisted set with `memories`
    async fn save(&self, memories: &MemorySet) -> Result<()>;
}

#[async_trait]
impl<S> MemoryStore for Arc<S>
where
    S: MemoryStore + ?Sized,
{
    async fn load(&self) -> Result<MemorySet> {
        (**self).load().await
    }

    async fn save(&self, memories: &MemorySet) -> Result<()> {
        (**self).save(memories).await
    }
}

/// Memory store backed by a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store memories at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the memory file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "memories.json".to_string());
        self.path.with_file_name(format!(".{file_name}.tmp"))
    }
}

#[async_trait]
impl MemoryStore for JsonFileStore {
    async fn load(&self) -> Result<MemorySet> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "No memory file at {}, starting with an empty memory",
                    self.path.display()
                );
                return Ok(MemorySet::new());
            },
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(MemchatError::corrupt_store(&self.path, "file is not valid UTF-8"));
            },
            Err(e) => return Err(e.into()),
        };

        let memories: MemorySet = serde_json::from_str(&raw)
            .map_err(|e| MemchatError::corrupt_store(&self.path, e.to_string()))?;
        debug!(
            "Loaded {} memories from {}",
            memories.len(),
            self.path.display()
        );
        Ok(memories)
    }

    async fn save(&self, memories: &MemorySet) -> Result<()> {
        let json = serde_json::to_string_pretty(memories)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write then rename so a crash never leaves a truncated file behind
        let temp = self.temp_path();
        tokio::fs::write(&temp, json.as_bytes()).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        debug!("Saved {} memories to {}", memories.len(), self.path.display());
        Ok(())
    }
}

/// Memory store kept in process memory
///
/// Used by tests and by sessions that should not touch the disk.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    memories: Mutex<Option<MemorySet>>,
    saves: Mutex<usize>,
}

impl InMemoryStore {
    /// An empty store, as if nothing was ever saved
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `memories`
    pub fn with_memories(memories: MemorySet) -> Self {
        Self {
            memories: Mutex::new(Some(memories)),
            saves: Mutex::new(0),
        }
    }

    /// The last saved set, `None` if nothing was stored yet
    pub async fn snapshot(&self) -> Option<MemorySet> {
        self.memories.lock().await.clone()
    }

    /// Number of `save` calls so far
    pub async fn save_count(&self) -> usize {
        *self.saves.lock().await
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn load(&self) -> Result<MemorySet> {
        Ok(self.memories.lock().await.clone().unwrap_or_default())
    }

    async fn save(&self, memories: &MemorySet) -> Result<()> {
        *self.memories.lock().await = Some(memories.clone());
        *self.saves.lock().await += 1;
        Ok(())
    }
}
