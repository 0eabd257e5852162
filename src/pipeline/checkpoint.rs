//! Per-thread checkpoints of pipeline state
//!
//! A checkpoint is written after every stage so an interrupted run can be
//! resumed from the stage after `last_completed`.

use super::state::{PipelineState, Stage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("invalid thread id {0:?}")]
    InvalidThreadId(String),

    #[error("checkpoint io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt checkpoint {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported checkpoint version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub version: u32,
    pub thread_id: String,
    pub last_completed: Stage,
    pub state: PipelineState,
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(last_completed: Stage, state: &PipelineState) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            thread_id: state.thread_id.clone(),
            last_completed,
            state: state.clone(),
            saved_at: Utc::now(),
        }
    }

    /// Stage to run next, or `None` when the run is finished
    pub fn next_stage(&self) -> Option<Stage> {
        self.last_completed.next()
    }
}

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;

    /// Most recent checkpoint for `thread_id`
    async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError>;

    /// Every checkpoint for `thread_id`, oldest first
    async fn history(&self, thread_id: &str) -> Result<Vec<Checkpoint>, CheckpointError>;
}

/// Checkpoints kept for the life of the process
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    threads: Mutex<HashMap<String, Vec<Checkpoint>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        self.threads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(checkpoint.thread_id.clone())
            .or_default()
            .push(checkpoint.clone());
        Ok(())
    }

    async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        Ok(self
            .threads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(thread_id)
            .and_then(|list| list.last().cloned()))
    }

    async fn history(&self, thread_id: &str) -> Result<Vec<Checkpoint>, CheckpointError> {
        Ok(self
            .threads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(thread_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// One JSON document per checkpoint under `root/<thread_id>/`
///
/// Files are named `NNNN_<stage>.json` so lexical order is save order.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    root: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn thread_dir(&self, thread_id: &str) -> Result<PathBuf, CheckpointError> {
        let valid = !thread_id.is_empty()
            && thread_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CheckpointError::InvalidThreadId(thread_id.to_string()));
        }
        Ok(self.root.join(thread_id))
    }

    async fn read_checkpoint(path: &Path) -> Result<Checkpoint, CheckpointError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| CheckpointError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let checkpoint: Checkpoint =
            serde_json::from_str(&content).map_err(|source| CheckpointError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::Version {
                found: checkpoint.version,
                expected: CHECKPOINT_VERSION,
            });
        }
        Ok(checkpoint)
    }

    async fn checkpoint_files(dir: &Path) -> Result<Vec<PathBuf>, CheckpointError> {
        let io_error = |source| CheckpointError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(io_error(source)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Sequence number after the highest one on disk
    fn next_sequence(files: &[PathBuf]) -> usize {
        files
            .iter()
            .filter_map(|path| path.file_name()?.to_str()?.split('_').next()?.parse::<usize>().ok())
            .max()
            .map_or(0, |seq| seq + 1)
    }
}

/// Attempts at claiming a file name before giving up on a busy thread
const MAX_SAVE_ATTEMPTS: usize = 16;

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    /// Claims `NNNN_<stage>.json` with `create_new`, so concurrent savers on
    /// one thread never overwrite each other
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let dir = self.thread_dir(&checkpoint.thread_id)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| CheckpointError::Io {
                path: dir.clone(),
                source,
            })?;

        let json = serde_json::to_vec_pretty(checkpoint).map_err(|source| {
            CheckpointError::Corrupt {
                path: dir.clone(),
                source,
            }
        })?;

        let mut seq = Self::next_sequence(&Self::checkpoint_files(&dir).await?);
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let path = dir.join(format!("{:04}_{}.json", seq, checkpoint.last_completed));
            let io_error = |source| CheckpointError::Io {
                path: path.clone(),
                source,
            };

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Checkpoint slot taken, retrying");
                    seq = Self::next_sequence(&Self::checkpoint_files(&dir).await?).max(seq + 1);
                    continue;
                }
                Err(source) => return Err(io_error(source)),
            };
            file.write_all(&json).await.map_err(io_error)?;
            file.flush().await.map_err(io_error)?;

            debug!(path = %path.display(), "Checkpoint saved");
            return Ok(());
        }

        Err(CheckpointError::Io {
            path: dir,
            source: std::io::Error::new(
                ErrorKind::AlreadyExists,
                "no free checkpoint slot after repeated attempts",
            ),
        })
    }

    async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let dir = self.thread_dir(thread_id)?;
        match Self::checkpoint_files(&dir).await?.last() {
            Some(path) => Self::read_checkpoint(path).await.map(Some),
            None => Ok(None),
        }
    }

    async fn history(&self, thread_id: &str) -> Result<Vec<Checkpoint>, CheckpointError> {
        let dir = self.thread_dir(thread_id)?;
        let mut history = Vec::new();
        for path in Self::checkpoint_files(&dir).await? {
            history.push(Self::read_checkpoint(&path).await?);
        }
        Ok(history)
    }
}
