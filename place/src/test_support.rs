//! Test-only fakes and fixtures for board and store tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tempfile::TempDir;

use crate::board::{Board, BoardConfig};
use crate::io::config::{PlaceConfig, write_config};
use crate::io::invalidator::{CacheInvalidator, InvalidationError};
use crate::io::kv::MemoryKvStore;

/// Records every purge request and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingInvalidator {
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingInvalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource lists received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().expect("recorder lock").clone()
    }
}

impl CacheInvalidator for RecordingInvalidator {
    fn purge(&self, resources: &[String]) -> Result<(), InvalidationError> {
        self.calls
            .lock()
            .expect("recorder lock")
            .push(resources.to_vec());
        Ok(())
    }
}

/// Rejects every purge with a fixed message.
#[derive(Debug, Clone)]
pub struct FailingInvalidator {
    message: String,
}

impl FailingInvalidator {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl CacheInvalidator for FailingInvalidator {
    fn purge(&self, _resources: &[String]) -> Result<(), InvalidationError> {
        Err(InvalidationError::Rejected(self.message.clone()))
    }
}

pub type MemoryBoard = Board<MemoryKvStore, Arc<RecordingInvalidator>>;

/// Uninitialized in-memory board plus a handle on its recorder.
pub fn memory_board(config: BoardConfig) -> (MemoryBoard, Arc<RecordingInvalidator>) {
    let recorder = Arc::new(RecordingInvalidator::new());
    let board = Board::new(MemoryKvStore::new(), Arc::clone(&recorder), config);
    (board, recorder)
}

/// Initialized 4x4 in-memory board with the default palette.
pub fn ready_board() -> (MemoryBoard, Arc<RecordingInvalidator>) {
    let (board, recorder) = memory_board(BoardConfig::default());
    board.initialize().expect("initialize board");
    (board, recorder)
}

/// Scratch directory holding a `place.toml` for CLI tests.
pub struct TestProject {
    temp: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        Self::with_config(&PlaceConfig::default())
    }

    pub fn with_config(config: &PlaceConfig) -> Result<Self> {
        let temp = tempfile::tempdir()?;
        write_config(&temp.path().join("place.toml"), config)?;
        Ok(Self { temp })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp.path().join("place.toml")
    }

    pub fn database_path(&self) -> PathBuf {
        self.temp.path().join("place.db")
    }
}
