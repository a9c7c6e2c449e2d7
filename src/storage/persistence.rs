//! Snapshot persistence for the in-memory store.
//!
//! Every committed snapshot carries a generation number. A commit only
//! replaces the file when it still holds the generation the committing
//! store started from, so two stores sharing a file cannot overwrite each
//! other's work.

use super::Catalog;
use crate::core::{DbError, Result};
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

const SNAPSHOT_VERSION: u32 = 2;

// ============================================================================
// Database Snapshot
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: u32,
    pub catalog: Catalog,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Number of commits that produced this snapshot. An absent file is
    /// generation 0.
    pub generation: u64,
    /// Milliseconds since the epoch.
    pub created_at: i64,
    pub row_count: usize,
    pub table_count: usize,
}

impl DatabaseSnapshot {
    pub fn new(catalog: Catalog, generation: u64) -> Self {
        let metadata = SnapshotMetadata {
            generation,
            created_at: Utc::now().timestamp_millis(),
            row_count: catalog.row_count(),
            table_count: catalog.table_count(),
        };
        Self {
            version: SNAPSHOT_VERSION,
            catalog,
            metadata,
        }
    }
}

// ============================================================================
// Snapshot Lock
// ============================================================================

/// Exclusive lock on the file beside a snapshot, released on drop.
#[derive(Debug)]
pub struct SnapshotLock {
    _file: File,
}

impl SnapshotLock {
    fn new(snapshot_path: &Path) -> Result<Self> {
        let mut lock_path = snapshot_path.to_path_buf();
        lock_path.set_extension("lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| DbError::ExecutionError(format!("Failed to open lock file: {}", e)))?;
        file.lock_exclusive()
            .map_err(|e| DbError::ExecutionError(format!("Failed to lock snapshot: {}", e)))?;
        Ok(Self { _file: file })
    }
}

// ============================================================================
// Snapshot Manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Replace the snapshot on disk with one generation past `expected`.
    ///
    /// Fails with [`DbError::TransactionError`], leaving the file alone, when
    /// another store has committed since `expected` was loaded.
    pub fn replace(&self, snapshot: &DatabaseSnapshot, expected: u64) -> Result<()> {
        let parent = self.parent_dir();
        fs::create_dir_all(&parent).map_err(|e| {
            DbError::ExecutionError(format!("Failed to create snapshot directory: {}", e))
        })?;

        let _lock = SnapshotLock::new(&self.snapshot_path)?;
        let current = self.generation()?;
        if current != expected {
            return Err(DbError::TransactionError(format!(
                "{} was committed to by another store (generation {}, expected {})",
                self.snapshot_path.display(),
                current,
                expected
            )));
        }
        self.write(&parent, snapshot)
    }

    /// Generation of the snapshot currently on disk.
    pub fn generation(&self) -> Result<u64> {
        Ok(self.load()?.map_or(0, |snapshot| snapshot.metadata.generation))
    }

    pub fn load(&self) -> Result<Option<DatabaseSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.snapshot_path)
            .map_err(|e| DbError::ExecutionError(format!("Failed to read snapshot: {}", e)))?;
        let snapshot: DatabaseSnapshot = rmp_serde::from_slice(&data).map_err(|e| {
            DbError::ExecutionError(format!("Failed to deserialize snapshot: {}", e))
        })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DbError::ExecutionError(format!(
                "Unsupported snapshot version {} in {}",
                snapshot.version,
                self.snapshot_path.display()
            )));
        }
        Ok(Some(snapshot))
    }

    fn parent_dir(&self) -> PathBuf {
        match self.snapshot_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Write the snapshot beside its final path and rename it into place, so
    /// a reader sees either the old or the new snapshot.
    fn write(&self, parent: &Path, snapshot: &DatabaseSnapshot) -> Result<()> {
        let serialized = rmp_serde::to_vec(snapshot)
            .map_err(|e| DbError::ExecutionError(format!("Failed to serialize snapshot: {}", e)))?;

        let mut temp = NamedTempFile::new_in(parent)
            .map_err(|e| DbError::ExecutionError(format!("Failed to create temp file: {}", e)))?;
        temp.write_all(&serialized)
            .map_err(|e| DbError::ExecutionError(format!("Failed to write snapshot: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| DbError::ExecutionError(format!("Failed to sync snapshot: {}", e)))?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| DbError::ExecutionError(format!("Failed to rename snapshot: {}", e)))?;

        debug!(
            "Wrote snapshot {} generation {} ({} rows)",
            self.snapshot_path.display(),
            snapshot.metadata.generation,
            snapshot.metadata.row_count
        );
        Ok(())
    }
}
