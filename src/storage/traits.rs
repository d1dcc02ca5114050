//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{
    AppendOutcome, EntityRecord, PartitionSummary, ProgressRecord, RunRecord, RunStatus,
};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// One backend serves both durable stores the harvester needs: the progress
/// counters per category pair and the partitioned, deduplicated company
/// collection. Runs are used from a single task and take `&mut self` for
/// every write.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new harvest run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Updates the status of a run
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Sets the final status of a run and stamps its finish time
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Progress =====

    /// Loads every progress record in the order the pairs were first written
    fn load_progress(&self) -> StorageResult<Vec<ProgressRecord>>;

    /// Inserts or raises the captured count of a category pair
    ///
    /// The stored count never decreases: a lower `crawled_count` than the
    /// one already stored is ignored. A new pair is appended after all
    /// existing ones; an existing pair keeps its position.
    ///
    /// # Returns
    ///
    /// The count stored after the upsert
    fn upsert_progress(
        &mut self,
        main_category: &str,
        sub_category: &str,
        crawled_count: u32,
    ) -> StorageResult<u32>;

    // ===== Collected Entities =====

    /// Gets the keys of every company captured under a main category
    fn existing_keys(&self, main_category: &str) -> StorageResult<HashSet<String>>;

    /// Merges records into the partition of a main category
    ///
    /// A record whose key is already stored is dropped and the stored row is
    /// left untouched. Within `records`, the first occurrence of a key wins.
    fn append_entities(
        &mut self,
        main_category: &str,
        records: &[EntityRecord],
    ) -> StorageResult<AppendOutcome>;

    /// Loads one partition in capture order
    fn load_partition(&self, category_key: &str) -> StorageResult<Vec<EntityRecord>>;

    /// Lists every non-empty partition in order of first capture
    fn list_partitions(&self) -> StorageResult<Vec<PartitionSummary>>;

    /// Counts the companies captured under a main category
    fn count_entities(&self, main_category: &str) -> StorageResult<u64>;
}
