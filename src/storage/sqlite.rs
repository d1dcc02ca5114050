//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::identity::{category_key, entity_key};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    AppendOutcome, EntityRecord, PartitionSummary, ProgressRecord, RunRecord, RunStatus,
};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

const ENTITY_COLUMNS: &str = "name, address, phone, hotline, email, website, description,
     business, products, main_category, sub_category";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(RunStatus::Failed),
        })
    }

    fn entity_from_row(row: &Row<'_>) -> rusqlite::Result<EntityRecord> {
        Ok(EntityRecord {
            name: row.get(0)?,
            address: row.get(1)?,
            phone: row.get(2)?,
            hotline: row.get(3)?,
            email: row.get(4)?,
            website: row.get(5)?,
            description: row.get(6)?,
            business: row.get(7)?,
            products: row.get(8)?,
            main_category: row.get(9)?,
            sub_category: row.get(10)?,
        })
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                Self::run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status
                 FROM runs WHERE id = ?1",
                [run_id],
                Self::run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Progress =====

    fn load_progress(&self) -> StorageResult<Vec<ProgressRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT main_category, sub_category, number_company_crawled
             FROM progress ORDER BY seq",
        )?;

        let records = stmt
            .query_map([], |row| {
                Ok(ProgressRecord {
                    main_category: row.get(0)?,
                    sub_category: row.get(1)?,
                    crawled_count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn upsert_progress(
        &mut self,
        main_category: &str,
        sub_category: &str,
        crawled_count: u32,
    ) -> StorageResult<u32> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO progress (main_category, sub_category, number_company_crawled, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(main_category, sub_category) DO UPDATE SET
                 number_company_crawled = MAX(number_company_crawled, excluded.number_company_crawled),
                 updated_at = excluded.updated_at",
            params![main_category, sub_category, crawled_count, now],
        )?;

        let stored: u32 = self.conn.query_row(
            "SELECT number_company_crawled FROM progress
             WHERE main_category = ?1 AND sub_category = ?2",
            params![main_category, sub_category],
            |row| row.get(0),
        )?;

        Ok(stored)
    }

    // ===== Collected Entities =====

    fn existing_keys(&self, main_category: &str) -> StorageResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT entity_key FROM companies WHERE category_key = ?1")?;

        let keys = stmt
            .query_map(params![category_key(main_category)], |row| row.get(0))?
            .collect::<Result<HashSet<String>, _>>()?;

        Ok(keys)
    }

    fn append_entities(
        &mut self,
        main_category: &str,
        records: &[EntityRecord],
    ) -> StorageResult<AppendOutcome> {
        let partition = category_key(main_category);
        let now = Utc::now().to_rfc3339();
        let mut outcome = AppendOutcome::default();

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR IGNORE INTO companies
                 (category_key, entity_key, captured_at, {ENTITY_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ))?;

            for record in records {
                let key = entity_key(&record.name);
                if key.is_empty() {
                    outcome.rejected += 1;
                    continue;
                }

                let inserted = stmt.execute(params![
                    partition,
                    key,
                    now,
                    record.name.trim(),
                    record.address,
                    record.phone,
                    record.hotline,
                    record.email,
                    record.website,
                    record.description,
                    record.business,
                    record.products,
                    record.main_category,
                    record.sub_category,
                ])?;

                if inserted == 1 {
                    outcome.inserted += 1;
                } else {
                    outcome.duplicates += 1;
                }
            }
        }
        tx.commit()?;

        Ok(outcome)
    }

    fn load_partition(&self, category_key: &str) -> StorageResult<Vec<EntityRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTITY_COLUMNS} FROM companies WHERE category_key = ?1 ORDER BY seq"
        ))?;

        let records = stmt
            .query_map(params![category_key], Self::entity_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn list_partitions(&self) -> StorageResult<Vec<PartitionSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.category_key,
                    (SELECT first.main_category FROM companies first
                     WHERE first.category_key = c.category_key
                     ORDER BY first.seq LIMIT 1),
                    COUNT(*)
             FROM companies c
             GROUP BY c.category_key
             ORDER BY MIN(c.seq)",
        )?;

        let partitions = stmt
            .query_map([], |row| {
                Ok(PartitionSummary {
                    key: row.get(0)?,
                    label: row.get(1)?,
                    count: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(partitions)
    }

    fn count_entities(&self, main_category: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM companies WHERE category_key = ?1",
            params![category_key(main_category)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
