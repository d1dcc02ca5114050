//! Storage module for persisting harvest state
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Per-pair progress counters used to resume interrupted runs
//! - Captured company records, partitioned by main category
//! - Run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::HarvestError;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// How many companies have been captured for one category pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub main_category: String,
    pub sub_category: String,
    pub crawled_count: u32,
}

/// A captured company listing
///
/// Field names serialize to the column headers used by the directory's
/// exported spreadsheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(rename = "Tên công ty")]
    pub name: String,
    #[serde(rename = "Địa chỉ")]
    pub address: String,
    #[serde(rename = "Điện thoại")]
    pub phone: String,
    #[serde(rename = "Hotline")]
    pub hotline: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Website")]
    pub website: String,
    #[serde(rename = "Giới thiệu")]
    pub description: String,
    #[serde(rename = "Ngành nghề")]
    pub business: String,
    #[serde(rename = "Sản phẩm dịch vụ")]
    pub products: String,
    #[serde(rename = "Ngành")]
    pub main_category: String,
    #[serde(rename = "Ngành nhỏ")]
    pub sub_category: String,
}

impl EntityRecord {
    /// Identity of this record inside its main-category partition
    pub fn key(&self) -> String {
        crate::identity::entity_key(&self.name)
    }
}

/// Result of merging a batch of records into a partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Records stored for the first time
    pub inserted: usize,
    /// Records whose key was already present (existing row kept)
    pub duplicates: usize,
    /// Records without a usable key
    pub rejected: usize,
}

/// Size of one entity partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSummary {
    /// Normalized main-category key
    pub key: String,
    /// Main-category label as first captured
    pub label: String,
    pub count: u64,
}

/// Represents a harvest run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
