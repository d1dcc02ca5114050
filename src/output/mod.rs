//! Output module for harvest statistics and exports
//!
//! This module handles:
//! - Summarizing progress against the category targets
//! - Exporting each entity partition to its own CSV file

mod export;
pub mod stats;

pub use export::{export_partition, export_partitions, export_path};
pub use stats::{load_statistics, print_statistics, HarvestStatistics, PairProgress};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors raised while producing reports or exports
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
