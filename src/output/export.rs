//! Per-category CSV export

use crate::output::OutputError;
use crate::storage::Storage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File an entity partition is exported to
pub fn export_path(dir: &Path, category_key: &str) -> PathBuf {
    dir.join(format!("{}_company_details.csv", category_key))
}

/// Writes one partition to `path` in capture order, replacing the file
///
/// Returns the number of records written.
pub fn export_partition(
    storage: &dyn Storage,
    category_key: &str,
    path: &Path,
) -> Result<usize, OutputError> {
    let records = storage.load_partition(category_key)?;

    let mut writer = csv::Writer::from_path(path)?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(records.len())
}

/// Exports every partition into `dir`, one file per main category
///
/// # Returns
///
/// The paths written, in partition order
pub fn export_partitions(storage: &dyn Storage, dir: &Path) -> Result<Vec<PathBuf>, OutputError> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for partition in storage.list_partitions()? {
        let path = export_path(dir, &partition.key);
        let count = export_partition(storage, &partition.key, &path)?;
        info!("Exported {} ({} companies)", partition.label, count);
        written.push(path);
    }

    Ok(written)
}
