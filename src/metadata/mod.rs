//! Category metadata: the ordered list of category pairs to harvest
//!
//! The metadata file is a CSV with the columns
//! `main_category, sub_category, number_website`. It is produced by the
//! scan mode and read once at the start of every harvest run.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while reading or writing the metadata file
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Failed to access metadata file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed metadata file: {0}")]
    Csv(#[from] csv::Error),
}

/// One unit of resumable work: a subcategory and how many companies it lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTarget {
    pub main_category: String,
    pub sub_category: String,
    #[serde(rename = "number_website")]
    pub target_count: u32,
}

impl CategoryTarget {
    pub fn new(
        main_category: impl Into<String>,
        sub_category: impl Into<String>,
        target_count: u32,
    ) -> Self {
        Self {
            main_category: main_category.into(),
            sub_category: sub_category.into(),
            target_count,
        }
    }

    /// Label passed to the detail extractor, `"<main> - <sub>"`
    pub fn label(&self) -> String {
        format!("{} - {}", self.main_category, self.sub_category)
    }

    /// Whether this target refers to the given pair
    pub fn is_pair(&self, main_category: &str, sub_category: &str) -> bool {
        self.main_category == main_category && self.sub_category == sub_category
    }
}

/// Loads the ordered category targets from a metadata CSV
///
/// Fields are trimmed. Rows with an empty category name are skipped, and
/// when a pair appears more than once only its first row is kept.
pub fn load_metadata(path: &Path) -> Result<Vec<CategoryTarget>, MetadataError> {
    let file = std::fs::File::open(path)?;
    read_metadata(file)
}

/// Parses category targets from any CSV source
pub fn read_metadata<R: std::io::Read>(source: R) -> Result<Vec<CategoryTarget>, MetadataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    for row in reader.deserialize() {
        let target: CategoryTarget = row?;

        if target.main_category.is_empty() || target.sub_category.is_empty() {
            debug!("Skipping metadata row without a category name: {:?}", target);
            continue;
        }

        let pair = (target.main_category.clone(), target.sub_category.clone());
        if !seen.insert(pair) {
            warn!(
                "Duplicate metadata row for {} - {}, keeping the first",
                target.main_category, target.sub_category
            );
            continue;
        }

        targets.push(target);
    }

    Ok(targets)
}

/// Writes category targets to a metadata CSV, replacing any existing file
pub fn write_metadata(path: &Path, targets: &[CategoryTarget]) -> Result<(), MetadataError> {
    let mut writer = csv::Writer::from_path(path)?;
    for target in targets {
        writer.serialize(target)?;
    }
    writer.flush()?;
    Ok(())
}
