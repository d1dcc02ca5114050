//! Statistics generation from the harvest database
//!
//! This module provides functionality for summarizing progress against
//! the category targets and displaying it.

use crate::metadata::CategoryTarget;
use crate::output::OutputError;
use crate::storage::{PartitionSummary, RunRecord, Storage};

/// Progress of one category pair against its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairProgress {
    pub main_category: String,
    pub sub_category: String,
    pub crawled_count: u32,
    /// Target from the metadata, when the pair is still listed there
    pub target_count: Option<u32>,
}

impl PairProgress {
    pub fn is_complete(&self) -> bool {
        self.target_count
            .map(|target| self.crawled_count >= target)
            .unwrap_or(false)
    }
}

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    pub latest_run: Option<RunRecord>,

    /// Pairs with progress, in the order they were first written
    pub pairs: Vec<PairProgress>,

    /// Pairs in the metadata that have no progress yet
    pub untouched_pairs: usize,

    /// Sum of the metadata targets
    pub total_target: u64,

    /// Sum of progress counts, capped at each pair's target
    pub total_crawled: u64,

    pub partitions: Vec<PartitionSummary>,
}

impl HarvestStatistics {
    /// Share of the metadata targets already captured, in percent
    pub fn completion(&self) -> f64 {
        if self.total_target == 0 {
            return 0.0;
        }
        (self.total_crawled as f64 / self.total_target as f64) * 100.0
    }

    pub fn total_entities(&self) -> u64 {
        self.partitions.iter().map(|p| p.count).sum()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `metadata` - Category targets to measure progress against; may be empty
pub fn load_statistics(
    storage: &dyn Storage,
    metadata: &[CategoryTarget],
) -> Result<HarvestStatistics, OutputError> {
    let latest_run = storage.get_latest_run()?;
    let progress = storage.load_progress()?;
    let partitions = storage.list_partitions()?;

    let pairs: Vec<PairProgress> = progress
        .into_iter()
        .map(|record| {
            let target_count = metadata
                .iter()
                .find(|t| t.is_pair(&record.main_category, &record.sub_category))
                .map(|t| t.target_count);
            PairProgress {
                main_category: record.main_category,
                sub_category: record.sub_category,
                crawled_count: record.crawled_count,
                target_count,
            }
        })
        .collect();

    let untouched_pairs = metadata
        .iter()
        .filter(|t| {
            !pairs
                .iter()
                .any(|p| t.is_pair(&p.main_category, &p.sub_category))
        })
        .count();

    let total_target = metadata.iter().map(|t| t.target_count as u64).sum();
    let total_crawled = pairs
        .iter()
        .filter_map(|p| p.target_count.map(|target| p.crawled_count.min(target) as u64))
        .sum();

    Ok(HarvestStatistics {
        latest_run,
        pairs,
        untouched_pairs,
        total_target,
        total_crawled,
        partitions,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  ID: {}", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Config hash: {}", run.config_hash);
        }
        None => println!("No harvest runs recorded"),
    }
    println!();

    println!("Category Pairs ({}):", stats.pairs.len());
    for pair in &stats.pairs {
        let target = pair
            .target_count
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string());
        let marker = if pair.is_complete() { "✓" } else { " " };
        println!(
            "  {} {} - {}: {}/{}",
            marker, pair.main_category, pair.sub_category, pair.crawled_count, target
        );
    }
    if stats.untouched_pairs > 0 {
        println!("  ({} pairs not started)", stats.untouched_pairs);
    }
    println!();

    println!("Partitions ({}):", stats.partitions.len());
    for partition in &stats.partitions {
        println!(
            "  {} [{}]: {} companies",
            partition.label, partition.key, partition.count
        );
    }
    println!();

    println!(
        "Completion: {:.1}% ({} / {} companies, {} stored)",
        stats.completion(),
        stats.total_crawled,
        stats.total_target,
        stats.total_entities()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EntityRecord, RunStatus, SqliteStorage};

    fn company(name: &str) -> EntityRecord {
        EntityRecord {
            name: name.to_string(),
            main_category: "Ăn Uống".to_string(),
            sub_category: "Bánh Kẹo".to_string(),
            ..EntityRecord::default()
        }
    }

    #[test]
    fn test_statistics_against_targets() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run = storage.create_run("hash").unwrap();
        storage.finish_run(run, RunStatus::Completed).unwrap();
        storage.upsert_progress("Ăn Uống", "Bánh Kẹo", 12).unwrap();
        storage.upsert_progress("Ăn Uống", "Cà Phê", 3).unwrap();
        storage.upsert_progress("Cũ", "Đã Xóa", 7).unwrap();
        storage
            .append_entities("Ăn Uống", &[company("A"), company("B")])
            .unwrap();

        let metadata = vec![
            CategoryTarget::new("Ăn Uống", "Bánh Kẹo", 10),
            CategoryTarget::new("Ăn Uống", "Cà Phê", 6),
            CategoryTarget::new("Xây Dựng", "Sơn", 4),
        ];

        let stats = load_statistics(&storage, &metadata).unwrap();

        assert_eq!(
            stats.latest_run.as_ref().unwrap().status,
            RunStatus::Completed
        );
        assert_eq!(stats.pairs.len(), 3);
        assert!(stats.pairs[0].is_complete());
        assert!(!stats.pairs[1].is_complete());
        assert_eq!(stats.pairs[2].target_count, None);
        assert_eq!(stats.untouched_pairs, 1);
        assert_eq!(stats.total_target, 20);
        assert_eq!(stats.total_crawled, 13);
        assert!((stats.completion() - 65.0).abs() < 1e-9);
        assert_eq!(stats.total_entities(), 2);
    }

    #[test]
    fn test_statistics_on_empty_database() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage, &[]).unwrap();

        assert!(stats.latest_run.is_none());
        assert!(stats.pairs.is_empty());
        assert_eq!(stats.completion(), 0.0);
    }
}
