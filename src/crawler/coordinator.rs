//! Resume coordinator - top-level harvest driver
//!
//! The coordinator owns the fetcher, the storage and the extractor for the
//! lifetime of a run. It:
//! - Records the run and marks any run left `running` as interrupted
//! - Loads the progress table and computes where to resume
//! - Walks the remaining category pairs one at a time
//! - Contains per-pair failures so a bad category never aborts the run

use crate::config::Config;
use crate::crawler::extractor::{DetailExtractor, YellowPagesExtractor};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::traversal::PageTraversal;
use crate::metadata::{load_metadata, CategoryTarget};
use crate::output::export_partitions;
use crate::storage::{open_storage, ProgressRecord, RunStatus, Storage};
use crate::Result;
use std::collections::HashSet;
use std::path::Path;
use tracing::{error, info, warn};

/// A category pair that still has work, or may have
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPair {
    /// Position of the pair in the metadata
    pub index: usize,
    pub target: CategoryTarget,
    /// Companies already captured for the pair
    pub start_offset: u32,
}

impl PendingPair {
    pub fn is_satisfied(&self) -> bool {
        self.start_offset >= self.target.target_count
    }
}

/// Where a run starts and what it will walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumePlan {
    pub resume_index: usize,
    pub pairs: Vec<PendingPair>,
}

/// Computes the metadata index a run resumes at
///
/// Only the last progress record written matters. When its pair is complete
/// the run moves on to the next pair; otherwise that pair is finished first.
/// Without progress, or when the last pair is no longer listed, the run
/// starts from the beginning.
pub fn find_resume_position(metadata: &[CategoryTarget], progress: &[ProgressRecord]) -> usize {
    let Some(last) = progress.last() else {
        return 0;
    };

    match metadata
        .iter()
        .position(|t| t.is_pair(&last.main_category, &last.sub_category))
    {
        Some(index) if last.crawled_count >= metadata[index].target_count => index + 1,
        Some(index) => index,
        None => {
            warn!(
                "Last progress entry {} - {} is not in the metadata, starting over",
                last.main_category, last.sub_category
            );
            0
        }
    }
}

/// Builds the list of pairs a run will visit, with their start offsets
pub fn plan_resume(metadata: &[CategoryTarget], progress: &[ProgressRecord]) -> ResumePlan {
    let resume_index = find_resume_position(metadata, progress);

    let pairs = metadata
        .iter()
        .enumerate()
        .skip(resume_index)
        .map(|(index, target)| {
            let start_offset = progress
                .iter()
                .find(|p| target.is_pair(&p.main_category, &p.sub_category))
                .map(|p| p.crawled_count)
                .unwrap_or(0);
            PendingPair {
                index,
                target: target.clone(),
                start_offset,
            }
        })
        .collect();

    ResumePlan {
        resume_index,
        pairs,
    }
}

/// Totals of one harvest run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: i64,
    pub resume_index: usize,
    /// Pairs traversed to a stop condition
    pub pairs_traversed: usize,
    /// Pairs already complete before the run
    pub pairs_skipped: usize,
    /// Pairs whose category or subcategory could not be located
    pub pairs_failed: usize,
    /// Companies captured during this run
    pub captured: usize,
}

/// Main harvest coordinator structure
pub struct Coordinator<F: PageFetcher, S: Storage, X: DetailExtractor> {
    config: Config,
    fetcher: F,
    storage: S,
    extractor: X,
    config_hash: String,
}

impl<F: PageFetcher, S: Storage, X: DetailExtractor> Coordinator<F, S, X> {
    pub fn new(config: Config, fetcher: F, storage: S, extractor: X, config_hash: String) -> Self {
        Self {
            config,
            fetcher,
            storage,
            extractor,
            config_hash,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Harvests every pending pair of `metadata`, in order
    ///
    /// # Errors
    ///
    /// Only failures to record the run itself are returned. Progress that
    /// cannot be read is treated as empty, and failures inside a pair are
    /// logged and the run moves on. A run in which no attempted pair could
    /// be located is recorded as failed.
    pub async fn run(&mut self, metadata: &[CategoryTarget]) -> Result<RunSummary> {
        if let Some(latest) = self.storage.get_latest_run()? {
            if matches!(latest.status, RunStatus::Running) {
                warn!("Run {} did not finish, marking it interrupted", latest.id);
                self.storage
                    .update_run_status(latest.id, RunStatus::Interrupted)?;
            }
        }

        let run_id = self.storage.create_run(&self.config_hash)?;
        info!("Starting harvest run {}", run_id);

        let progress = match self.storage.load_progress() {
            Ok(progress) => progress,
            Err(e) => {
                warn!("Could not load progress, starting without it: {}", e);
                Vec::new()
            }
        };

        let plan = plan_resume(metadata, &progress);
        if plan.resume_index > 0 {
            info!(
                "Resuming at pair {} of {}",
                plan.resume_index + 1,
                metadata.len()
            );
        }

        let mut summary = RunSummary {
            run_id,
            resume_index: plan.resume_index,
            ..RunSummary::default()
        };

        for pending in &plan.pairs {
            let target = &pending.target;

            if pending.is_satisfied() {
                info!(
                    "Skipping {}: {}/{} already captured",
                    target.label(),
                    pending.start_offset,
                    target.target_count
                );
                summary.pairs_skipped += 1;
                continue;
            }

            info!(
                "[{}/{}] {} (target {}, {} captured)",
                pending.index + 1,
                metadata.len(),
                target.label(),
                target.target_count,
                pending.start_offset
            );

            let mut existing = match self.storage.existing_keys(&target.main_category) {
                Ok(keys) => keys,
                Err(e) => {
                    warn!(
                        "Could not load captured companies of {}: {}",
                        target.main_category, e
                    );
                    HashSet::new()
                }
            };

            let mut traversal = PageTraversal::new(&mut self.fetcher, &self.extractor, &self.config);
            match traversal
                .traverse(&mut self.storage, target, &mut existing, pending.start_offset)
                .await
            {
                Ok(outcome) => {
                    summary.pairs_traversed += 1;
                    summary.captured += outcome.details.captured.len();
                }
                Err(e) => {
                    error!("Skipping {}: {}", target.label(), e);
                    summary.pairs_failed += 1;
                }
            }
        }

        let status = if summary.pairs_failed > 0 && summary.pairs_traversed == 0 {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
        self.storage.finish_run(run_id, status)?;
        info!(
            "Harvest run {} {}: {} captured, {} pairs traversed, {} skipped, {} failed",
            run_id,
            status.to_db_string(),
            summary.captured,
            summary.pairs_traversed,
            summary.pairs_skipped,
            summary.pairs_failed
        );

        Ok(summary)
    }
}

/// Runs a complete harvest against the live directory
///
/// This is the main entry point. It will:
/// 1. Load the category metadata (failure aborts the run)
/// 2. Open the storage database
/// 3. Build the HTTP fetcher
/// 4. Harvest every pending pair
/// 5. Export each partition to CSV
pub async fn run_harvest(config: Config, config_hash: String) -> Result<RunSummary> {
    let metadata = load_metadata(Path::new(&config.input.metadata_path))?;
    info!(
        "Loaded {} category pairs from {}",
        metadata.len(),
        config.input.metadata_path
    );

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let fetcher = HttpFetcher::from_config(&config)?;

    let mut coordinator = Coordinator::new(
        config,
        fetcher,
        storage,
        YellowPagesExtractor,
        config_hash,
    );
    let summary = coordinator.run(&metadata).await?;

    let export_dir = Path::new(&coordinator.config().output.export_dir);
    match export_partitions(coordinator.storage(), export_dir) {
        Ok(files) => info!("Exported {} files to {}", files.len(), export_dir.display()),
        Err(e) => error!("Export failed: {}", e),
    }

    Ok(summary)
}

/// Loads metadata and progress and computes the plan a harvest would follow
pub fn plan_from_config(config: &Config) -> Result<(Vec<CategoryTarget>, ResumePlan)> {
    let metadata = load_metadata(Path::new(&config.input.metadata_path))?;

    let database = Path::new(&config.output.database_path);
    let progress = if database.exists() {
        open_storage(database)?.load_progress()?
    } else {
        Vec::new()
    };

    let plan = plan_resume(&metadata, &progress);
    Ok((metadata, plan))
}
