//! Crawler module for directory navigation and company capture
//!
//! This module contains the core harvesting logic, including:
//! - Page fetching behind the `PageFetcher` capability
//! - Listing, navigation and detail page parsing
//! - Per-company capture with batched persistence
//! - Pagination with stop heuristics
//! - Resume coordination across category pairs

mod coordinator;
mod extractor;
mod fetcher;
mod orchestrator;
mod parser;
mod scanner;
mod selectors;
mod traversal;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{
    find_resume_position, plan_from_config, plan_resume, run_harvest, Coordinator, PendingPair,
    ResumePlan, RunSummary,
};
pub use extractor::{DetailExtractor, ExtractError, YellowPagesExtractor};
pub use fetcher::{
    build_http_client, Document, Element, FetchError, HttpFetcher, Page, PageFetcher,
};
pub use orchestrator::{DetailOrchestrator, DetailReport};
pub use parser::{category_links, find_next_link, parse_listing, subcategory_links, EntityStub};
pub use scanner::{run_scan, scan_categories};
pub use traversal::{PageTraversal, TraversalOutcome};

use crate::config::Config;
use crate::HarvestError;

/// Runs a complete harvest operation
///
/// This is the main entry point for starting a harvest. It will:
/// 1. Load the category metadata
/// 2. Open the storage database and record a run
/// 3. Compute the resume position from stored progress
/// 4. Traverse each pending category pair
/// 5. Export the collected partitions
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `config_hash` - Hash of the configuration file, recorded with the run
pub async fn harvest(config: Config, config_hash: String) -> Result<RunSummary, HarvestError> {
    run_harvest(config, config_hash).await
}
