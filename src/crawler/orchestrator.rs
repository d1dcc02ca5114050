//! Detail fetch orchestration for one category pair
//!
//! The orchestrator visits the detail page of every stub not captured yet,
//! keeps the captured records in a pending batch and flushes the batch to
//! storage every `batch_size` captures. A crash therefore loses fewer than
//! `batch_size` companies.

use crate::config::CrawlerConfig;
use crate::crawler::extractor::DetailExtractor;
use crate::crawler::fetcher::{settle, PageFetcher};
use crate::crawler::parser::EntityStub;
use crate::identity::entity_key;
use crate::metadata::CategoryTarget;
use crate::storage::{EntityRecord, Storage};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};
use url::Url;

/// What happened to the companies of one category pair
#[derive(Debug, Clone, Default)]
pub struct DetailReport {
    /// Records captured during this traversal, in capture order
    pub captured: Vec<EntityRecord>,
    /// Captured count including the resume offset
    pub crawled_count: u32,
    pub flushes: u32,
    /// Stubs skipped because they were already captured or already failed
    pub skipped: u32,
    /// Detail pages that could not be fetched or extracted
    pub failures: u32,
    /// Detail pages whose company turned out to be captured already
    pub duplicates: u32,
    /// Records that could not be written and were dropped
    pub unsaved: u32,
}

/// Captures company details for one category pair
pub struct DetailOrchestrator<'a, S: Storage, X: DetailExtractor> {
    storage: &'a mut S,
    extractor: &'a X,
    target: &'a CategoryTarget,
    batch_size: usize,
    detail_settle_ms: u64,
    return_settle_ms: u64,
    batch: Vec<EntityRecord>,
    /// Captures since the last flush
    unflushed: usize,
    persisted_count: u32,
    /// Stubs whose capture failed; never requested again in this traversal
    failed: HashSet<String>,
    report: DetailReport,
}

impl<'a, S: Storage, X: DetailExtractor> DetailOrchestrator<'a, S, X> {
    /// Creates an orchestrator resuming from `start_offset` captures
    ///
    /// `start_offset` is the count already stored for the pair.
    pub fn new(
        storage: &'a mut S,
        extractor: &'a X,
        target: &'a CategoryTarget,
        settings: &CrawlerConfig,
        start_offset: u32,
    ) -> Self {
        Self {
            storage,
            extractor,
            target,
            batch_size: settings.batch_size.max(1) as usize,
            detail_settle_ms: settings.detail_settle_ms,
            return_settle_ms: settings.return_settle_ms,
            batch: Vec::new(),
            unflushed: 0,
            persisted_count: start_offset,
            failed: HashSet::new(),
            report: DetailReport {
                crawled_count: start_offset,
                ..Default::default()
            },
        }
    }

    pub fn crawled_count(&self) -> u32 {
        self.report.crawled_count
    }

    /// Records captured but not yet written
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    /// Keys of the stubs whose capture failed
    pub fn failed_keys(&self) -> &HashSet<String> {
        &self.failed
    }

    /// Captures the company behind `stub`
    ///
    /// Returns `None` when the stub was skipped, the capture failed, or the
    /// company was already captured under another listing name. A stub
    /// whose capture failed once is skipped for the rest of the traversal. Whenever a
    /// detail page was requested, the fetcher is sent back to `listing_url`
    /// before this returns.
    pub async fn process<F: PageFetcher>(
        &mut self,
        fetcher: &mut F,
        stub: &EntityStub,
        existing: &mut HashSet<String>,
        listing_url: &Url,
    ) -> Option<EntityRecord> {
        let stub_key = entity_key(&stub.name);
        if existing.contains(&stub_key) {
            debug!("Skipping existing: {}", stub.name);
            self.report.skipped += 1;
            return None;
        }
        if self.failed.contains(&stub_key) {
            debug!("Skipping previously failed: {}", stub.name);
            self.report.skipped += 1;
            return None;
        }

        info!("Crawling #{}: {}", stub.position, stub.name);
        let captured = self.capture(fetcher, stub).await;
        self.return_to_listing(fetcher, listing_url).await;

        let record = match captured {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to capture {}: {}", stub.name, e);
                self.report.failures += 1;
                self.failed.insert(stub_key);
                return None;
            }
        };

        let record_key = record.key();
        existing.insert(stub_key.clone());
        if record_key != stub_key && !existing.insert(record_key) {
            debug!(
                "{} is already captured as {}, not counting it",
                stub.name, record.name
            );
            self.report.duplicates += 1;
            return None;
        }

        self.report.crawled_count += 1;
        self.unflushed += 1;
        self.batch.push(record.clone());
        self.report.captured.push(record.clone());
        info!(
            "Captured {} ({}/{})",
            record.name, self.report.crawled_count, self.target.target_count
        );

        if self.unflushed >= self.batch_size {
            self.flush();
        }

        Some(record)
    }

    async fn capture<F: PageFetcher>(
        &self,
        fetcher: &mut F,
        stub: &EntityStub,
    ) -> crate::Result<EntityRecord> {
        let page = fetcher.navigate(&stub.detail_url).await?;
        settle(self.detail_settle_ms).await;
        Ok(self.extractor.extract(&page, self.target)?)
    }

    async fn return_to_listing<F: PageFetcher>(&self, fetcher: &mut F, listing_url: &Url) {
        if let Err(e) = fetcher.navigate(listing_url).await {
            warn!("Could not return to listing {}: {}", listing_url, e);
        }
        settle(self.return_settle_ms).await;
    }

    /// Writes pending records, then the captured count
    ///
    /// Does nothing when no record is pending and the count is already
    /// stored. If the batch cannot be written as a whole, records are
    /// written one at a time; records that still fail stay pending for the
    /// next flush.
    pub fn flush(&mut self) {
        if self.batch.is_empty() && self.report.crawled_count == self.persisted_count {
            return;
        }

        let main_category = self.target.main_category.as_str();

        if !self.batch.is_empty() {
            match self.storage.append_entities(main_category, &self.batch) {
                Ok(outcome) => {
                    info!(
                        "Saved {} companies to {} ({} already stored)",
                        outcome.inserted, main_category, outcome.duplicates
                    );
                    self.batch.clear();
                }
                Err(e) => {
                    error!(
                        "Failed to save batch of {} companies: {}, retrying one by one",
                        self.batch.len(),
                        e
                    );
                    self.append_individually();
                }
            }
        }

        match self.storage.upsert_progress(
            main_category,
            &self.target.sub_category,
            self.report.crawled_count,
        ) {
            Ok(stored) => {
                self.persisted_count = self.report.crawled_count;
                info!(
                    "Updated progress: {}: {} companies",
                    self.target.label(),
                    stored
                );
            }
            Err(e) => error!("Failed to update progress for {}: {}", self.target.label(), e),
        }

        self.unflushed = 0;
        self.report.flushes += 1;
    }

    fn append_individually(&mut self) {
        let main_category = self.target.main_category.clone();
        let pending = std::mem::take(&mut self.batch);

        for record in pending {
            if let Err(e) = self
                .storage
                .append_entities(&main_category, std::slice::from_ref(&record))
            {
                warn!("Could not save {}: {}", record.name, e);
                self.batch.push(record);
            }
        }
    }

    /// Performs the final flush and returns what happened
    pub fn finish(mut self) -> DetailReport {
        self.flush();
        if !self.batch.is_empty() {
            error!(
                "{} companies of {} could not be saved",
                self.batch.len(),
                self.target.label()
            );
            self.report.unsaved = self.batch.len() as u32;
        }
        self.report
    }
}
