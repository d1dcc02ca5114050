//! Page traversal for one category pair
//!
//! # Phases
//!
//! ```text
//! LocateCategory -> LocateSubcategory -> FetchPage -> ExtractStubs -> ProcessEntities
//!                                            ^                             |
//!                                            +--------- NextPage <---------+
//!                                                                          |
//!                          ExtractStubs <-------- ProbeAhead <-------------+
//! ```
//!
//! # Stop Conditions
//!
//! Checked per page, in this order:
//!
//! 1. The captured count reached the target
//! 2. The page has no stubs at all
//! 3. `max_empty_pages` consecutive pages had nothing new
//! 4. There is no next control and no probed page has anything new
//!
//! A company whose capture failed is not new on any later page.

use crate::config::Config;
use crate::crawler::extractor::DetailExtractor;
use crate::crawler::fetcher::{settle, Page, PageFetcher};
use crate::crawler::orchestrator::{DetailOrchestrator, DetailReport};
use crate::crawler::parser::{
    category_links, find_next_link, parse_listing, subcategory_links, EntityStub,
};
use crate::identity::entity_key;
use crate::metadata::CategoryTarget;
use crate::state::{StopReason, TraversalPhase};
use crate::storage::Storage;
use crate::url::{page_number, page_url, resolve, start_page, Link};
use crate::NavigationError;
use std::collections::HashSet;
use tracing::{debug, info, trace, warn};
use url::Url;

/// Result of traversing one category pair
#[derive(Debug, Clone)]
pub struct TraversalOutcome {
    pub stop: StopReason,
    pub pages_visited: u32,
    pub details: DetailReport,
}

/// Per-invocation traversal state
#[derive(Debug)]
struct TraversalContext {
    phase: TraversalPhase,
    page_number: u32,
    /// Consecutive pages without a single new stub
    empty_pages: u32,
    pages_visited: u32,
}

impl TraversalContext {
    fn new() -> Self {
        Self {
            phase: TraversalPhase::LocateCategory,
            page_number: 1,
            empty_pages: 0,
            pages_visited: 0,
        }
    }

    fn advance(&mut self, next: TraversalPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal traversal transition {} -> {}",
            self.phase,
            next
        );
        trace!("{} -> {}", self.phase, next);
        self.phase = next;
    }
}

/// Walks the listing pages of category pairs
pub struct PageTraversal<'a, F: PageFetcher, X: DetailExtractor> {
    fetcher: &'a mut F,
    extractor: &'a X,
    config: &'a Config,
}

impl<'a, F: PageFetcher, X: DetailExtractor> PageTraversal<'a, F, X> {
    pub fn new(fetcher: &'a mut F, extractor: &'a X, config: &'a Config) -> Self {
        Self {
            fetcher,
            extractor,
            config,
        }
    }

    /// Traverses the listing of `target`, capturing companies until a stop
    /// condition holds
    ///
    /// # Arguments
    ///
    /// * `storage` - Receives captured companies and progress
    /// * `target` - The category pair and its target count
    /// * `existing` - Keys already captured in the main category; grows as
    ///   companies are captured
    /// * `start_offset` - Count already captured for this pair
    ///
    /// # Errors
    ///
    /// Fails only when the category or subcategory link cannot be resolved.
    pub async fn traverse<S: Storage>(
        &mut self,
        storage: &mut S,
        target: &CategoryTarget,
        existing: &mut HashSet<String>,
        start_offset: u32,
    ) -> Result<TraversalOutcome, NavigationError> {
        let mut ctx = TraversalContext::new();
        let listing_base = self.locate(target, &mut ctx).await?;

        let config = self.config;
        let extractor = self.extractor;
        let mut orchestrator =
            DetailOrchestrator::new(storage, extractor, target, &config.crawler, start_offset);

        ctx.page_number = start_page(start_offset, config.site.page_size);
        if ctx.page_number > 1 {
            info!("Resuming from page {}", ctx.page_number);
        }

        ctx.advance(TraversalPhase::FetchPage);
        let first = page_url(&listing_base, ctx.page_number);
        let mut current = self.load_listing(&first, &mut ctx).await;

        let stop = loop {
            if orchestrator.crawled_count() >= target.target_count {
                break StopReason::TargetReached;
            }

            ctx.advance(TraversalPhase::ExtractStubs);
            let Some(page) = current.take() else {
                info!("No companies found on page {}", ctx.page_number);
                break StopReason::Exhausted;
            };
            let stubs = stubs_on(&page);
            if stubs.is_empty() {
                info!("No companies found on page {}", ctx.page_number);
                break StopReason::Exhausted;
            }

            let fresh = count_new(&stubs, existing, orchestrator.failed_keys());
            info!(
                "Page {}: {} new of {} companies ({}/{})",
                ctx.page_number,
                fresh,
                stubs.len(),
                orchestrator.crawled_count(),
                target.target_count
            );

            if fresh == 0 {
                ctx.empty_pages += 1;
                if ctx.empty_pages >= config.crawler.max_empty_pages {
                    info!(
                        "No new companies in {} consecutive pages, stopping",
                        ctx.empty_pages
                    );
                    break StopReason::Saturated;
                }
            } else {
                ctx.empty_pages = 0;
            }

            ctx.advance(TraversalPhase::ProcessEntities);
            for stub in &stubs {
                if orchestrator.crawled_count() >= target.target_count {
                    break;
                }
                orchestrator
                    .process(&mut *self.fetcher, stub, existing, &page.url)
                    .await;
            }

            if orchestrator.crawled_count() >= target.target_count {
                info!("Reached target {} companies", target.target_count);
                break StopReason::TargetReached;
            }

            let next = match find_next_link(&page, &listing_base, ctx.page_number) {
                Ok(next) => next,
                Err(e) => {
                    warn!("Could not read pagination on {}: {}", page.url, e);
                    None
                }
            };

            match next {
                Some(next_url) => {
                    ctx.advance(TraversalPhase::NextPage);
                    debug!("Going to next page: {}", next_url);
                    let numbered = page_number(&next_url);
                    ctx.page_number = if numbered > ctx.page_number {
                        numbered
                    } else {
                        ctx.page_number + 1
                    };
                    ctx.advance(TraversalPhase::FetchPage);
                    current = self.load_listing(&next_url, &mut ctx).await;
                }
                None => {
                    ctx.advance(TraversalPhase::ProbeAhead);
                    let ahead = self
                        .probe_ahead(&listing_base, existing, orchestrator.failed_keys(), &mut ctx)
                        .await;
                    match ahead {
                        Some(found) => current = Some(found),
                        None => {
                            info!("No next page and nothing new ahead, end of results");
                            break StopReason::ProbeExhausted;
                        }
                    }
                }
            }
        };

        ctx.advance(TraversalPhase::Done);
        let details = orchestrator.finish();
        info!(
            "Finished {} ({}): {}/{} companies, {} pages",
            target.label(),
            stop,
            details.crawled_count,
            target.target_count,
            ctx.pages_visited
        );

        Ok(TraversalOutcome {
            stop,
            pages_visited: ctx.pages_visited,
            details,
        })
    }

    /// Resolves the listing URL of the pair through the category pages
    async fn locate(
        &mut self,
        target: &CategoryTarget,
        ctx: &mut TraversalContext,
    ) -> Result<Url, NavigationError> {
        let config = self.config;
        let home = self.open(&config.site.base_url).await?;
        let categories = category_links(&home).unwrap_or_default();
        let category = pick(&target.main_category, &categories)
            .ok_or_else(|| NavigationError::CategoryNotFound(target.main_category.clone()))?;

        ctx.advance(TraversalPhase::LocateSubcategory);
        let category_page = self.open(category.as_str()).await?;
        let subcategories = subcategory_links(&category_page).unwrap_or_default();
        let listing = pick(&target.sub_category, &subcategories).ok_or_else(|| {
            NavigationError::SubcategoryNotFound {
                main: target.main_category.clone(),
                sub: target.sub_category.clone(),
            }
        })?;

        debug!("Listing for {}: {}", target.label(), listing);
        Ok(listing)
    }

    async fn open(&mut self, url: &str) -> Result<Page, NavigationError> {
        let unreachable = |reason: String| NavigationError::Unreachable {
            url: url.to_string(),
            reason,
        };

        let parsed = Url::parse(url).map_err(|e| unreachable(e.to_string()))?;
        let page = self
            .fetcher
            .navigate(&parsed)
            .await
            .map_err(|e| unreachable(e.to_string()))?;
        settle(self.config.crawler.page_settle_ms).await;
        Ok(page)
    }

    /// Loads a listing page; a failed load counts as a page without stubs
    async fn load_listing(&mut self, url: &Url, ctx: &mut TraversalContext) -> Option<Page> {
        ctx.pages_visited += 1;
        match self.fetcher.navigate(url).await {
            Ok(page) => {
                settle(self.config.crawler.page_settle_ms).await;
                Some(page)
            }
            Err(e) => {
                warn!("Failed to load listing page {}: {}", url, e);
                None
            }
        }
    }

    /// Tries the numbered pages after the current one
    ///
    /// Returns the first page that lists at least one new company, with the
    /// context moved to that page number. Companies whose capture already
    /// failed are not new.
    async fn probe_ahead(
        &mut self,
        listing_base: &Url,
        existing: &HashSet<String>,
        failed: &HashSet<String>,
        ctx: &mut TraversalContext,
    ) -> Option<Page> {
        let budget = self.config.crawler.probe_ahead_pages;
        let from = ctx.page_number;

        for candidate in from + 1..=from + budget {
            let url = page_url(listing_base, candidate);
            debug!("Trying page {}: {}", candidate, url);

            let Some(page) = self.load_listing(&url, ctx).await else {
                continue;
            };

            let fresh = count_new(&stubs_on(&page), existing, failed);
            if fresh > 0 {
                info!(
                    "Found {} new companies on page {}, continuing",
                    fresh, candidate
                );
                ctx.page_number = candidate;
                return Some(page);
            }
            debug!("No new companies on page {}", candidate);
        }

        None
    }
}

fn pick(label: &str, links: &[Link]) -> Option<Url> {
    resolve(label, links).and_then(|link| Url::parse(&link.href).ok())
}

fn stubs_on(page: &Page) -> Vec<EntityStub> {
    parse_listing(page).unwrap_or_else(|e| {
        warn!("Could not parse listing {}: {}", page.url, e);
        Vec::new()
    })
}

/// Counts stubs neither captured nor already failed
fn count_new(stubs: &[EntityStub], existing: &HashSet<String>, failed: &HashSet<String>) -> usize {
    stubs
        .iter()
        .map(|stub| entity_key(&stub.name))
        .filter(|key| !existing.contains(key) && !failed.contains(key))
        .count()
}
