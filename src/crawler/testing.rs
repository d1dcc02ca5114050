//! In-memory fixtures for exercising the crawler without a network

use crate::config::{parse_config, Config};
use crate::crawler::fetcher::{FetchError, Page, PageFetcher};
use crate::identity::category_key;
use crate::storage::{
    AppendOutcome, EntityRecord, PartitionSummary, ProgressRecord, RunRecord, RunStatus,
    SqliteStorage, Storage, StorageError, StorageResult,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use url::Url;

pub const HOME: &str = "https://yp.test/";

/// Configuration pointing at the scripted site with every delay disabled
pub fn test_config() -> Config {
    parse_config(
        r#"
[site]
base-url = "https://yp.test/"
page-size = 3

[crawler]
batch-size = 10
max-empty-pages = 5
probe-ahead-pages = 3
page-settle-ms = 0
detail-settle-ms = 0
return-settle-ms = 0

[user-agent]
value = "Mozilla/5.0 (Test)"

[input]
metadata-path = "categories_metadata.csv"

[output]
database-path = "harvest.db"
export-dir = "out"
"#,
    )
    .unwrap()
}

/// Fetcher serving canned pages and recording every navigation
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, String>,
    pub navigations: Vec<String>,
    current: Option<Url>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: &str, html: impl Into<String>) {
        self.pages.insert(url.to_string(), html.into());
    }

    /// Number of times `url` was requested
    pub fn visits(&self, url: &str) -> usize {
        self.navigations.iter().filter(|n| n.as_str() == url).count()
    }

    /// Requests that went to company detail pages
    pub fn detail_visits(&self) -> Vec<&str> {
        self.navigations
            .iter()
            .filter(|n| n.contains("/company/"))
            .map(String::as_str)
            .collect()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn navigate(&mut self, url: &Url) -> Result<Page, FetchError> {
        self.navigations.push(url.to_string());
        match self.pages.get(url.as_str()) {
            Some(body) => {
                self.current = Some(url.clone());
                Ok(Page::new(url.clone(), body.clone()))
            }
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    fn current_url(&self) -> Option<&Url> {
        self.current.as_ref()
    }
}

pub fn home_html(categories: &[(&str, &str)]) -> String {
    let links: String = categories
        .iter()
        .map(|(label, href)| {
            format!(r#"<div class="p-2 ps-1"><a class="text-dark" href="{href}">{label}</a></div>"#)
        })
        .collect();
    format!("<html><body>{links}</body></html>")
}

pub fn category_html(subcategories: &[(&str, &str)]) -> String {
    let links: String = subcategories
        .iter()
        .map(|(label, href)| {
            format!(r#"<div class="col-sm-6 p-4 pe-3 pt-0 pb-2"><a href="{href}">{label}</a></div>"#)
        })
        .collect();
    format!("<html><body><div class=\"row\">{links}</div></body></html>")
}

/// Builder for a listing page
pub struct Listing {
    items: Vec<(String, String)>,
    first_rank: u32,
    next: Option<String>,
}

impl Listing {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            first_rank: 1,
            next: None,
        }
    }

    pub fn item(mut self, name: &str, href: &str) -> Self {
        self.items.push((name.to_string(), href.to_string()));
        self
    }

    pub fn first_rank(mut self, rank: u32) -> Self {
        self.first_rank = rank;
        self
    }

    pub fn next(mut self, href: &str) -> Self {
        self.next = Some(href.to_string());
        self
    }

    pub fn render(&self) -> String {
        let items: String = self
            .items
            .iter()
            .enumerate()
            .map(|(i, (name, href))| {
                format!(
                    r#"<div class="rounded-4 border bg-white shadow-sm mb-3 pb-4">
  <div class="yp_sothutu"><div class="yp_sothutu_txt"><small>{rank}</small></div></div>
  <div class="yp_noidunglistings"><h2 class="fs-5 pb-0 text-capitalize"><a href="{href}">{name}</a></h2></div>
</div>"#,
                    rank = self.first_rank + i as u32,
                )
            })
            .collect();

        let paging = match &self.next {
            Some(href) => format!(r#"<div id="paging"><a href="{href}">Tiếp</a></div>"#),
            None => r##"<div id="paging"><a href="#">1</a></div>"##.to_string(),
        };

        format!(r#"<html><body><div class="div_listing">{items}</div>{paging}</body></html>"#)
    }
}

/// Builder for a company detail page
pub struct Detail {
    name: String,
    phone: String,
}

impl Detail {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            phone: String::new(),
        }
    }

    pub fn phone(mut self, phone: &str) -> Self {
        self.phone = phone.to_string();
        self
    }

    pub fn render(&self) -> String {
        format!(
            r#"<html><body>
<div class="fs-3 text-capitalize">{name}</div>
<p class="m-0 pb-2">Hà Nội</p>
<p class="m-0 pb-2"><span class="fw-semibold fs18">{phone}</span></p>
</body></html>"#,
            name = self.name,
            phone = self.phone,
        )
    }
}

/// A scripted directory with one main category and one subcategory
///
/// Listing page `n` lives at `<sub>` for `n == 1` and `<sub>?page=n`
/// otherwise. Each company has its detail page at
/// `https://yp.test/company/<ascii-slug-of-name>`.
pub struct MiniSite {
    pub fetcher: ScriptedFetcher,
    pub listing: String,
}

impl MiniSite {
    pub const MAIN: &'static str = "Ăn Uống";
    pub const SUB: &'static str = "Bánh Kẹo";

    pub fn new() -> Self {
        let listing = "https://yp.test/sub/banh-keo".to_string();
        let mut fetcher = ScriptedFetcher::new();
        fetcher.insert(HOME, home_html(&[(Self::MAIN, "/cat/an-uong")]));
        fetcher.insert(
            "https://yp.test/cat/an-uong",
            category_html(&[("Bánh Kẹo (99)", "/sub/banh-keo")]),
        );

        Self { fetcher, listing }
    }

    pub fn page_url(&self, n: u32) -> String {
        if n <= 1 {
            self.listing.clone()
        } else {
            format!("{}?page={}", self.listing, n)
        }
    }

    /// Adds listing page `n` with the given company names
    ///
    /// Names already registered reuse their detail page. Names starting with
    /// `!` are listed without a working detail page.
    pub fn page(mut self, n: u32, names: &[&str], has_next: bool) -> Self {
        let mut listing = Listing::new();
        for name in names {
            let (shown, broken) = match name.strip_prefix('!') {
                Some(shown) => (shown, true),
                None => (*name, false),
            };
            let href = self.company_href(shown, broken);
            listing = listing.item(shown, &href);
        }
        if has_next {
            listing = listing.next(&format!("?page={}", n + 1));
        }

        let url = self.page_url(n);
        self.fetcher.insert(&url, listing.render());
        self
    }

    fn company_href(&mut self, name: &str, broken: bool) -> String {
        let slug = category_key(name).replace('_', "-");
        let href = format!("https://yp.test/company/{slug}");
        if !broken && !self.fetcher.pages.contains_key(&href) {
            self.fetcher.insert(&href, Detail::new(name).render());
        }
        href
    }
}

pub fn names(prefix: &str, range: std::ops::RangeInclusive<u32>) -> Vec<String> {
    range.map(|i| format!("{prefix} {i}")).collect()
}

pub fn as_strs(names: &[String]) -> Vec<&str> {
    names.iter().map(String::as_str).collect()
}

/// SQLite storage that counts writes and can be told to fail them
pub struct CountingStorage {
    pub inner: SqliteStorage,
    pub append_calls: usize,
    pub progress_writes: Vec<u32>,
    pub fail_batch_appends: bool,
    pub fail_all_appends: bool,
    pub fail_progress_load: bool,
    pub failing_names: HashSet<String>,
}

impl CountingStorage {
    pub fn new() -> Self {
        Self {
            inner: SqliteStorage::new_in_memory().unwrap(),
            append_calls: 0,
            progress_writes: Vec::new(),
            fail_batch_appends: false,
            fail_all_appends: false,
            fail_progress_load: false,
            failing_names: HashSet::new(),
        }
    }
}

impl Storage for CountingStorage {
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        self.inner.create_run(config_hash)
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        self.inner.get_latest_run()
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.inner.get_run(run_id)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        self.inner.update_run_status(run_id, status)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        self.inner.finish_run(run_id, status)
    }

    fn load_progress(&self) -> StorageResult<Vec<ProgressRecord>> {
        if self.fail_progress_load {
            return Err(StorageError::Database("progress table unreadable".to_string()));
        }
        self.inner.load_progress()
    }

    fn upsert_progress(
        &mut self,
        main_category: &str,
        sub_category: &str,
        crawled_count: u32,
    ) -> StorageResult<u32> {
        self.progress_writes.push(crawled_count);
        self.inner
            .upsert_progress(main_category, sub_category, crawled_count)
    }

    fn existing_keys(&self, main_category: &str) -> StorageResult<HashSet<String>> {
        self.inner.existing_keys(main_category)
    }

    fn append_entities(
        &mut self,
        main_category: &str,
        records: &[EntityRecord],
    ) -> StorageResult<AppendOutcome> {
        self.append_calls += 1;
        if self.fail_all_appends || (self.fail_batch_appends && records.len() > 1) {
            return Err(StorageError::Database("disk full".to_string()));
        }
        if records.iter().any(|r| self.failing_names.contains(&r.name)) {
            return Err(StorageError::Database("rejected record".to_string()));
        }
        self.inner.append_entities(main_category, records)
    }

    fn load_partition(&self, category_key: &str) -> StorageResult<Vec<EntityRecord>> {
        self.inner.load_partition(category_key)
    }

    fn list_partitions(&self) -> StorageResult<Vec<PartitionSummary>> {
        self.inner.list_partitions()
    }

    fn count_entities(&self, main_category: &str) -> StorageResult<u64> {
        self.inner.count_entities(main_category)
    }
}
