use serde::Deserialize;

/// Main configuration structure for yp-harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// Target directory site
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Home page of the directory; category links are resolved from here
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Assumed number of listings per page, used to turn a resume offset
    /// into a starting page number
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of successful captures between flushes
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: u32,

    /// Consecutive pages without new entities before pagination stops
    #[serde(rename = "max-empty-pages", default = "default_max_empty_pages")]
    pub max_empty_pages: u32,

    /// Pages speculatively tried when the listing has no "next" control
    #[serde(rename = "probe-ahead-pages", default = "default_probe_ahead_pages")]
    pub probe_ahead_pages: u32,

    /// Delay after loading a listing or category page (milliseconds)
    #[serde(rename = "page-settle-ms", default = "default_page_settle_ms")]
    pub page_settle_ms: u64,

    /// Delay after loading a company detail page (milliseconds)
    #[serde(rename = "detail-settle-ms", default = "default_detail_settle_ms")]
    pub detail_settle_ms: u64,

    /// Delay after returning to a listing page (milliseconds)
    #[serde(rename = "return-settle-ms", default = "default_return_settle_ms")]
    pub return_settle_ms: u64,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_empty_pages: default_max_empty_pages(),
            probe_ahead_pages: default_probe_ahead_pages(),
            page_settle_ms: default_page_settle_ms(),
            detail_settle_ms: default_detail_settle_ms(),
            return_settle_ms: default_return_settle_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Browser identity presented to the site
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    pub value: String,
}

/// Input files
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// CSV with columns main_category, sub_category, number_website
    #[serde(rename = "metadata-path")]
    pub metadata_path: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database holding progress and captured companies
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory receiving one CSV per main category
    #[serde(rename = "export-dir")]
    pub export_dir: String,
}

fn default_page_size() -> u32 {
    45
}

fn default_batch_size() -> u32 {
    10
}

fn default_max_empty_pages() -> u32 {
    5
}

fn default_probe_ahead_pages() -> u32 {
    3
}

fn default_page_settle_ms() -> u64 {
    3000
}

fn default_detail_settle_ms() -> u64 {
    3000
}

fn default_return_settle_ms() -> u64 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    30
}
