//! Page fetching
//!
//! This module provides the fetcher capability the traversal drives:
//! - `PageFetcher`: navigate to a URL and get back a snapshot of the page
//! - `Page` / `Element`: owned snapshots queried with CSS selectors
//! - `Document`: a page parsed once for several queries
//! - `HttpFetcher`: the production fetcher backed by a reqwest client
//!
//! Snapshots are plain strings, so no parsed document is held across an
//! await point.

use crate::config::{Config, UserAgentConfig};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Errors raised while loading or querying a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Timed out loading {url}")]
    Timeout { url: String },

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// Capability to load pages, one at a time, in a single browsing session
#[async_trait]
pub trait PageFetcher: Send {
    /// Loads `url` and returns a snapshot of the rendered page
    async fn navigate(&mut self, url: &Url) -> Result<Page, FetchError>;

    /// URL of the page most recently loaded
    fn current_url(&self) -> Option<&Url>;
}

/// Snapshot of a loaded page
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL of the page, after redirects
    pub url: Url,
    pub body: String,
}

impl Page {
    pub fn new(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            body: body.into(),
        }
    }

    /// Parses the page once for repeated queries
    pub fn document(&self) -> Document {
        Document {
            html: Html::parse_document(&self.body),
        }
    }

    /// Finds all elements matching `css`, in document order
    ///
    /// Parses the page on every call; use [`Page::document`] for more than
    /// one query.
    pub fn select(&self, css: &str) -> Result<Vec<Element>, FetchError> {
        self.document().select(css)
    }

    /// Finds the first element matching `css`
    pub fn select_first(&self, css: &str) -> Result<Option<Element>, FetchError> {
        self.document().select_first(css)
    }

    /// Resolves a link found on this page into an absolute URL
    pub fn resolve(&self, href: &str) -> Option<Url> {
        self.url.join(href.trim()).ok()
    }
}

/// A parsed page
///
/// Not `Send`; query it and drop it before the next await.
pub struct Document {
    html: Html,
}

impl Document {
    /// Finds all elements matching `css`, in document order
    pub fn select(&self, css: &str) -> Result<Vec<Element>, FetchError> {
        let selector = parse_selector(css)?;
        Ok(self.html.select(&selector).map(Element::from_ref).collect())
    }

    /// Finds the first element matching `css`
    pub fn select_first(&self, css: &str) -> Result<Option<Element>, FetchError> {
        let selector = parse_selector(css)?;
        Ok(self.html.select(&selector).next().map(Element::from_ref))
    }

    /// The underlying tree, for walks selectors cannot express
    pub fn html(&self) -> &Html {
        &self.html
    }
}

/// Snapshot of one element: its rendered text, attributes and markup
#[derive(Debug, Clone)]
pub struct Element {
    /// Text content with whitespace collapsed
    pub text: String,
    html: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    fn from_ref(element: ElementRef<'_>) -> Self {
        Self {
            text: collapse_whitespace(&element.text().collect::<String>()),
            html: element.html(),
            attrs: element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    /// Finds descendants of this element matching `css`
    pub fn select(&self, css: &str) -> Result<Vec<Element>, FetchError> {
        let selector = parse_selector(css)?;
        let fragment = Html::parse_fragment(&self.html);
        let root = fragment.root_element();
        let scope = root.children().find_map(ElementRef::wrap).unwrap_or(root);

        let found = scope
            .select(&selector)
            .filter(|element| element.id() != scope.id())
            .map(Element::from_ref)
            .collect();
        Ok(found)
    }

    /// Finds the first descendant of this element matching `css`
    pub fn select_first(&self, css: &str) -> Result<Option<Element>, FetchError> {
        Ok(self.select(css)?.into_iter().next())
    }
}

fn parse_selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|_| FetchError::InvalidSelector(css.to_string()))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Waits for a page to settle after navigation
///
/// A zero delay returns immediately.
pub async fn settle(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Builds an HTTP client presenting the configured browser identity
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout_secs` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use yp_harvest::config::UserAgentConfig;
/// use yp_harvest::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     value: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
/// };
///
/// let client = build_http_client(&config, 30).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.value.as_str())
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a plain HTTP client
pub struct HttpFetcher {
    client: Client,
    current: Option<Url>,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            current: None,
        }
    }

    /// Builds a fetcher from the user agent and timeout settings
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout_secs)
            .map_err(|source| FetchError::Http {
                url: config.site.base_url.clone(),
                source,
            })?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn navigate(&mut self, url: &Url) -> Result<Page, FetchError> {
        debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Http {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

        self.current = Some(final_url.clone());
        Ok(Page::new(final_url, body))
    }

    fn current_url(&self) -> Option<&Url> {
        self.current.as_ref()
    }
}
