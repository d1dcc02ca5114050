//! Navigation helpers for the directory's link structure
//!
//! Everything in here is pure: label lookup over a set of rendered links and
//! construction of pagination URLs. Nothing touches the network, so the
//! traversal's navigation decisions can be tested without a live page.

mod matcher;
mod paging;

pub use matcher::resolve;
pub use paging::{page_number, page_url, resolve_href, start_page};

/// A hyperlink as rendered on a page: visible text plus absolute target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub href: String,
}

impl Link {
    pub fn new(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: href.into(),
        }
    }
}
