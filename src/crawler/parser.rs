//! Listing and navigation page parsing
//!
//! This module turns page snapshots into:
//! - Category and subcategory links for label lookup
//! - Entity stubs (name + detail link + rank) from a listing page
//! - The URL of the next listing page, if the page renders one

use crate::crawler::fetcher::{FetchError, Page};
use crate::crawler::selectors::{
    HOME_CATEGORY_LINK, LISTING_BLOCK, LISTING_ITEM, LISTING_LINK, LISTING_ORDER, NEXT_LABEL,
    PAGING_LINK, SUBCATEGORY_LINK,
};
use crate::url::{resolve_href, Link};
use tracing::debug;
use url::Url;

/// Lightweight reference to a company found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityStub {
    pub name: String,
    pub detail_url: Url,
    /// Rank shown on the page, or the 1-based position when none is shown
    pub position: u32,
}

/// Extracts the main category links of the home page
pub fn category_links(page: &Page) -> Result<Vec<Link>, FetchError> {
    links_matching(page, HOME_CATEGORY_LINK)
}

/// Extracts the subcategory links of a main category page
pub fn subcategory_links(page: &Page) -> Result<Vec<Link>, FetchError> {
    links_matching(page, SUBCATEGORY_LINK)
}

fn links_matching(page: &Page, css: &str) -> Result<Vec<Link>, FetchError> {
    let links = page
        .select(css)?
        .into_iter()
        .filter_map(|element| {
            let href = page.resolve(element.attr("href")?)?;
            Some(Link::new(element.text, href.to_string()))
        })
        .collect();
    Ok(links)
}

/// Parses a listing page into entity stubs, preserving on-page order
///
/// # Fallback Chain
///
/// 1. Listing items inside the listing block
/// 2. Listing items anywhere on the page, when the block is missing
/// 3. Bare company links, when the page has no listing items at all
///
/// Items without a company name or link are skipped.
pub fn parse_listing(page: &Page) -> Result<Vec<EntityStub>, FetchError> {
    let document = page.document();
    let items = match document.select_first(LISTING_BLOCK)? {
        Some(block) => block.select(LISTING_ITEM)?,
        None => {
            debug!("No listing block on {}, searching the whole page", page.url);
            document.select(LISTING_ITEM)?
        }
    };

    if items.is_empty() {
        let links = document.select(LISTING_LINK)?;
        if !links.is_empty() {
            debug!("No listing items on {}, using {} bare links", page.url, links.len());
        }

        let stubs = links
            .into_iter()
            .enumerate()
            .filter_map(|(i, link)| {
                let href = link.attr("href").map(str::to_string);
                stub_from(page, link.text, href.as_deref(), i as u32 + 1)
            })
            .collect();
        return Ok(stubs);
    }

    let mut stubs = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Some(link) = item.select_first(LISTING_LINK)? else {
            continue;
        };

        let position = item
            .select_first(LISTING_ORDER)?
            .and_then(|order| order.text.trim().parse::<u32>().ok())
            .unwrap_or(i as u32 + 1);

        let href = link.attr("href").map(str::to_string);
        if let Some(stub) = stub_from(page, link.text, href.as_deref(), position) {
            stubs.push(stub);
        }
    }

    Ok(stubs)
}

fn stub_from(page: &Page, name: String, href: Option<&str>, position: u32) -> Option<EntityStub> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return None;
    }

    let href = href?.trim();
    if href.is_empty() || href == "#" {
        return None;
    }

    Some(EntityStub {
        name,
        detail_url: page.resolve(href)?,
        position,
    })
}

/// Finds the URL of the page after `page_number`
///
/// The "Tiếp" control is preferred; otherwise a pagination link labelled
/// with the next page number is used.
pub fn find_next_link(
    page: &Page,
    listing_base: &Url,
    page_number: u32,
) -> Result<Option<Url>, FetchError> {
    let links = page.select(PAGING_LINK)?;

    let next_control = links
        .iter()
        .filter(|link| link.text.trim() == NEXT_LABEL)
        .find_map(|link| resolve_href(listing_base, &page.url, link.attr("href")?));
    if next_control.is_some() {
        return Ok(next_control);
    }

    let wanted = (page_number + 1).to_string();
    let numbered = links
        .iter()
        .filter(|link| link.text.trim() == wanted)
        .find_map(|link| resolve_href(listing_base, &page.url, link.attr("href")?));

    Ok(numbered)
}
