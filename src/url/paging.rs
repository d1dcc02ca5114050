use url::Url;

/// Name of the query parameter the directory uses for pagination
const PAGE_PARAM: &str = "page";

/// Builds the URL of a numbered listing page
///
/// Page 1 is the listing URL itself. Any existing `page` parameter is
/// replaced; other query parameters are kept.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use yp_harvest::url::page_url;
///
/// let base = Url::parse("https://www.yellowpages.vn/cls/1/bep-gas.html").unwrap();
/// assert_eq!(page_url(&base, 1).as_str(), "https://www.yellowpages.vn/cls/1/bep-gas.html");
/// assert_eq!(
///     page_url(&base, 3).as_str(),
///     "https://www.yellowpages.vn/cls/1/bep-gas.html?page=3"
/// );
/// ```
pub fn page_url(base: &Url, page: u32) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.set_query(None);

    if kept.is_empty() && page <= 1 {
        return url;
    }

    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
        if page > 1 {
            pairs.append_pair(PAGE_PARAM, &page.to_string());
        }
    }

    url
}

/// Computes the page to start from when resuming a partially crawled listing
///
/// This is an approximation: it assumes every page holds `page_size`
/// listings, so a resumed crawl may revisit or skip a few entries near a
/// page boundary. Already captured companies are filtered by name anyway.
///
/// ```
/// use yp_harvest::url::start_page;
///
/// assert_eq!(start_page(0, 45), 1);
/// assert_eq!(start_page(44, 45), 1);
/// assert_eq!(start_page(45, 45), 2);
/// assert_eq!(start_page(100, 45), 3);
/// ```
pub fn start_page(start_offset: u32, page_size: u32) -> u32 {
    if start_offset == 0 || page_size == 0 {
        return 1;
    }
    start_offset / page_size + 1
}

/// Resolves a pagination `href` into an absolute URL
///
/// Query-only hrefs (`?page=4`) are resolved against the listing's base URL;
/// anything else is resolved against the page it was found on. Placeholder
/// and script links yield `None`.
pub fn resolve_href(listing_base: &Url, current: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href == "#" || href.starts_with("javascript:") {
        return None;
    }

    let resolved = if href.starts_with('?') {
        listing_base.join(href)
    } else {
        current.join(href)
    };

    match resolved {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        _ => None,
    }
}

/// Reads the page number carried by a listing URL, defaulting to 1
pub fn page_number(url: &Url) -> u32 {
    url.query_pairs()
        .find(|(key, _)| key == PAGE_PARAM)
        .and_then(|(_, value)| value.parse().ok())
        .unwrap_or(1)
}
