//! Category tree scan producing the harvest metadata

use crate::config::Config;
use crate::crawler::fetcher::{settle, HttpFetcher, PageFetcher};
use crate::crawler::parser::{category_links, subcategory_links};
use crate::identity::strip_count_suffix;
use crate::metadata::{write_metadata, CategoryTarget};
use crate::{NavigationError, Result};
use std::path::Path;
use tracing::{debug, info, warn};
use url::Url;

/// Lists every subcategory of the directory with its advertised size
///
/// The count shown after a subcategory label, as in `"Bánh Kẹo (99)"`,
/// becomes the target count; labels without one get 0.
///
/// # Errors
///
/// Fails only when the home page cannot be loaded. A category page that
/// fails to load is logged and skipped.
pub async fn scan_categories<F: PageFetcher>(
    fetcher: &mut F,
    config: &Config,
) -> std::result::Result<Vec<CategoryTarget>, NavigationError> {
    let base = &config.site.base_url;
    let home_url = Url::parse(base).map_err(|e| NavigationError::Unreachable {
        url: base.clone(),
        reason: e.to_string(),
    })?;

    let home = fetcher
        .navigate(&home_url)
        .await
        .map_err(|e| NavigationError::Unreachable {
            url: base.clone(),
            reason: e.to_string(),
        })?;
    settle(config.crawler.page_settle_ms).await;

    let categories = category_links(&home).unwrap_or_default();
    info!("Found {} main categories", categories.len());

    let mut targets = Vec::new();
    for category in &categories {
        let (main_category, _) = strip_count_suffix(&category.text);
        if main_category.is_empty() {
            continue;
        }

        let Ok(url) = Url::parse(&category.href) else {
            warn!("Skipping {}: bad link {}", main_category, category.href);
            continue;
        };

        let page = match fetcher.navigate(&url).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Skipping {}: {}", main_category, e);
                continue;
            }
        };
        settle(config.crawler.page_settle_ms).await;

        let subcategories = subcategory_links(&page).unwrap_or_default();
        debug!(
            "{}: {} subcategories",
            main_category,
            subcategories.len()
        );

        for link in &subcategories {
            let (sub_category, count) = strip_count_suffix(&link.text);
            if sub_category.is_empty() {
                continue;
            }
            targets.push(CategoryTarget::new(
                main_category.clone(),
                sub_category,
                count.unwrap_or(0),
            ));
        }
    }

    Ok(targets)
}

/// Scans the live directory and writes the metadata file
///
/// Returns the number of category pairs written.
pub async fn run_scan(config: &Config) -> Result<usize> {
    let mut fetcher = HttpFetcher::from_config(config)?;
    let targets = scan_categories(&mut fetcher, config).await?;

    let path = Path::new(&config.input.metadata_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_metadata(path, &targets)?;

    info!("Wrote {} category pairs to {}", targets.len(), path.display());
    Ok(targets.len())
}
