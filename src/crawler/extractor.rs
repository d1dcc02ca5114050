//! Company detail extraction

use crate::crawler::fetcher::{collapse_whitespace, Document, FetchError, Page};
use crate::crawler::selectors::{
    DETAIL_BUSINESS, DETAIL_INFO_ROW, DETAIL_NAME, DETAIL_PHONE, DETAIL_PRODUCTS,
    DETAIL_SECTION_HEADING, DETAIL_WEBSITE, INTRO_HEADING_TEXT,
};
use crate::metadata::CategoryTarget;
use crate::storage::EntityRecord;
use scraper::{ElementRef, Selector};
use thiserror::Error;

/// Errors raised while extracting a company from its detail page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No company name on {0}")]
    MissingName(String),

    #[error("Detail page could not be queried: {0}")]
    Query(#[from] FetchError),
}

/// Turns a loaded detail page into a flat company record
pub trait DetailExtractor {
    fn extract(&self, page: &Page, target: &CategoryTarget) -> Result<EntityRecord, ExtractError>;
}

/// Extractor for the directory's company detail layout
///
/// Every field except the name is optional and left empty when its element
/// is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct YellowPagesExtractor;

impl DetailExtractor for YellowPagesExtractor {
    fn extract(&self, page: &Page, target: &CategoryTarget) -> Result<EntityRecord, ExtractError> {
        let document = page.document();

        let name = first_text(&document, DETAIL_NAME)?;
        if name.is_empty() {
            return Err(ExtractError::MissingName(page.url.to_string()));
        }

        let rows = document.select(DETAIL_INFO_ROW)?;
        let address = rows.first().map(|row| row.text.clone()).unwrap_or_default();

        let (phone, hotline) = match rows.get(1) {
            Some(row) => {
                let numbers = row.select(DETAIL_PHONE)?;
                (
                    numbers.first().map(|n| n.text.clone()).unwrap_or_default(),
                    numbers.get(1).map(|n| n.text.clone()).unwrap_or_default(),
                )
            }
            None => (String::new(), String::new()),
        };

        let email = match rows.get(2) {
            Some(row) => row.select_first("a")?.map(|a| a.text).unwrap_or_default(),
            None => String::new(),
        };

        let mut products = Vec::new();
        for css in DETAIL_PRODUCTS {
            let text = first_text(&document, css)?;
            if !text.is_empty() {
                products.push(text);
            }
        }

        Ok(EntityRecord {
            name,
            address,
            phone,
            hotline,
            email,
            website: first_text(&document, DETAIL_WEBSITE)?,
            description: introduction(&document)?,
            business: first_text(&document, DETAIL_BUSINESS)?,
            products: products.join(" "),
            main_category: target.main_category.clone(),
            sub_category: target.sub_category.clone(),
        })
    }
}

fn first_text(document: &Document, css: &str) -> Result<String, FetchError> {
    Ok(document.select_first(css)?.map(|e| e.text).unwrap_or_default())
}

/// Joins the text of every element following the introduction heading
fn introduction(document: &Document) -> Result<String, FetchError> {
    let heading = Selector::parse(DETAIL_SECTION_HEADING)
        .map_err(|_| FetchError::InvalidSelector(DETAIL_SECTION_HEADING.to_string()))?;

    let intro = document
        .html()
        .select(&heading)
        .find(|h| {
            h.text()
                .collect::<String>()
                .to_lowercase()
                .contains(INTRO_HEADING_TEXT)
        })
        .map(|h| {
            h.next_siblings()
                .filter_map(ElementRef::wrap)
                .map(|sibling| collapse_whitespace(&sibling.text().collect::<String>()))
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    Ok(intro)
}
