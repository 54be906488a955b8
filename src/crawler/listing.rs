//! Listing page extraction
//!
//! Fetches the ranked listing page and turns it into absolute [`ItemLink`]s.
//! The listing container being absent is fatal for the run: without it no
//! items can be discovered.

use crate::config::{compile_selector, SelectorConfig};
use crate::crawler::fetcher::PageFetcher;
use crate::record::ItemLink;
use crate::{ConfigError, MarqueeError};
use scraper::{Html, Selector};
use url::Url;

/// Compiled selectors for the listing page
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    container: Selector,
    item: Selector,
    anchor: Selector,
}

impl ListingSelectors {
    pub fn new(selectors: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            container: compile_selector("listing-container", &selectors.listing_container)?,
            item: compile_selector("listing-item", &selectors.listing_item)?,
            anchor: compile_selector("listing-anchor", &selectors.listing_anchor)?,
        })
    }
}

/// Fetches the listing page and extracts its item links
///
/// # Errors
///
/// * `MarqueeError::Fetch` - transport failure or non-2xx status
/// * `MarqueeError::Parse` - the item container is absent or the origin is invalid
pub async fn fetch_listing(
    fetcher: &dyn PageFetcher,
    url: &str,
    user_agent: &str,
    origin: &str,
    selectors: &ListingSelectors,
) -> Result<Vec<ItemLink>, MarqueeError> {
    tracing::info!("Fetching listing page: {}", url);
    let page = fetcher.fetch(url, user_agent).await?;
    parse_listing(&page.text(), url, origin, selectors)
}

/// Extracts item links from listing markup
///
/// Each item's first anchor `href` is joined onto `origin`. Items without an
/// anchor are skipped. Item order is preserved.
pub fn parse_listing(
    html: &str,
    url: &str,
    origin: &str,
    selectors: &ListingSelectors,
) -> Result<Vec<ItemLink>, MarqueeError> {
    let origin = Url::parse(origin).map_err(|e| MarqueeError::Parse {
        url: url.to_string(),
        message: format!("invalid origin '{}': {}", origin, e),
    })?;

    let document = Html::parse_document(html);
    let container = document
        .select(&selectors.container)
        .next()
        .ok_or_else(|| MarqueeError::Parse {
            url: url.to_string(),
            message: "listing container not found".to_string(),
        })?;

    let mut links = Vec::new();
    for (position, item) in container.select(&selectors.item).enumerate() {
        let href = item
            .select(&selectors.anchor)
            .next()
            .and_then(|anchor| anchor.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty());

        let Some(href) = href else {
            tracing::debug!("Listing item {} has no link, skipping", position + 1);
            continue;
        };

        match origin.join(href) {
            Ok(absolute) => links.push(ItemLink::new(absolute.to_string())),
            Err(e) => tracing::debug!("Skipping unresolvable link {}: {}", href, e),
        }
    }

    Ok(links)
}
