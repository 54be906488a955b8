//! Detail page field extraction
//!
//! Locates the four record fields on a detail page using fixed CSS selectors.
//! A selector that matches nothing yields a `None` field; extraction itself
//! never fails.
//!
//! # Anchor Rules
//!
//! | Field | Scope | Default selector |
//! |-------|-------|------------------|
//! | title | detail container | `h1` |
//! | release date | detail container | `a.ipc-link.ipc-link--baseAlt.ipc-link--inherit-color` |
//! | rating | whole page | `span.sc-bde20123-1.cMEQkK` |
//! | plot summary | whole page | `span[data-testid="plot-xs_to_m"]` |
//!
//! If the detail container is absent, both title and release date are `None`.
//! Rating and plot are located independently of the container and of each other.

use crate::config::{compile_selector, SelectorConfig};
use crate::record::{PartialRecord, RawPage};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Compiled selectors for detail pages
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    container: Selector,
    title: Selector,
    release_date: Selector,
    rating: Selector,
    plot_summary: Selector,
}

impl FieldExtractor {
    /// Compiles the detail selectors from configuration
    pub fn new(selectors: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            container: compile_selector("detail-container", &selectors.detail_container)?,
            title: compile_selector("title", &selectors.title)?,
            release_date: compile_selector("release-date", &selectors.release_date)?,
            rating: compile_selector("rating", &selectors.rating)?,
            plot_summary: compile_selector("plot-summary", &selectors.plot_summary)?,
        })
    }

    /// Extracts the record fields from a fetched page
    pub fn extract(&self, page: &RawPage) -> PartialRecord {
        self.extract_html(&page.text())
    }

    /// Extracts the record fields from markup
    ///
    /// # Example
    ///
    /// ```
    /// use marquee::config::SelectorConfig;
    /// use marquee::crawler::FieldExtractor;
    ///
    /// let extractor = FieldExtractor::new(&SelectorConfig::default()).unwrap();
    /// let html = r#"<span data-testid="plot-xs_to_m"> A plot. </span>"#;
    /// let record = extractor.extract_html(html);
    /// assert_eq!(record.plot_summary.as_deref(), Some("A plot."));
    /// assert_eq!(record.title, None);
    /// ```
    pub fn extract_html(&self, html: &str) -> PartialRecord {
        let document = Html::parse_document(html);

        let (title, release_date) = match document.select(&self.container).next() {
            Some(container) => (
                first_text(container.select(&self.title)),
                first_text(container.select(&self.release_date)),
            ),
            None => (None, None),
        };

        PartialRecord {
            title,
            release_date,
            rating: first_text(document.select(&self.rating)),
            plot_summary: first_text(document.select(&self.plot_summary)),
        }
    }
}

/// Trimmed text of the first matching element, if any and non-empty
fn first_text<'a>(mut matches: impl Iterator<Item = ElementRef<'a>>) -> Option<String> {
    matches
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
