use serde::Deserialize;

/// Listing page the original scraper targets
pub const DEFAULT_LISTING_URL: &str = "https://www.imdb.com/chart/moviemeter/?ref_=nv_mv_mpm";

/// Origin prefixed to relative item links
pub const DEFAULT_ORIGIN: &str = "https://imdb.com";

/// Identity header sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/42.0.2311.135 Safari/537.36 Edge/12.246";

/// Main configuration structure for Marquee
///
/// Every section falls back to its defaults, so an empty file (or no file at
/// all) reproduces the stock IMDb "most popular movies" scrape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub selectors: SelectorConfig,
}

/// Scraper behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Listing page enumerating the ranked items
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Site origin used to absolutize item links
    pub origin: String,

    /// Maximum number of concurrent detail workers
    #[serde(rename = "max-workers")]
    pub max_workers: u32,

    /// Upper bound of the random pre-fetch delay (milliseconds)
    #[serde(rename = "max-jitter-ms")]
    pub max_jitter_ms: u64,

    /// Whole-request timeout for a single fetch (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Consecutive sink failures after which the run is halted
    #[serde(rename = "max-sink-failures")]
    pub max_sink_failures: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            max_workers: 10,
            max_jitter_ms: 200,
            fetch_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_sink_failures: 3,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Full `User-Agent` header value
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// CSV file records are appended to
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Log file the run is recorded in
    #[serde(rename = "log-path")]
    pub log_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "movies.csv".to_string(),
            log_path: "imdb_scraper.log".to_string(),
        }
    }
}

/// CSS selectors locating the structural anchors on listing and detail pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Container holding the ranked item collection
    #[serde(rename = "listing-container")]
    pub listing_container: String,

    /// One ranked item inside the container
    #[serde(rename = "listing-item")]
    pub listing_item: String,

    /// Anchor inside an item pointing at its detail page
    #[serde(rename = "listing-anchor")]
    pub listing_anchor: String,

    /// Container holding the title and release date
    #[serde(rename = "detail-container")]
    pub detail_container: String,

    /// Title, searched within the detail container
    pub title: String,

    /// Release date, searched within the detail container
    #[serde(rename = "release-date")]
    pub release_date: String,

    /// Rating, searched across the whole page
    pub rating: String,

    /// Plot summary, searched across the whole page
    #[serde(rename = "plot-summary")]
    pub plot_summary: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_container: r#"div[data-testid="chart-layout-main-column"] ul"#.to_string(),
            listing_item: "li".to_string(),
            listing_anchor: "a[href]".to_string(),
            detail_container: "div.sc-92625f35-3.frxYSZ".to_string(),
            title: "h1".to_string(),
            release_date: "a.ipc-link.ipc-link--baseAlt.ipc-link--inherit-color".to_string(),
            rating: "span.sc-bde20123-1.cMEQkK".to_string(),
            plot_summary: r#"span[data-testid="plot-xs_to_m"]"#.to_string(),
        }
    }
}

impl SelectorConfig {
    /// Selector rules paired with their config key, for validation and reporting
    pub fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("listing-container", &self.listing_container),
            ("listing-item", &self.listing_item),
            ("listing-anchor", &self.listing_anchor),
            ("detail-container", &self.detail_container),
            ("title", &self.title),
            ("release-date", &self.release_date),
            ("rating", &self.rating),
            ("plot-summary", &self.plot_summary),
        ]
    }
}
