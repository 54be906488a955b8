use async_trait::async_trait;
use marquee::config::Config;
use marquee::crawler::{Coordinator, PageFetcher};
use marquee::output::{CsvSink, RecordSink};
use marquee::{FetchError, MarqueeError, RawPage};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_AGENT: &str = "MarqueeTest/1.0";
const LISTING_PATH: &str = "/chart/moviemeter/";

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, csv_path: &Path) -> Config {
    let mut config = Config::default();
    config.scraper.listing_url = format!("{}{}", base_url, LISTING_PATH);
    config.scraper.origin = base_url.to_string();
    config.scraper.max_workers = 10;
    config.scraper.max_jitter_ms = 0; // No politeness delay in tests
    config.user_agent.value = TEST_AGENT.to_string();
    config.output.csv_path = csv_path.display().to_string();
    config
}

fn listing_page(ids: &[&str]) -> String {
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<li class="ipc-metadata-list-summary-item"><a href="/title/{}/?ref_=chtmvm_t">Poster</a></li>"#,
                id
            )
        })
        .collect();
    format!(
        r#"<html><body><div data-testid="chart-layout-main-column"><ul>{}</ul></div></body></html>"#,
        items
    )
}

fn detail_page(title: &str, date: &str, rating: Option<&str>, plot: &str) -> String {
    let rating = rating
        .map(|r| format!(r#"<span class="sc-bde20123-1 cMEQkK">{}</span>"#, r))
        .unwrap_or_default();
    format!(
        r#"<html><body>
            <div class="sc-92625f35-3 frxYSZ">
                <h1>{}</h1>
                <a class="ipc-link ipc-link--baseAlt ipc-link--inherit-color" href="/releaseinfo">{}</a>
            </div>
            <div>{}</div>
            <span data-testid="plot-xs_to_m">{}</span>
        </body></html>"#,
        title, date, rating, plot
    )
}

async fn mount_listing(server: &MockServer, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(header("user-agent", TEST_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(ids)))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, body: String, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(format!("/title/{}/", id)))
        .and(header("user-agent", TEST_AGENT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .set_delay(delay),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Shared in-memory log buffer for a test subscriber
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

/// Routes this thread's log output into the returned buffer
///
/// The current-thread test runtime polls every worker task on this thread,
/// so the worker log lines are captured too.
fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}

fn read_rows(csv_path: &Path) -> Vec<String> {
    std::fs::read_to_string(csv_path)
        .expect("Failed to read output")
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_incomplete_item_is_skipped() {
    let (logs, _log_guard) = capture_logs();
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("movies.csv");

    mount_listing(&mock_server, &["ttA", "ttB", "ttC"]).await;
    mount_detail(
        &mock_server,
        "ttA",
        detail_page("Alpha", "2021", Some("7.1"), "Alpha plot."),
        Duration::ZERO,
    )
    .await;
    mount_detail(
        &mock_server,
        "ttB",
        detail_page("Beta", "2022", Some("8.2"), "Beta plot."),
        Duration::ZERO,
    )
    .await;
    // C has no rating
    mount_detail(
        &mock_server,
        "ttC",
        detail_page("Gamma", "2023", None, "Gamma plot."),
        Duration::ZERO,
    )
    .await;

    let config = create_test_config(&mock_server.uri(), &csv_path);
    let listing_url = config.scraper.listing_url.clone();
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run(&listing_url).await.expect("Scrape failed");

    assert_eq!(summary.links_found, 3);
    assert_eq!(summary.saved, 2);
    assert_eq!(summary.skipped_missing, 1);
    assert_eq!(summary.fetch_failed, 0);

    let mut rows = read_rows(&csv_path);
    rows.sort();
    assert_eq!(
        rows,
        vec![
            "Alpha,2021,7.1,Alpha plot.".to_string(),
            "Beta,2022,8.2,Beta plot.".to_string(),
        ]
    );

    let logs = logs.contents();
    let skips: Vec<&str> = logs
        .lines()
        .filter(|line| line.contains("No movie data found for:"))
        .collect();
    assert_eq!(skips.len(), 1, "expected one skip line, log was:\n{}", logs);
    assert!(skips[0].contains("WARN"));
    assert!(skips[0].contains("/title/ttC/"));
    assert!(skips[0].contains("rating"));
    assert!(logs.contains("Movie details saved for: Alpha"));
    assert!(logs.contains("Movie details saved for: Beta"));
}

#[tokio::test]
async fn test_missing_listing_container_aborts_before_details() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("movies.csv");

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><ul><li><a href="/title/ttA/">A</a></li></ul></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    // No detail page may be requested
    Mock::given(method("GET"))
        .and(path("/title/ttA/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &csv_path);
    let listing_url = config.scraper.listing_url.clone();
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let result = coordinator.run(&listing_url).await;

    assert!(matches!(result, Err(MarqueeError::Parse { .. })));
    assert!(!csv_path.exists(), "output store must be untouched");
}

#[tokio::test]
async fn test_listing_error_status_is_fetch_error() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("movies.csv");

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &csv_path);
    let listing_url = config.scraper.listing_url.clone();
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let result = coordinator.run(&listing_url).await;

    assert!(matches!(
        result,
        Err(MarqueeError::Fetch(FetchError::Status { status: 503, .. }))
    ));
    assert!(!csv_path.exists());
}

#[tokio::test]
async fn test_failing_items_do_not_affect_others() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("movies.csv");

    mount_listing(&mock_server, &["ttOk", "ttErr", "ttSlow"]).await;
    mount_detail(
        &mock_server,
        "ttOk",
        detail_page("Survivor", "2020", Some("6.5"), "Still here."),
        Duration::ZERO,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/title/ttErr/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    // Slower than the fetch timeout
    Mock::given(method("GET"))
        .and(path("/title/ttSlow/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("Late", "2020", Some("5.0"), "Too late."))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), &csv_path);
    config.scraper.fetch_timeout_secs = 1;
    let listing_url = config.scraper.listing_url.clone();
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run(&listing_url).await.expect("Scrape failed");

    assert_eq!(summary.saved, 1);
    assert_eq!(summary.fetch_failed, 2);
    assert_eq!(read_rows(&csv_path), vec!["Survivor,2020,6.5,Still here.".to_string()]);
}

#[tokio::test]
async fn test_detail_fetches_run_concurrently() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("movies.csv");
    let delay = Duration::from_millis(400);

    mount_listing(&mock_server, &["tt1", "tt2", "tt3"]).await;
    for (id, title) in [("tt1", "One"), ("tt2", "Two"), ("tt3", "Three")] {
        mount_detail(
            &mock_server,
            id,
            detail_page(title, "2024", Some("7.0"), "Plot."),
            delay,
        )
        .await;
    }

    let config = create_test_config(&mock_server.uri(), &csv_path);
    let listing_url = config.scraper.listing_url.clone();
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");

    let start = Instant::now();
    let summary = coordinator.run(&listing_url).await.expect("Scrape failed");
    let elapsed = start.elapsed();

    assert_eq!(summary.pool_size, 3);
    assert_eq!(summary.saved, 3);
    // Sequential fetching would take at least 3 * 400ms
    assert!(
        elapsed < Duration::from_millis(1100),
        "expected concurrent fetches, run took {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_repeated_runs_accumulate_rows() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("movies.csv");

    mount_listing(&mock_server, &["ttX"]).await;
    Mock::given(method("GET"))
        .and(path("/title/ttX/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(
            "Repeat, Again",
            "1999",
            Some("9.0"),
            "He said \"again\".",
        )))
        .expect(2)
        .mount(&mock_server)
        .await;

    for _ in 0..2 {
        let config = create_test_config(&mock_server.uri(), &csv_path);
        let listing_url = config.scraper.listing_url.clone();
        let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
        let summary = coordinator.run(&listing_url).await.expect("Scrape failed");
        assert_eq!(summary.saved, 1);
    }

    let expected = r#""Repeat, Again",1999,9.0,"He said ""again"".""#.to_string();
    assert_eq!(read_rows(&csv_path), vec![expected.clone(), expected]);
}

/// Serves canned pages after a short delay while tracking concurrent calls
struct CountingFetcher {
    pages: HashMap<String, String>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl CountingFetcher {
    fn new(listing_url: &str, count: usize) -> Self {
        let ids: Vec<String> = (0..count).map(|i| format!("tt{}", i)).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let mut pages = HashMap::new();
        pages.insert(listing_url.to_string(), listing_page(&id_refs));
        for id in &ids {
            pages.insert(
                format!("https://fake.test/title/{}/?ref_=chtmvm_t", id),
                detail_page(id, "2024", Some("7.5"), "Plot."),
            );
        }

        Self {
            pages,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PageFetcher for CountingFetcher {
    async fn fetch(&self, url: &str, _user_agent: &str) -> Result<RawPage, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(25)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.pages
            .get(url)
            .map(|body| RawPage::new(url, body.as_bytes()))
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

async fn peak_in_flight(items: usize, max_workers: u32) -> (usize, usize) {
    let dir = TempDir::new().unwrap();
    let listing_url = "https://fake.test/chart/";

    let mut config = create_test_config("https://fake.test", &dir.path().join("movies.csv"));
    config.scraper.max_workers = max_workers;

    let fetcher = Arc::new(CountingFetcher::new(listing_url, items));
    let sink: Arc<dyn RecordSink> = Arc::new(CsvSink::new(dir.path().join("movies.csv")));
    let coordinator = Coordinator::with_parts(config, fetcher.clone(), sink)
        .expect("Failed to create coordinator");

    let summary = coordinator.run(listing_url).await.expect("Scrape failed");
    (fetcher.peak.load(Ordering::SeqCst), summary.saved)
}

#[tokio::test]
async fn test_in_flight_fetches_bounded_by_max_workers() {
    let (peak, saved) = peak_in_flight(12, 3).await;
    assert_eq!(saved, 12);
    assert!(peak <= 3, "peak in-flight fetches was {}", peak);
    assert!(peak >= 2, "fetches should overlap, peak was {}", peak);
}

#[tokio::test]
async fn test_in_flight_fetches_bounded_by_item_count() {
    let (peak, saved) = peak_in_flight(2, 10).await;
    assert_eq!(saved, 2);
    assert!(peak <= 2, "peak in-flight fetches was {}", peak);
}
