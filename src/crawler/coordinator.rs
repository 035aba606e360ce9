//! Crawler coordinator - main crawl loop
//!
//! This module drives one breadth-first crawl:
//! - Seeding the frontier with the start URL
//! - Popping one task at a time and fetching it
//! - Feeding same-origin links from each page back into the frontier
//! - Absorbing per-page failures and honouring cancellation between fetches

use crate::crawler::fetcher::{FetchedPage, PageFetcher};
use crate::crawler::frontier::{Frontier, FrontierError};
use crate::crawler::parser::parse_html;
use crate::url::{LinkBase, UrlNormalizer};
use crate::{FerryError, FetchError};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Outcome of a finished crawl
#[derive(Debug)]
pub struct CrawlReport {
    /// Successfully fetched pages, in fetch order
    pub pages: Vec<FetchedPage>,

    /// Pages that could not be fetched
    pub failures: Vec<FetchError>,

    /// Size of the visited set when the crawl ended
    pub visited: usize,
}

impl CrawlReport {
    /// Number of fetch attempts, successful or not
    pub fn attempts(&self) -> usize {
        self.pages.len() + self.failures.len()
    }
}

/// Main crawl loop state
pub struct Coordinator<'f> {
    fetcher: &'f dyn PageFetcher,
    frontier: Frontier,
    normalizer: UrlNormalizer,
    cancel: CancellationToken,
}

impl<'f> Coordinator<'f> {
    /// Creates a coordinator for a crawl starting at `start`
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The capability pages are fetched through
    /// * `start` - The start URL; also defines the same-origin scope
    /// * `max_pages` - Upper bound on pages fetched
    /// * `cancel` - Checked before every fetch
    pub fn new(
        fetcher: &'f dyn PageFetcher,
        start: &Url,
        max_pages: usize,
        cancel: CancellationToken,
    ) -> Self {
        let normalizer = UrlNormalizer::new(start);
        let frontier = Frontier::with_seed(normalizer.base().clone(), max_pages);

        Self {
            fetcher,
            frontier,
            normalizer,
            cancel,
        }
    }

    /// Chooses what relative links are resolved against
    pub fn with_link_base(mut self, link_base: LinkBase) -> Self {
        self.normalizer = self.normalizer.with_link_base(link_base);
        self
    }

    /// Runs the crawl to completion
    ///
    /// The loop ends when the frontier runs dry. Since the frontier stops
    /// accepting URLs once `max_pages` have been seen, this also bounds the
    /// number of fetches.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - At least one page was fetched
    /// * `Err(FerryError::NothingCrawled)` - Every fetch failed
    /// * `Err(FerryError::Cancelled)` - The cancellation token fired
    pub async fn run(mut self) -> Result<CrawlReport, FerryError> {
        tracing::info!(
            "Starting crawl of {} (max {} pages)",
            self.normalizer.base(),
            self.frontier.max_pages()
        );

        let start_time = Instant::now();
        let mut pages = Vec::new();
        let mut failures = Vec::new();

        loop {
            if self.cancel.is_cancelled() {
                tracing::warn!(
                    "Crawl of {} cancelled after {} pages",
                    self.normalizer.base(),
                    pages.len() + failures.len()
                );
                return Err(FerryError::Cancelled {
                    pages: pages.len() + failures.len(),
                });
            }

            let task = match self.frontier.dequeue() {
                Ok(task) => task,
                Err(FrontierError::Empty) => break,
            };

            match self.fetcher.fetch(&task.url).await {
                Ok(page) => {
                    let (title, queued) = self.expand(&page, task.depth);
                    pages.push(page);
                    tracing::info!(
                        "Crawled {} (Depth: {}, Total: {}, New links: {}{})",
                        task.url,
                        task.depth,
                        pages.len(),
                        queued,
                        title.map(|t| format!(", Title: {}", t)).unwrap_or_default()
                    );
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    failures.push(e);
                }
            }
        }

        tracing::info!(
            "Crawl completed: {} pages fetched, {} failed, {} visited in {:?}",
            pages.len(),
            failures.len(),
            self.frontier.visited_count(),
            start_time.elapsed()
        );

        if pages.is_empty() {
            return Err(FerryError::NothingCrawled);
        }

        Ok(CrawlReport {
            pages,
            failures,
            visited: self.frontier.visited_count(),
        })
    }

    /// Offers every link on `page` to the frontier
    ///
    /// Returns the page title and the number of newly queued URLs. Kept
    /// synchronous so the parsed document never lives across an await.
    fn expand(&mut self, page: &FetchedPage, depth: u32) -> (Option<String>, usize) {
        let parsed = parse_html(page);
        let mut queued = 0;

        for link in parsed.links(&self.normalizer) {
            if self.frontier.is_full() {
                break;
            }
            if self.frontier.enqueue(link, depth + 1) {
                queued += 1;
            }
        }

        (parsed.title(), queued)
    }
}

/// Crawls a site breadth-first starting at `start`
///
/// # Example
///
/// ```no_run
/// use bucket_ferry::crawler::{build_http_client, crawl_site, HttpFetcher};
/// use bucket_ferry::config::UserAgentConfig;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10))?;
/// let fetcher = HttpFetcher::new(client, Duration::from_secs(10));
/// let start = Url::parse("https://example.com/")?;
/// let report = crawl_site(&fetcher, &start, 50, CancellationToken::new()).await?;
/// println!("{} pages", report.pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl_site(
    fetcher: &dyn PageFetcher,
    start: &Url,
    max_pages: usize,
    cancel: CancellationToken,
) -> Result<CrawlReport, FerryError> {
    Coordinator::new(fetcher, start, max_pages, cancel).run().await
}
