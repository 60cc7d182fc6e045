//! Browse-listing scraper and pagination aggregator
//!
//! The npmjs "most depended upon" listing is a paginated HTML page; each
//! page links every package as an anchor carrying the `.name` class whose
//! href is `/package/<name>`. [`BrowseClient::aggregate`] turns that
//! listing into a flat, order-preserving list of exactly `count` names.
//!
//! The listing site sporadically serves pages with zero package anchors.
//! That condition is retried in place under [`EmptyPageRetry`]; transport
//! and status errors are never retried.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{Client, ClientBuilder};
use scraper::{Html, Selector};
use tracing::debug;

use vetch_core::error::VetchError;

use crate::RegistryResult;

/// CSS marker for package anchors on the listing page
const NAME_SELECTOR: &str = ".name";

/// Href prefix stripped from each package anchor
const PACKAGE_HREF_PREFIX: &str = "/package/";

/// Retry policy for listing pages that come back without any names
#[derive(Debug, Clone)]
pub struct EmptyPageRetry {
    /// Maximum number of requests for one URL before giving up
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Cap on the backoff delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for EmptyPageRetry {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

/// Client for the paginated browse listing
#[derive(Debug, Clone)]
pub struct BrowseClient {
    client: Client,
    /// Listing URL ending in an `offset=` suffix; page offsets are appended
    base_url: String,
    /// Concurrency cap for extra-page scrapes
    scrape_limit: usize,
    retry: EmptyPageRetry,
}

impl BrowseClient {
    /// Create a browse client for a listing base URL
    pub fn new(base_url: impl Into<String>) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .user_agent(concat!("vetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VetchError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            scrape_limit: 1,
            retry: EmptyPageRetry::default(),
        })
    }

    /// Set the extra-page scrape concurrency (minimum 1)
    pub fn with_scrape_limit(mut self, limit: usize) -> Self {
        self.scrape_limit = limit.max(1);
        self
    }

    /// Replace the empty-page retry policy
    pub fn with_retry(mut self, retry: EmptyPageRetry) -> Self {
        self.retry = retry;
        self
    }

    /// Scrape one listing page into its ordered package names.
    ///
    /// An empty result is treated as a transient listing glitch and the
    /// same URL is re-requested with backoff until the retry policy is
    /// exhausted. HTTP failures propagate immediately.
    pub async fn scrape_page(&self, url: &str) -> RegistryResult<Vec<String>> {
        let mut delay = self.retry.initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| VetchError::network(format!("Failed to fetch {}", url), e))?;

            if !response.status().is_success() {
                return Err(VetchError::network_msg(format!(
                    "Listing returned status {} for {}",
                    response.status(),
                    url
                )));
            }

            let body = response
                .text()
                .await
                .map_err(|e| VetchError::network(format!("Failed to read {}", url), e))?;

            let names = extract_names(&body)?;
            if !names.is_empty() {
                debug!(url = %url, count = names.len(), "packages on this page");
                return Ok(names);
            }

            if attempt >= self.retry.max_attempts {
                return Err(VetchError::EmptyListing {
                    url: url.to_string(),
                    attempts: attempt,
                });
            }

            debug!(url = %url, attempt, "listing page was empty, retrying");
            tokio::time::sleep(delay).await;
            delay = std::cmp::min(
                Duration::from_millis((delay.as_millis() as f64 * self.retry.multiplier) as u64),
                self.retry.max_delay,
            );
        }
    }

    /// Aggregate listing pages into exactly `count` package names.
    ///
    /// The first page defines the page size and seeds the accumulator.
    /// Remaining pages are fetched with bounded concurrency but appended
    /// in page order, so the overall ranking survives regardless of
    /// completion order. Any page failure aborts the aggregation.
    pub async fn aggregate(&self, count: usize) -> RegistryResult<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut names = self.scrape_page(&self.base_url).await?;
        let page_size = names.len();
        debug!(page_size, count, "learned listing page size");

        if count <= page_size {
            names.truncate(count);
            return Ok(names);
        }

        let extra_pages = count.div_ceil(page_size) - 1;
        debug!(extra_pages, "fetching additional listing pages");

        // Each request carries its page index up front; `buffered` keeps
        // completion out of the picture and yields pages in page order.
        let mut pages = stream::iter(1..=extra_pages)
            .map(|page| {
                let url = format!("{}{}", self.base_url, page * page_size);
                async move { self.scrape_page(&url).await }
            })
            .buffered(self.scrape_limit);

        while let Some(page) = pages.next().await {
            names.extend(page?);
        }

        names.truncate(count);
        Ok(names)
    }
}

/// Pull package names out of a listing page body, in document order.
///
/// Anchors without an href are skipped; hrefs keep everything after the
/// `/package/` prefix, which preserves scoped names verbatim.
fn extract_names(html: &str) -> RegistryResult<Vec<String>> {
    let selector = Selector::parse(NAME_SELECTOR).map_err(|e| VetchError::ConfigValidation {
        field: "name_selector".to_string(),
        reason: format!("{:?}", e),
    })?;

    let document = Html::parse_document(html);
    let names = document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.strip_prefix(PACKAGE_HREF_PREFIX).unwrap_or(href).to_string())
        .collect();

    Ok(names)
}
