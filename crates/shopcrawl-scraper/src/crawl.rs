//! Crawl orchestration.
//!
//! Drives sitemap resolution, URL extraction, and the fetch/extract
//! pipeline through a bounded pool of concurrent workers. Each URL moves
//! through fetch → extract independently; a failure at any stage terminates
//! only that URL. The shared result collection is the single piece of
//! mutable state touched by more than one worker and is guarded by one
//! mutex around append.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream::{self, StreamExt};

use shopcrawl_core::ProductRecord;

use crate::client::PageClient;
use crate::pipeline::ExtractionPipeline;
use crate::sitemap;

/// Thread-safe accumulator for completed product records.
///
/// Workers append in completion order; nothing mutates a record after it is
/// pushed. Cloning shares the underlying collection.
#[derive(Clone, Default)]
pub struct ProductSink {
    inner: Arc<Mutex<Vec<ProductRecord>>>,
}

impl ProductSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, record: ProductRecord) {
        self.inner
            .lock()
            .expect("product sink lock poisoned")
            .push(record);
    }

    /// Drains the accumulated records.
    #[must_use]
    pub fn into_records(self) -> Vec<ProductRecord> {
        std::mem::take(
            &mut *self
                .inner
                .lock()
                .expect("product sink lock poisoned"),
        )
    }
}

pub struct Crawler {
    client: PageClient,
    pipeline: ExtractionPipeline,
    max_workers: usize,
    completion_delay: Duration,
}

impl Crawler {
    pub fn new(
        client: PageClient,
        pipeline: ExtractionPipeline,
        max_workers: usize,
        completion_delay_ms: u64,
    ) -> Self {
        Self {
            client,
            pipeline,
            max_workers: max_workers.max(1),
            completion_delay: Duration::from_millis(completion_delay_ms),
        }
    }

    /// Crawls one site: resolves its sitemaps, deduplicates the candidate
    /// product URLs, and runs fetch + extract for each through the worker
    /// pool. Returns all successfully extracted records, in completion
    /// order.
    ///
    /// Total failure to find any URL is not an error; the result is simply
    /// empty.
    pub async fn run(&self, site_root: &str) -> Vec<ProductRecord> {
        tracing::info!(site = %site_root, "starting crawl");

        let mut sitemaps = sitemap::resolve_sitemaps(&self.client, site_root).await;
        if sitemaps.is_empty() {
            // No index entries: treat the root sitemap itself as a leaf.
            tracing::warn!(site = %site_root, "no sitemap index entries; trying direct sitemap.xml");
            sitemaps = vec![sitemap::sitemap_index_url(site_root)];
        }

        let mut candidates = Vec::new();
        for sitemap_url in &sitemaps {
            candidates.extend(sitemap::product_urls_from_sitemap(&self.client, sitemap_url).await);
        }

        let urls = dedup_urls(candidates);
        let total = urls.len();
        tracing::info!(total, "unique product URLs found");

        let sink = ProductSink::new();
        let mut completed = 0usize;

        // Every worker appends into the shared sink itself; the completion
        // loop below only counts, logs, and paces.
        let mut outcomes = stream::iter(urls)
            .map(|url| {
                let sink = sink.clone();
                async move {
                    let record = self.process_url(&url).await;
                    let succeeded = record.is_some();
                    if let Some(record) = record {
                        sink.push(record);
                    }
                    (url, succeeded)
                }
            })
            .buffer_unordered(self.max_workers);

        while let Some((url, succeeded)) = outcomes.next().await {
            completed += 1;
            if succeeded {
                tracing::info!(completed, total, url = %url, "product extracted");
            } else {
                tracing::info!(completed, total, url = %url, "product page skipped");
            }

            // Politeness throttle: a small fixed pause after each completed
            // unit of work to limit request rate against the site.
            if !self.completion_delay.is_zero() {
                tokio::time::sleep(self.completion_delay).await;
            }
        }

        drop(outcomes);
        let records = sink.into_records();
        tracing::info!(count = records.len(), "crawl finished");
        records
    }

    /// Runs one URL through fetch → extract. Any stage failure logs a
    /// warning and ends processing for this URL only.
    async fn process_url(&self, url: &str) -> Option<ProductRecord> {
        tracing::debug!(url, stage = "fetch", "fetching product page");
        let body = match self.client.fetch_page(url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url, stage = "fetch", error = %e, "fetch failed; skipping URL");
                return None;
            }
        };

        tracing::debug!(url, stage = "extract", "extracting product data");
        self.pipeline.extract(url, &body).await
    }
}

/// Deduplicates candidate URLs by exact string equality, keeping first-seen
/// order. Downstream has no ordering guarantee either way.
fn dedup_urls(candidates: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
