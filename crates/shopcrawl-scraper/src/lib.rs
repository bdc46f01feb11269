//! Sitemap-driven product crawling and extraction.
//!
//! The pipeline: resolve a site's sitemap index into leaf sitemaps, extract
//! candidate product URLs, fetch each page through a bounded worker pool,
//! run the two-tier extraction (semantic backend with deterministic
//! structural fallback), and normalize the aggregated records into the
//! external catalog schema.

pub mod client;
pub mod crawl;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod semantic;
pub mod sitemap;
pub mod structural;
pub mod types;

pub use client::PageClient;
pub use crawl::{Crawler, ProductSink};
pub use error::ScraperError;
pub use normalize::{normalize_catalog, Catalog};
pub use pipeline::ExtractionPipeline;
pub use semantic::{OpenAiExtractor, SemanticExtractor};
pub use types::{RawProduct, RawVariant};
