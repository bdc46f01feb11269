use thiserror::Error;

/// Failure taxonomy for the crawl-and-extract pipeline.
///
/// Every variant is non-fatal to a run: errors are isolated to the single
/// sitemap or product URL being processed and surface as log warnings at the
/// orchestration layer.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("sitemap XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error for {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("semantic extraction failed for {url}: {reason}")]
    Extraction { url: String, reason: String },

    #[error("structural scan failed for {url}: {reason}")]
    Scan { url: String, reason: String },
}
