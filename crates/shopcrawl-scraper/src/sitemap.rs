//! Sitemap resolution and product-URL extraction.
//!
//! Storefront sitemaps come in three namespace conventions: the standard
//! sitemap-protocol namespace, no namespace at all, and a legacy Google
//! namespace. Both parsers here try those forms in that fixed priority
//! order and stop at the first form that yields matching elements, so a
//! document that technically carries more than one form is never counted
//! twice.
//!
//! Every fetch or parse failure in this module is non-fatal: it is logged
//! and collapses to an empty list, and the orchestrator moves on.

use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::client::PageClient;
use crate::error::ScraperError;

const STANDARD_NS: &[u8] = b"http://www.sitemaps.org/schemas/sitemap/0.9";
const LEGACY_NS: &[u8] = b"http://www.google.com/schemas/sitemap/0.84";

/// URL-path markers that identify a product page, matched case-insensitively.
const PRODUCT_PATH_MARKERS: &[&str] = &["/products/", "/product/"];

/// Namespace form of a sitemap element, in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NsForm {
    Standard,
    None,
    Legacy,
    Other,
}

impl NsForm {
    fn of(resolution: &ResolveResult<'_>) -> Self {
        match resolution {
            ResolveResult::Unbound => Self::None,
            ResolveResult::Bound(ns) => {
                if ns.0 == STANDARD_NS {
                    Self::Standard
                } else if ns.0 == LEGACY_NS {
                    Self::Legacy
                } else {
                    Self::Other
                }
            }
            ResolveResult::Unknown(_) => Self::Other,
        }
    }
}

/// Builds the canonical sitemap-index location for a site root, normalizing
/// the trailing slash: `"https://shop.example"` → `"https://shop.example/sitemap.xml"`.
#[must_use]
pub fn sitemap_index_url(site_root: &str) -> String {
    format!("{}/sitemap.xml", site_root.trim_end_matches('/'))
}

/// Resolves the leaf sitemaps for a site by fetching `{root}/sitemap.xml`
/// and collecting `<sitemap><loc>` entries.
///
/// Returns an empty list on any fetch or parse failure. An empty result is
/// the orchestrator's signal to fall back to treating the root sitemap
/// itself as a leaf.
pub async fn resolve_sitemaps(client: &PageClient, site_root: &str) -> Vec<String> {
    let index_url = sitemap_index_url(site_root);
    tracing::info!(url = %index_url, "fetching sitemap index");

    let body = match client.fetch_page(&index_url).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(url = %index_url, error = %e, "failed to fetch sitemap index");
            return Vec::new();
        }
    };

    match collect_loc_entries(&body, b"sitemap") {
        Ok(sitemaps) => {
            tracing::info!(count = sitemaps.len(), "found leaf sitemaps");
            sitemaps
        }
        Err(e) => {
            tracing::warn!(url = %index_url, error = %e, "failed to parse sitemap index");
            Vec::new()
        }
    }
}

/// Fetches one leaf sitemap and returns the product-page URLs it lists.
///
/// Collects every `<url><loc>` entry and keeps those whose lowercase form
/// contains a product-path marker. Returns an empty list on any failure.
pub async fn product_urls_from_sitemap(client: &PageClient, sitemap_url: &str) -> Vec<String> {
    let body = match client.fetch_page(sitemap_url).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(url = %sitemap_url, error = %e, "failed to fetch sitemap");
            return Vec::new();
        }
    };

    let entries = match collect_loc_entries(&body, b"url") {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(url = %sitemap_url, error = %e, "failed to parse sitemap");
            return Vec::new();
        }
    };

    let product_urls: Vec<String> = entries
        .into_iter()
        .filter(|loc| {
            let lower = loc.to_lowercase();
            PRODUCT_PATH_MARKERS.iter().any(|m| lower.contains(m))
        })
        .collect();

    tracing::info!(url = %sitemap_url, count = product_urls.len(), "found product URLs in sitemap");
    product_urls
}

/// Collects the `<loc>` text of every `<{entry_tag}>` element, bucketed by
/// namespace form, then returns the bucket of the highest-priority form that
/// matched anything: standard namespace, then no namespace, then the legacy
/// namespace.
///
/// # Errors
///
/// Returns [`ScraperError::Xml`] when the document is not well-formed.
fn collect_loc_entries(xml: &str, entry_tag: &[u8]) -> Result<Vec<String>, ScraperError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut standard = Vec::new();
    let mut none = Vec::new();
    let mut legacy = Vec::new();

    // The entry element currently open, if any, and whether the reader is
    // inside its <loc> child. The loc must carry the same namespace form as
    // its parent entry to count.
    let mut current_entry: Option<NsForm> = None;
    let mut in_loc = false;
    let mut loc_text = String::new();

    loop {
        match reader.read_resolved_event()? {
            (resolution, Event::Start(e)) => {
                let form = NsForm::of(&resolution);
                if e.local_name().as_ref() == entry_tag {
                    current_entry = Some(form);
                } else if e.local_name().as_ref() == b"loc"
                    && current_entry.is_some_and(|entry_form| entry_form == form)
                {
                    in_loc = true;
                    loc_text.clear();
                }
            }
            (_, Event::End(e)) => {
                if e.local_name().as_ref() == entry_tag {
                    current_entry = None;
                } else if e.local_name().as_ref() == b"loc" && in_loc {
                    in_loc = false;
                    if !loc_text.is_empty() {
                        let bucket = match current_entry {
                            Some(NsForm::Standard) => &mut standard,
                            Some(NsForm::None) => &mut none,
                            Some(NsForm::Legacy) => &mut legacy,
                            _ => continue,
                        };
                        bucket.push(std::mem::take(&mut loc_text));
                    }
                }
            }
            (_, Event::Text(e)) => {
                if in_loc {
                    loc_text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            (_, Event::CData(e)) => {
                if in_loc {
                    loc_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    // First namespace form with matches wins.
    if !standard.is_empty() {
        Ok(standard)
    } else if !none.is_empty() {
        Ok(none)
    } else {
        Ok(legacy)
    }
}
