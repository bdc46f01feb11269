//! Deterministic page-structure scans.
//!
//! These scans back both the fixup stage (patching holes in a semantic
//! extraction) and the structural fallback extractor (building a record
//! from scratch when the semantic backend produced nothing usable).
//!
//! Tie-break policy: every selector list is in fixed priority order and the
//! first selector that yields a value wins; later selectors are never
//! consulted for a field that is already populated.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

/// Asset host that product images must reference to be collected.
const IMAGE_CDN_HOST: &str = "cdn.shopify.com";

/// Product name selectors, highest priority first.
const NAME_SELECTORS: &[&str] = &[
    "h1.product-single__title",
    ".product__title h1",
    "h1[data-product-title]",
    "h1",
];

/// Price display selectors, highest priority first.
const PRICE_SELECTORS: &[&str] = &[
    ".price__regular .price-item--regular",
    ".product__price .price-item--regular",
    "[data-price]",
    ".price",
];

/// Image container selectors, highest priority first. The first selector
/// that yields at least one CDN image wins for the whole list.
const IMAGE_SELECTORS: &[&str] = &[
    ".product__media img",
    ".product-single__photo img",
    ".product__image img",
    "img[data-src]",
    r#"img[src*="cdn.shopify.com"]"#,
];

/// Description container selectors, highest priority first.
const DESCRIPTION_SELECTORS: &[&str] = &[
    ".product__description",
    ".product-single__description",
    "[data-product-description]",
    ".rte",
];

/// Everything the deterministic scans can recover from one product page.
///
/// Computed in a single pass so callers never hold the parsed DOM across an
/// await point (the DOM type is not `Send`).
#[derive(Debug, Clone, Default)]
pub struct StructuralScan {
    pub product_id: Option<String>,
    pub price_cents: Option<u64>,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub name: Option<String>,
}

impl StructuralScan {
    /// Runs every scan family against one page body.
    #[must_use]
    pub fn of(html: &str) -> Self {
        let doc = Html::parse_document(html);
        Self {
            product_id: scan_product_id(&doc),
            price_cents: scan_price_cents(&doc),
            images: scan_images(&doc),
            description: scan_description(&doc),
            name: scan_name(&doc),
        }
    }
}

/// Mines variants out of page structure.
///
/// Structural variant extraction (select/option markup, data attributes,
/// embedded structured data) is not implemented; every caller receives an
/// empty list and products keep whatever variants the semantic extractor
/// found.
#[must_use]
pub fn mine_variants(_html: &str) -> Vec<crate::types::RawVariant> {
    Vec::new()
}

/// Parses a selector that is known at compile time.
fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Product id from `data-product-id` attributes, falling back to JSON-LD
/// `Product` blocks.
fn scan_product_id(doc: &Html) -> Option<String> {
    let by_attr = selector("[data-product-id]");
    if let Some(el) = doc.select(&by_attr).next() {
        if let Some(id) = el.value().attr("data-product-id") {
            if !id.trim().is_empty() {
                return Some(id.trim().to_owned());
            }
        }
    }

    let ld_scripts = selector(r#"script[type="application/ld+json"]"#);
    for script in doc.select(&ld_scripts) {
        let text: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        // Top-level object or array of objects; no @graph expansion needed
        // for storefront product pages.
        let candidates: Vec<&Value> = match &value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for item in candidates {
            if item.get("@type").and_then(Value::as_str) != Some("Product") {
                continue;
            }
            if let Some(id_url) = item.get("@id").and_then(Value::as_str) {
                if let Some(id) = id_url.rsplit('/').next().filter(|s| !s.is_empty()) {
                    return Some(id.to_owned());
                }
            }
        }
    }

    None
}

/// First price found by the price-selector list, as integer cents.
fn scan_price_cents(doc: &Html) -> Option<u64> {
    for css in PRICE_SELECTORS {
        let sel = selector(css);
        if let Some(el) = doc.select(&sel).next() {
            let text: String = el.text().collect();
            if let Some(cents) = parse_price_cents(&text) {
                return Some(cents);
            }
        }
    }
    None
}

/// CDN image URLs from the first image selector that yields any.
fn scan_images(doc: &Html) -> Vec<String> {
    for css in IMAGE_SELECTORS {
        let sel = selector(css);
        let mut images = Vec::new();
        for el in doc.select(&sel) {
            let src = el
                .value()
                .attr("src")
                .or_else(|| el.value().attr("data-src"));
            if let Some(src) = src {
                if src.contains(IMAGE_CDN_HOST) {
                    let normalized = normalize_cdn_url(src);
                    if !images.contains(&normalized) {
                        images.push(normalized);
                    }
                }
            }
        }
        if !images.is_empty() {
            return images;
        }
    }
    Vec::new()
}

/// Trimmed text of the first matching description container.
fn scan_description(doc: &Html) -> Option<String> {
    for css in DESCRIPTION_SELECTORS {
        let sel = selector(css);
        if let Some(el) = doc.select(&sel).next() {
            let text = collapse_whitespace(&el.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Trimmed text of the first matching name heading.
fn scan_name(doc: &Html) -> Option<String> {
    for css in NAME_SELECTORS {
        let sel = selector(css);
        if let Some(el) = doc.select(&sel).next() {
            let text = collapse_whitespace(&el.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Parses the first decimal-looking number out of price display text and
/// converts it to integer cents: `"$150.00"` → `15000`.
#[must_use]
pub fn parse_price_cents(text: &str) -> Option<u64> {
    let price_re = Regex::new(r"\$?(\d+\.?\d*)").expect("valid regex");
    let captures = price_re.captures(text)?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    Some((value * 100.0).round() as u64)
}

/// Normalizes a CDN image URL to absolute HTTPS.
///
/// Protocol-relative `//cdn...` becomes `https://cdn...`; a bare host path
/// gets an `https://` prefix; absolute URLs pass through unchanged.
#[must_use]
pub fn normalize_cdn_url(src: &str) -> String {
    if src.starts_with("http://") || src.starts_with("https://") {
        src.to_owned()
    } else if let Some(rest) = src.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        format!("https://{src}")
    }
}

/// Last-resort product identifier: the slug out of a `/products/<slug>` or
/// `/product/<slug>` URL path.
#[must_use]
pub fn slug_from_url(url: &str) -> Option<String> {
    let slug_re = Regex::new(r"/products?/([^/?#]+)").expect("valid regex");
    slug_re
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Collapses internal whitespace runs and trims, so multi-node DOM text
/// reads like the rendered page.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
