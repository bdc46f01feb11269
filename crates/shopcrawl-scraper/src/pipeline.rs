//! Two-tier extraction pipeline.
//!
//! Primary path: the semantic backend produces a [`RawProduct`], the fixup
//! stage patches fields the backend missed using deterministic page scans,
//! and the result is sealed into a [`ProductRecord`]. When the primary path
//! fails (backend error, unusable reply), the structural fallback builds a
//! record purely from page structure. When the fallback fails too, the URL
//! yields no record and the caller moves on.

use std::sync::Arc;

use shopcrawl_core::ProductRecord;

use crate::error::ScraperError;
use crate::semantic::SemanticExtractor;
use crate::structural::{mine_variants, slug_from_url, StructuralScan};
use crate::types::RawProduct;

pub struct ExtractionPipeline {
    semantic: Arc<dyn SemanticExtractor>,
    fallback_vendor: String,
}

impl ExtractionPipeline {
    pub fn new(semantic: Arc<dyn SemanticExtractor>, fallback_vendor: impl Into<String>) -> Self {
        Self {
            semantic,
            fallback_vendor: fallback_vendor.into(),
        }
    }

    /// Extracts one product record from a fetched page body.
    ///
    /// Returns `None` when both tiers fail; the failures are logged here so
    /// the orchestrator only has to count.
    pub async fn extract(&self, url: &str, body: &str) -> Option<ProductRecord> {
        match self.semantic.extract_product(body, url).await {
            Ok(mut raw) => {
                apply_fixups(&mut raw, body);
                Some(raw.into_record(url, &self.fallback_vendor))
            }
            Err(e) => {
                tracing::warn!(
                    url,
                    stage = "extract",
                    error = %e,
                    "primary extraction unusable; running structural fallback"
                );
                match self.fallback_extract(url, body) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!(
                            url,
                            stage = "extract",
                            error = %e,
                            "structural fallback failed; skipping URL"
                        );
                        None
                    }
                }
            }
        }
    }

    /// Builds a record purely from deterministic page-structure scans, with
    /// the product slug out of the URL as the last-resort identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Scan`] when the page body is empty — there is
    /// nothing to scan.
    fn fallback_extract(&self, url: &str, body: &str) -> Result<ProductRecord, ScraperError> {
        if body.trim().is_empty() {
            return Err(ScraperError::Scan {
                url: url.to_owned(),
                reason: "empty page body".to_owned(),
            });
        }

        let scan = StructuralScan::of(body);
        let id = scan.product_id.or_else(|| slug_from_url(url));
        let gid = id.as_deref().map(product_gid);

        let raw = RawProduct {
            id,
            gid,
            name: scan.name,
            price_cents: scan.price_cents,
            description: scan.description,
            images: scan.images,
            variants: mine_variants(body),
            ..RawProduct::default()
        };

        Ok(raw.into_record(url, &self.fallback_vendor))
    }
}

/// Patches fields that are missing or clearly invalid in a primary
/// extraction, using one deterministic scan of the original markup. Fields
/// the backend already populated are left alone.
fn apply_fixups(raw: &mut RawProduct, body: &str) {
    let scan = StructuralScan::of(body);

    if raw.id.is_none() {
        if let Some(id) = scan.product_id {
            raw.gid = Some(product_gid(&id));
            raw.id = Some(id);
        }
    }

    if raw.price_cents.is_none() || raw.price_cents == Some(0) {
        if let Some(cents) = scan.price_cents {
            raw.price_cents = Some(cents);
        }
    }

    if raw.images.is_empty() {
        raw.images = scan.images;
    }

    if raw.description.as_deref().is_none_or(|d| d.trim().is_empty()) {
        raw.description = scan.description;
    }

    if raw.variants.is_empty() {
        raw.variants = mine_variants(body);
    }
}

/// Derives the global id for a product identifier.
fn product_gid(id: &str) -> String {
    format!("gid://shopify/Product/{id}")
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
