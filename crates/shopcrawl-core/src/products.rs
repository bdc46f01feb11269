//! Domain types for scraped products.
//!
//! A [`ProductRecord`] is built once per successfully processed product page
//! (by the semantic extractor or the structural fallback), patched by the
//! fixup stage, and never mutated after it reaches the shared result
//! collection. Variants are exclusively owned by their product.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Stock status of a product or variant.
///
/// Unrecognized or empty availability text always maps to `InStock` — the
/// optimistic default matches what storefronts omit most often.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Availability {
    #[default]
    InStock,
    OutOfStock,
    PreOrder,
}

impl Availability {
    /// Parses free-form availability text into a variant. Total: every input
    /// maps to exactly one variant.
    ///
    /// Matching is case-insensitive on substrings. Out-of-stock patterns are
    /// checked first so `"unavailable"` cannot match the `"available"`
    /// in-stock pattern. The serialized schema.org URI forms are recognized
    /// too, which keeps availability mapping idempotent.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return Self::InStock;
        }
        if ["out of stock", "unavailable", "outofstock", "sold out"]
            .iter()
            .any(|p| lower.contains(p))
        {
            return Self::OutOfStock;
        }
        if ["pre-order", "preorder", "pre order"]
            .iter()
            .any(|p| lower.contains(p))
        {
            return Self::PreOrder;
        }
        // "in stock" / "available" / serialized "InStock" all land here; so
        // does anything unrecognized.
        Self::InStock
    }

    /// The schema.org URI literal used by the external output schema.
    #[must_use]
    pub fn schema_org_uri(self) -> &'static str {
        match self {
            Self::InStock => "https://schema.org/InStock",
            Self::OutOfStock => "https://schema.org/OutOfStock",
            Self::PreOrder => "https://schema.org/PreOrder",
        }
    }
}

/// A customer review attached to a product, when the page exposes any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub rating: Option<f64>,
    pub text: String,
}

/// A product scraped from one storefront page, with all defaulting rules
/// already applied: `vendor` and `url` are always set, `price_cents` is `0`
/// when the page price was absent or unparseable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Numeric storefront product ID, stored as a string to avoid precision
    /// loss. `None` when no ID could be recovered from any source.
    pub id: Option<String>,
    /// Global ID, e.g. `"gid://shopify/Product/6789012345678"`.
    pub gid: Option<String>,
    /// Brand or manufacturer; the configured fallback vendor when the page
    /// did not resolve one.
    pub vendor: String,
    /// Product category/type string, when present.
    pub product_type: Option<String>,
    /// Price in minor currency units (cents). `0` when unknown.
    pub price_cents: u64,
    pub name: String,
    pub description: String,
    pub availability: Availability,
    pub tags: Vec<String>,
    /// Product image URLs in page order, absolute HTTPS.
    pub images: Vec<String>,
    pub weight: Option<String>,
    pub dimensions: Option<String>,
    pub tax_info: Option<String>,
    pub reviews: Vec<Review>,
    /// Canonical page URL this record was scraped from. Always set.
    pub url: String,
    pub variants: Vec<VariantRecord>,
}

impl ProductRecord {
    /// Returns the total number of variants for this product.
    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    /// Returns `true` if the product or any of its variants is in stock.
    #[must_use]
    pub fn is_purchasable(&self) -> bool {
        self.availability == Availability::InStock
            || self
                .variants
                .iter()
                .any(|v| v.availability == Availability::InStock)
    }
}

/// A single purchasable variant of a [`ProductRecord`], e.g. one size/color
/// combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantRecord {
    /// Storefront variant ID, stored as a string.
    pub id: Option<String>,
    /// Display name, e.g. `"L / Black"`.
    pub name: String,
    pub sku: Option<String>,
    /// Price in minor currency units (cents). `0` when unknown.
    pub price_cents: u64,
    pub availability: Availability,
    /// Variant-specific image URL, when the page exposes one.
    pub image: Option<String>,
    /// Option name → value pairs, e.g. `{"size": "L", "color": "Black"}`.
    /// Ordered map so serialization is deterministic.
    pub options: BTreeMap<String, String>,
}
