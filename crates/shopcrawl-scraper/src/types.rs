//! Intermediate extraction types.
//!
//! The semantic backend returns duck-typed JSON: ids arrive as numbers or
//! strings, prices as integers, floats, or numeric strings, arrays may be
//! missing entirely. [`RawProduct`] models that honestly — every field is
//! optional and is coerced field-by-field from a `serde_json::Value`. A raw
//! product is only trusted as a fully-typed [`ProductRecord`] once it has
//! been through fixup and [`RawProduct::into_record`] applied the
//! defaulting rules.

use std::collections::BTreeMap;

use serde_json::Value;

use shopcrawl_core::{Availability, ProductRecord, Review, VariantRecord};

/// Partially-populated product parsed from a semantic-backend reply or
/// assembled by the structural fallback.
#[derive(Debug, Clone, Default)]
pub struct RawProduct {
    pub id: Option<String>,
    pub gid: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub price_cents: Option<u64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub availability: Option<String>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub weight: Option<String>,
    pub dimensions: Option<String>,
    pub tax_info: Option<String>,
    pub reviews: Vec<Review>,
    pub variants: Vec<RawVariant>,
}

/// Partially-populated variant inside a [`RawProduct`].
#[derive(Debug, Clone, Default)]
pub struct RawVariant {
    pub id: Option<String>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price_cents: Option<u64>,
    pub availability: Option<String>,
    pub image: Option<String>,
    pub options: BTreeMap<String, String>,
}

impl RawProduct {
    /// Reads a raw product out of an untyped JSON object, coercing each
    /// field individually. Fields of the wrong shape are dropped, never
    /// propagated as errors.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self {
            id: value.get("id").and_then(as_string),
            gid: value.get("gid").and_then(as_string),
            vendor: value.get("vendor").and_then(as_string),
            product_type: value.get("type").and_then(as_string),
            price_cents: value.get("price").and_then(as_cents),
            name: value.get("name").and_then(as_string),
            description: value.get("description").and_then(as_string),
            availability: value.get("availability").and_then(as_string),
            tags: value.get("tags").map(as_string_vec).unwrap_or_default(),
            images: value.get("images").map(as_string_vec).unwrap_or_default(),
            weight: value.get("weight").and_then(as_string),
            dimensions: value.get("dimensions").and_then(as_string),
            tax_info: value.get("tax_info").and_then(as_string),
            reviews: value.get("reviews").map(as_reviews).unwrap_or_default(),
            variants: value.get("variants").map(as_variants).unwrap_or_default(),
        }
    }

    /// Seals this raw product into a [`ProductRecord`], applying the
    /// defaulting rules: `fallback_vendor` when no vendor resolved, price 0
    /// when unknown, availability text parsed with `InStock` as the default.
    #[must_use]
    pub fn into_record(self, url: &str, fallback_vendor: &str) -> ProductRecord {
        ProductRecord {
            id: self.id,
            gid: self.gid,
            vendor: self
                .vendor
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| fallback_vendor.to_owned()),
            product_type: self.product_type,
            price_cents: self.price_cents.unwrap_or(0),
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            availability: Availability::parse(self.availability.as_deref().unwrap_or("")),
            tags: self.tags,
            images: self.images,
            weight: self.weight,
            dimensions: self.dimensions,
            tax_info: self.tax_info,
            reviews: self.reviews,
            url: url.to_owned(),
            variants: self.variants.into_iter().map(RawVariant::into_record).collect(),
        }
    }
}

impl RawVariant {
    fn into_record(self) -> VariantRecord {
        VariantRecord {
            id: self.id,
            name: self.name.unwrap_or_default(),
            sku: self.sku,
            price_cents: self.price_cents.unwrap_or(0),
            availability: Availability::parse(self.availability.as_deref().unwrap_or("")),
            image: self.image,
            options: self.options,
        }
    }
}

/// String coercion: accepts strings and numbers; rejects everything else.
/// Empty and whitespace-only strings count as absent.
fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Cents coercion: accepts non-negative integers, floats (rounded), and
/// numeric strings. Negative or unparseable values count as absent.
fn as_cents(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<u64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
        }
        _ => None,
    }
}

fn as_string_vec(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(as_string).collect())
        .unwrap_or_default()
}

fn as_reviews(value: &Value) -> Vec<Review> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let text = item.get("text").and_then(as_string)?;
                    let rating = item.get("rating").and_then(Value::as_f64);
                    Some(Review { rating, text })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn as_variants(value: &Value) -> Vec<RawVariant> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(as_variant).collect())
        .unwrap_or_default()
}

fn as_variant(value: &Value) -> Option<RawVariant> {
    let obj = value.as_object()?;
    let options = obj
        .get("options")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| as_string(v).map(|v| (k.clone(), v)))
                .collect()
        })
        .unwrap_or_default();

    Some(RawVariant {
        id: obj.get("id").and_then(as_string),
        name: obj.get("name").and_then(as_string),
        sku: obj.get("sku").and_then(as_string),
        price_cents: obj.get("price").and_then(as_cents),
        availability: obj.get("availability").and_then(as_string),
        image: obj.get("image").and_then(as_string),
        options,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_value_reads_full_shape() {
        let value = json!({
            "id": 6789012345678_i64,
            "gid": "gid://shopify/Product/6789012345678",
            "vendor": "Acme Outdoors",
            "type": "Jackets",
            "price": 15000,
            "name": "Trail Jacket",
            "description": "A jacket for trails.",
            "availability": "in stock",
            "tags": ["outdoor", "jacket"],
            "images": ["https://cdn.shopify.com/jacket.jpg"],
            "weight": "450g",
            "dimensions": null,
            "tax_info": null,
            "reviews": [{"rating": 4.5, "text": "Great jacket"}],
            "variants": [{
                "id": "101",
                "name": "L / Black",
                "sku": "TJ-L-BLK",
                "price": 15000,
                "availability": "in stock",
                "image": null,
                "options": {"size": "L", "color": "Black"}
            }]
        });

        let raw = RawProduct::from_value(&value);
        assert_eq!(raw.id.as_deref(), Some("6789012345678"));
        assert_eq!(raw.price_cents, Some(15000));
        assert_eq!(raw.tags, vec!["outdoor", "jacket"]);
        assert_eq!(raw.reviews.len(), 1);
        assert_eq!(raw.reviews[0].rating, Some(4.5));
        assert_eq!(raw.variants.len(), 1);
        assert_eq!(
            raw.variants[0].options.get("size").map(String::as_str),
            Some("L")
        );
    }

    #[test]
    fn from_value_tolerates_nulls_and_wrong_shapes() {
        let value = json!({
            "id": null,
            "price": "not a price",
            "tags": "not-an-array",
            "images": [42, "https://cdn.shopify.com/a.jpg"],
            "variants": "none"
        });

        let raw = RawProduct::from_value(&value);
        assert!(raw.id.is_none());
        assert!(raw.price_cents.is_none());
        assert!(raw.tags.is_empty());
        // Numbers inside an image array coerce to strings; harmless here.
        assert_eq!(raw.images.len(), 2);
        assert!(raw.variants.is_empty());
    }

    #[test]
    fn cents_coercion_accepts_numbers_and_numeric_strings() {
        assert_eq!(as_cents(&json!(15000)), Some(15000));
        assert_eq!(as_cents(&json!(15000.4)), Some(15000));
        assert_eq!(as_cents(&json!("15000")), Some(15000));
        assert_eq!(as_cents(&json!(-5)), None);
        assert_eq!(as_cents(&json!("free")), None);
        assert_eq!(as_cents(&json!(null)), None);
    }

    #[test]
    fn into_record_applies_defaults() {
        let record = RawProduct::default()
            .into_record("https://shop.example/products/x", "Acme Outdoors");
        assert_eq!(record.vendor, "Acme Outdoors");
        assert_eq!(record.price_cents, 0);
        assert_eq!(record.availability, Availability::InStock);
        assert_eq!(record.url, "https://shop.example/products/x");
        assert!(record.name.is_empty());
        assert!(record.variants.is_empty());
    }

    #[test]
    fn into_record_keeps_resolved_vendor() {
        let raw = RawProduct {
            vendor: Some("North Ridge".to_string()),
            availability: Some("out of stock".to_string()),
            ..RawProduct::default()
        };
        let record = raw.into_record("https://shop.example/products/x", "Acme Outdoors");
        assert_eq!(record.vendor, "North Ridge");
        assert_eq!(record.availability, Availability::OutOfStock);
    }

    #[test]
    fn into_record_blank_vendor_falls_back() {
        let raw = RawProduct {
            vendor: Some("   ".to_string()),
            ..RawProduct::default()
        };
        let record = raw.into_record("https://shop.example/products/x", "Acme Outdoors");
        assert_eq!(record.vendor, "Acme Outdoors");
    }
}
