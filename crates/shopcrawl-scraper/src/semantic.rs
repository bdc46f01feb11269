//! Semantic product extraction behind an LLM backend.
//!
//! The backend is consumed through the [`SemanticExtractor`] trait so the
//! pipeline and its tests never depend on a live service. The production
//! implementation speaks the OpenAI `chat/completions` REST shape with
//! deterministic settings (temperature pinned to zero, bounded output) and
//! parses the first JSON object substring out of whatever the model says.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use shopcrawl_core::AppConfig;

use crate::error::ScraperError;
use crate::types::RawProduct;

/// Page text sent to the backend is bounded to this many characters to
/// respect backend context limits.
pub const MAX_PAGE_CHARS: usize = 12_000;

const MAX_COMPLETION_TOKENS: u32 = 2000;

const SYSTEM_PROMPT: &str = "You are a data extraction expert. Extract comprehensive product \
information and return only valid JSON. Pay special attention to finding ALL product variants, \
their sizes, colors, prices, and IDs. Look for variant data in select elements, data attributes, \
JSON-LD, and JavaScript variables.";

/// Extracts one product record from raw page content.
#[async_trait]
pub trait SemanticExtractor: Send + Sync {
    /// Extracts a [`RawProduct`] from one page body.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Extraction`] — backend error or no JSON object in
    ///   the reply.
    /// - [`ScraperError::Json`] — the reply contained a JSON-looking
    ///   substring that does not parse.
    async fn extract_product(&self, page_text: &str, url: &str)
        -> Result<RawProduct, ScraperError>;
}

/// OpenAI-backed [`SemanticExtractor`].
pub struct OpenAiExtractor {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiExtractor {
    /// Creates an extractor from the application config.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn user_prompt(page_text: &str) -> String {
        let bounded = truncate_chars(page_text, MAX_PAGE_CHARS);
        format!(
            r#"Extract comprehensive product information from this product page HTML. Return ONLY a JSON object with these exact fields:
- id: Numeric product ID (internal storefront ID)
- gid: Global ID (gid://shopify/Product/...)
- vendor: Brand or manufacturer
- type: Product category/type
- price: Price in cents (e.g., 15000 = $150.00)
- name: Full product name with variant description
- description: Full product description text
- availability: Availability status (in stock, out of stock, pre-order, etc.)
- tags: Array of product tags/categories
- images: Array of image URLs (main product images)
- weight: Product weight if available
- dimensions: Product dimensions if available
- tax_info: Tax/VAT information if available
- reviews: Array of review objects with rating and text if available
- variants: Array of variant objects, each with:
    - id: Variant ID (look for data-variant-id, variant_id, or similar attributes)
    - name: Variant name (e.g., "L / Black", "Medium / Blue", etc.)
    - sku: Stock Keeping Unit
    - price: Price in cents
    - availability: Availability status
    - image: Image URL for the variant if available
    - options: Object with size, color, etc. (e.g., {{"size": "L", "color": "Black"}})

IMPORTANT: Look carefully for variant information in:
- <select> elements with size/color options
- data attributes like data-variant-id, data-option-value
- JSON-LD structured data
- JavaScript variables containing variant data
- Form elements with variant selections

If any field is not found, use null. For arrays, use empty array if none found.
Return ONLY the JSON object, no other text.

HTML Content:
{bounded}"#
        )
    }
}

#[async_trait]
impl SemanticExtractor for OpenAiExtractor {
    async fn extract_product(
        &self,
        page_text: &str,
        url: &str,
    ) -> Result<RawProduct, ScraperError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Self::user_prompt(page_text),
                },
            ],
            max_tokens: MAX_COMPLETION_TOKENS,
            // Pinned to zero for reproducibility across runs.
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScraperError::Extraction {
                url: url.to_owned(),
                reason: format!("backend returned HTTP {status}: {body}"),
            });
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ScraperError::Extraction {
                url: url.to_owned(),
                reason: "backend reply contained no choices".to_owned(),
            })?;

        let object_text =
            find_json_object(&content).ok_or_else(|| ScraperError::Extraction {
                url: url.to_owned(),
                reason: "no JSON object in backend reply".to_owned(),
            })?;

        let value: serde_json::Value =
            serde_json::from_str(object_text).map_err(|source| ScraperError::Json {
                context: format!("semantic reply for {url}"),
                source,
            })?;

        Ok(RawProduct::from_value(&value))
    }
}

/// Returns the substring from the first `{` to the last `}`, the widest
/// candidate for a JSON object embedded in prose.
#[must_use]
pub fn find_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Truncates to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_config(base_url: &str) -> AppConfig {
        AppConfig {
            log_level: "info".to_string(),
            request_timeout_secs: 5,
            user_agent: "shopcrawl-test/0.1".to_string(),
            max_workers: 2,
            completion_delay_ms: 0,
            fallback_vendor: "Acme Outdoors".to_string(),
            openai_api_key: "sk-test".to_string(),
            openai_model: "gpt-3.5-turbo".to_string(),
            openai_base_url: base_url.to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // find_json_object
    // -----------------------------------------------------------------------

    #[test]
    fn json_object_extracted_from_prose() {
        let reply = "Here is the product:\n{\"name\": \"Trail Jacket\"}\nDone.";
        assert_eq!(find_json_object(reply), Some("{\"name\": \"Trail Jacket\"}"));
    }

    #[test]
    fn json_object_spans_first_open_to_last_close() {
        let reply = r#"{"a": {"b": 1}}"#;
        assert_eq!(find_json_object(reply), Some(r#"{"a": {"b": 1}}"#));
    }

    #[test]
    fn no_object_in_plain_text() {
        assert!(find_json_object("sorry, I cannot help with that").is_none());
    }

    #[test]
    fn close_before_open_is_rejected() {
        assert!(find_json_object("} nope {").is_none());
    }

    // -----------------------------------------------------------------------
    // truncate_chars
    // -----------------------------------------------------------------------

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "héllo wörld".repeat(2000);
        let bounded = truncate_chars(&text, MAX_PAGE_CHARS);
        assert_eq!(bounded.chars().count(), MAX_PAGE_CHARS);
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("short", MAX_PAGE_CHARS), "short");
    }

    // -----------------------------------------------------------------------
    // OpenAiExtractor
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn extractor_sends_deterministic_request_and_parses_reply() {
        let server = MockServer::start().await;

        let reply = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "{\"name\": \"Trail Jacket\", \"price\": 15000, \"vendor\": \"Acme Outdoors\"}"
                }
            }]
        });

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(
                json!({"model": "gpt-3.5-turbo", "temperature": 0.0, "max_tokens": 2000}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(&reply))
            .expect(1)
            .mount(&server)
            .await;

        let extractor =
            OpenAiExtractor::new(&test_config(&server.uri())).expect("failed to build extractor");
        let raw = extractor
            .extract_product("<html>page</html>", "https://shop.example/products/x")
            .await
            .expect("expected Ok");

        assert_eq!(raw.name.as_deref(), Some("Trail Jacket"));
        assert_eq!(raw.price_cents, Some(15000));
        assert_eq!(raw.vendor.as_deref(), Some("Acme Outdoors"));
    }

    #[tokio::test]
    async fn non_json_reply_is_an_extraction_error() {
        let server = MockServer::start().await;

        let reply = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "I could not find a product."}
            }]
        });

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&reply))
            .mount(&server)
            .await;

        let extractor =
            OpenAiExtractor::new(&test_config(&server.uri())).expect("failed to build extractor");
        let result = extractor
            .extract_product("<html>page</html>", "https://shop.example/products/x")
            .await;

        assert!(
            matches!(result, Err(ScraperError::Extraction { .. })),
            "expected Extraction error, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn backend_error_status_is_an_extraction_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
            .mount(&server)
            .await;

        let extractor =
            OpenAiExtractor::new(&test_config(&server.uri())).expect("failed to build extractor");
        let result = extractor
            .extract_product("<html>page</html>", "https://shop.example/products/x")
            .await;

        assert!(
            matches!(result, Err(ScraperError::Extraction { .. })),
            "expected Extraction error, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn malformed_embedded_json_is_a_json_error() {
        let server = MockServer::start().await;

        let reply = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "{\"name\": oops}"}
            }]
        });

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&reply))
            .mount(&server)
            .await;

        let extractor =
            OpenAiExtractor::new(&test_config(&server.uri())).expect("failed to build extractor");
        let result = extractor
            .extract_product("<html>page</html>", "https://shop.example/products/x")
            .await;

        assert!(
            matches!(result, Err(ScraperError::Json { .. })),
            "expected Json error, got: {result:?}"
        );
    }
}
