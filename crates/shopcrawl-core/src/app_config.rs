/// Runtime configuration for a crawl, loaded from the environment by
/// [`crate::load_app_config`].
#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Per-request timeout for page and sitemap fetches.
    pub request_timeout_secs: u64,
    /// Browser-profile `User-Agent` sent with every request. Storefronts
    /// block obvious bot agents far more aggressively than browser strings.
    pub user_agent: String,
    /// Width of the fetch/extract worker pool.
    pub max_workers: usize,
    /// Politeness delay applied after each completed unit of work.
    pub completion_delay_ms: u64,
    /// Vendor string used when a page does not resolve one.
    pub fallback_vendor: String,
    /// API key for the semantic-extraction backend.
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_workers", &self.max_workers)
            .field("completion_delay_ms", &self.completion_delay_ms)
            .field("fallback_vendor", &self.fallback_vendor)
            .field("openai_api_key", &"[redacted]")
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .finish()
    }
}
