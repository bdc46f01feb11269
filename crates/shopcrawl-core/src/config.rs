use crate::app_config::AppConfig;
use crate::ConfigError;

/// Default browser-profile user agent. Sent instead of a crawler identity so
/// storefront bot protection does not reject the fetch outright.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the actual environment so it
/// can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let openai_api_key = require("OPENAI_API_KEY")?;

    let log_level = or_default("SHOPCRAWL_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("SHOPCRAWL_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("SHOPCRAWL_USER_AGENT", DEFAULT_USER_AGENT);
    let max_workers = parse_usize("SHOPCRAWL_MAX_WORKERS", "8")?;
    let completion_delay_ms = parse_u64("SHOPCRAWL_COMPLETION_DELAY_MS", "200")?;
    let fallback_vendor = or_default("SHOPCRAWL_FALLBACK_VENDOR", "Unknown");
    let openai_model = or_default("SHOPCRAWL_OPENAI_MODEL", "gpt-3.5-turbo");
    let openai_base_url = or_default("SHOPCRAWL_OPENAI_BASE_URL", "https://api.openai.com/v1");

    Ok(AppConfig {
        log_level,
        request_timeout_secs,
        user_agent,
        max_workers,
        completion_delay_ms,
        fallback_vendor,
        openai_api_key,
        openai_model,
        openai_base_url,
    })
}
