use crate::app_config::{AppConfig, Environment, SourceSettings, TruncationPolicy};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Credentials are optional here; the components that need them decide whether
/// a missing key disables a source or fails the command.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for values that fail to parse.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u8 = |var: &str, default: &str| -> Result<u8, ConfigError> {
        or_default(var, default)
            .parse::<u8>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = parse_usize(var, default)?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let parse_secs = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = parse_u64(var, default)?;
        if value == 0 {
            return Err(invalid(var, "must be at least one second".to_string()));
        }
        Ok(value)
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_flag(&or_default(var, default))
            .ok_or_else(|| invalid(var, "expected true/false".to_string()))
    };

    let source = |prefix: &str,
                  max_results: &str,
                  timeout_secs: &str,
                  priority: &str|
     -> Result<SourceSettings, ConfigError> {
        Ok(SourceSettings {
            max_results: parse_positive(&format!("JUNGAI_{prefix}_MAX_RESULTS"), max_results)?,
            timeout_secs: parse_secs(&format!("JUNGAI_{prefix}_TIMEOUT_SECS"), timeout_secs)?,
            priority: parse_u8(&format!("JUNGAI_{prefix}_PRIORITY"), priority)?,
        })
    };

    let env = parse_environment(&or_default("JUNGAI_ENV", "development"))?;
    let log_level = or_default("JUNGAI_LOG_LEVEL", "info");
    let bind_addr = parse_addr("JUNGAI_BIND_ADDR", "0.0.0.0:8008")?;
    let brands_path = PathBuf::from(or_default("JUNGAI_BRANDS_PATH", "./config/brands.yaml"));
    let report_path = PathBuf::from(or_default(
        "JUNGAI_REPORT_PATH",
        "./reports/archetypes.jsonl",
    ));
    let strict = parse_bool("JUNGAI_STRICT", "false")?;
    let user_agent = or_default("JUNGAI_USER_AGENT", "jungai-collector/0.1");

    let max_concurrent_brands = parse_positive("JUNGAI_MAX_CONCURRENT_BRANDS", "2")?;
    let connector_workers = parse_positive("JUNGAI_CONNECTOR_WORKERS", "3")?;
    let collect_timeout_secs = parse_secs("JUNGAI_COLLECT_TIMEOUT_SECS", "90")?;
    let corpus_max_chars = parse_positive("JUNGAI_CORPUS_MAX_CHARS", "12000")?;
    let truncation_policy = parse_truncation_policy(&or_default(
        "JUNGAI_TRUNCATION_POLICY",
        "priority",
    ))?;

    let search = source("SEARCH", "10", "45", "1")?;
    let video = source("VIDEO", "10", "45", "2")?;
    let discussion = source("DISCUSSION", "60", "30", "3")?;

    let model_max_input_tokens = parse_positive("JUNGAI_MODEL_MAX_INPUT_TOKENS", "3000")?;
    let model_max_retries = parse_u32("JUNGAI_MODEL_MAX_RETRIES", "3")?;
    let model_backoff_base_ms = parse_u64("JUNGAI_MODEL_BACKOFF_BASE_MS", "1000")?;
    let model_timeout_secs = parse_secs("JUNGAI_MODEL_TIMEOUT_SECS", "60")?;

    let api_keys: Vec<String> = or_default("JUNGAI_API_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    let rate_limit_max_requests = parse_positive("JUNGAI_RATE_LIMIT_MAX_REQUESTS", "120")?;
    let rate_limit_window_secs = parse_secs("JUNGAI_RATE_LIMIT_WINDOW_SECS", "60")?;

    Ok(AppConfig {
        env,
        log_level,
        bind_addr,
        brands_path,
        report_path,
        strict,
        user_agent,
        max_concurrent_brands,
        connector_workers,
        collect_timeout_secs,
        corpus_max_chars,
        truncation_policy,
        search,
        video,
        discussion,
        google_api_key: optional("GOOGLE_API_KEY"),
        google_cse_id: optional("GOOGLE_CSE_ID"),
        youtube_api_key: optional("YOUTUBE_API_KEY"),
        reddit_client_id: optional("REDDIT_CLIENT_ID"),
        reddit_client_secret: optional("REDDIT_CLIENT_SECRET"),
        reddit_user_agent: or_default("REDDIT_USER_AGENT", "jungai-collector/0.1"),
        openai_api_key: optional("OPENAI_API_KEY"),
        model: or_default("JUNGAI_MODEL", "gpt-4o-mini"),
        model_base_url: or_default("JUNGAI_MODEL_BASE_URL", "https://api.openai.com"),
        model_max_input_tokens,
        model_max_retries,
        model_backoff_base_ms,
        model_timeout_secs,
        api_keys,
        rate_limit_max_requests,
        rate_limit_window_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "JUNGAI_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_truncation_policy(s: &str) -> Result<TruncationPolicy, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "priority" | "head" => Ok(TruncationPolicy::Priority),
        "balanced" => Ok(TruncationPolicy::Balanced),
        other => Err(ConfigError::InvalidEnvVar {
            var: "JUNGAI_TRUNCATION_POLICY".to_string(),
            reason: format!("unknown policy '{other}'; expected priority or balanced"),
        }),
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
