use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

fn assert_invalid(result: &Result<AppConfig, ConfigError>, expected: &str) {
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { var, .. }) if var == expected),
        "expected InvalidEnvVar({expected}), got: {result:?}"
    );
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "JUNGAI_ENV"));
}

#[test]
fn build_app_config_succeeds_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8008");
    assert_eq!(cfg.log_level, "info");
    assert!(!cfg.strict);
    assert_eq!(cfg.max_concurrent_brands, 2);
    assert_eq!(cfg.connector_workers, 3);
    assert_eq!(cfg.collect_timeout_secs, 90);
    assert_eq!(cfg.corpus_max_chars, 12_000);
    assert_eq!(cfg.truncation_policy, TruncationPolicy::Priority);
    assert_eq!(cfg.model, "gpt-4o-mini");
    assert_eq!(cfg.model_max_input_tokens, 3000);
    assert_eq!(cfg.model_max_retries, 3);
    assert!(cfg.openai_api_key.is_none());
    assert!(cfg.google_api_key.is_none());
}

#[test]
fn source_defaults_order_search_before_video_before_discussion() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.search.priority < cfg.video.priority);
    assert!(cfg.video.priority < cfg.discussion.priority);
    assert_eq!(cfg.discussion.max_results, 60);
}

#[test]
fn source_settings_override() {
    let mut map = HashMap::new();
    map.insert("JUNGAI_VIDEO_MAX_RESULTS", "4");
    map.insert("JUNGAI_VIDEO_TIMEOUT_SECS", "12");
    map.insert("JUNGAI_VIDEO_PRIORITY", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.video.max_results, 4);
    assert_eq!(cfg.video.timeout_secs, 12);
    assert_eq!(cfg.video.priority, 0);
}

#[test]
fn source_max_results_zero_is_rejected() {
    let mut map = HashMap::new();
    map.insert("JUNGAI_SEARCH_MAX_RESULTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert_invalid(&result, "JUNGAI_SEARCH_MAX_RESULTS");
}

#[test]
fn source_priority_out_of_range_is_rejected() {
    let mut map = HashMap::new();
    map.insert("JUNGAI_DISCUSSION_PRIORITY", "300");
    let result = build_app_config(lookup_from_map(&map));
    assert_invalid(&result, "JUNGAI_DISCUSSION_PRIORITY");
}

#[test]
fn strict_flag_accepts_common_spellings() {
    for raw in ["1", "true", "TRUE", "yes"] {
        let mut map = HashMap::new();
        map.insert("JUNGAI_STRICT", raw);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.strict, "expected strict for {raw}");
    }
}

#[test]
fn strict_flag_rejects_garbage() {
    let mut map = HashMap::new();
    map.insert("JUNGAI_STRICT", "sometimes");
    let result = build_app_config(lookup_from_map(&map));
    assert_invalid(&result, "JUNGAI_STRICT");
}

#[test]
fn truncation_policy_balanced() {
    let mut map = HashMap::new();
    map.insert("JUNGAI_TRUNCATION_POLICY", "Balanced");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.truncation_policy, TruncationPolicy::Balanced);
}

#[test]
fn truncation_policy_unknown_is_rejected() {
    let mut map = HashMap::new();
    map.insert("JUNGAI_TRUNCATION_POLICY", "relevance");
    let result = build_app_config(lookup_from_map(&map));
    assert_invalid(&result, "JUNGAI_TRUNCATION_POLICY");
}

#[test]
fn blank_credentials_are_treated_as_missing() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "   ");
    map.insert("YOUTUBE_API_KEY", "yt-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.openai_api_key.is_none());
    assert_eq!(cfg.youtube_api_key.as_deref(), Some("yt-key"));
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "sk-secret");
    map.insert("REDDIT_CLIENT_SECRET", "reddit-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("sk-secret"));
    assert!(!debug.contains("reddit-secret"));
    assert!(debug.contains("[redacted]"));
}

#[test]
fn invalid_bind_addr_is_rejected() {
    let mut map = HashMap::new();
    map.insert("JUNGAI_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert_invalid(&result, "JUNGAI_BIND_ADDR");
}

#[test]
fn zero_timeouts_are_rejected() {
    for var in [
        "JUNGAI_SEARCH_TIMEOUT_SECS",
        "JUNGAI_VIDEO_TIMEOUT_SECS",
        "JUNGAI_DISCUSSION_TIMEOUT_SECS",
        "JUNGAI_COLLECT_TIMEOUT_SECS",
        "JUNGAI_MODEL_TIMEOUT_SECS",
        "JUNGAI_RATE_LIMIT_WINDOW_SECS",
    ] {
        let mut map = HashMap::new();
        map.insert(var, "0");
        let result = build_app_config(lookup_from_map(&map));
        assert_invalid(&result, var);
    }
}

#[test]
fn api_keys_are_split_and_trimmed() {
    let mut map = HashMap::new();
    map.insert("JUNGAI_API_KEYS", " alpha , ,beta ");
    map.insert("JUNGAI_RATE_LIMIT_MAX_REQUESTS", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.api_keys, vec!["alpha".to_string(), "beta".to_string()]);
    assert_eq!(cfg.rate_limit_max_requests, 5);
    assert_eq!(cfg.rate_limit_window_secs, 60);
    assert!(!format!("{cfg:?}").contains("alpha"));
}

#[test]
fn api_keys_default_to_empty() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.api_keys.is_empty());
    assert_eq!(cfg.rate_limit_max_requests, 120);
}
