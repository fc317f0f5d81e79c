use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How a character budget is spread across ordered documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncationPolicy {
    /// Keep documents whole in corpus order; clip the first one that overflows
    /// and drop everything after it.
    #[default]
    Priority,
    /// Give every document an equal share, redistributing what short
    /// documents leave unused.
    Balanced,
}

impl std::fmt::Display for TruncationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TruncationPolicy::Priority => write!(f, "priority"),
            TruncationPolicy::Balanced => write!(f, "balanced"),
        }
    }
}

/// Per-source collection options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSettings {
    /// Upper bound on documents requested from the provider.
    pub max_results: usize,
    /// Per-connector time limit.
    pub timeout_secs: u64,
    /// Lower values come first in the merged corpus.
    pub priority: u8,
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub bind_addr: SocketAddr,
    pub brands_path: PathBuf,
    pub report_path: PathBuf,
    pub strict: bool,
    pub user_agent: String,
    pub max_concurrent_brands: usize,
    pub connector_workers: usize,
    pub collect_timeout_secs: u64,
    pub corpus_max_chars: usize,
    pub truncation_policy: TruncationPolicy,
    pub search: SourceSettings,
    pub video: SourceSettings,
    pub discussion: SourceSettings,
    pub google_api_key: Option<String>,
    pub google_cse_id: Option<String>,
    pub youtube_api_key: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: String,
    pub openai_api_key: Option<String>,
    pub model: String,
    pub model_base_url: String,
    pub model_max_input_tokens: usize,
    pub model_max_retries: u32,
    pub model_backoff_base_ms: u64,
    pub model_timeout_secs: u64,
    /// Bearer tokens accepted by the HTTP service.
    pub api_keys: Vec<String>,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("bind_addr", &self.bind_addr)
            .field("brands_path", &self.brands_path)
            .field("report_path", &self.report_path)
            .field("strict", &self.strict)
            .field("user_agent", &self.user_agent)
            .field("max_concurrent_brands", &self.max_concurrent_brands)
            .field("connector_workers", &self.connector_workers)
            .field("collect_timeout_secs", &self.collect_timeout_secs)
            .field("corpus_max_chars", &self.corpus_max_chars)
            .field("truncation_policy", &self.truncation_policy)
            .field("search", &self.search)
            .field("video", &self.video)
            .field("discussion", &self.discussion)
            .field("google_api_key", &redact(&self.google_api_key))
            .field("google_cse_id", &self.google_cse_id)
            .field("youtube_api_key", &redact(&self.youtube_api_key))
            .field("reddit_client_id", &redact(&self.reddit_client_id))
            .field("reddit_client_secret", &redact(&self.reddit_client_secret))
            .field("reddit_user_agent", &self.reddit_user_agent)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("model", &self.model)
            .field("model_base_url", &self.model_base_url)
            .field("model_max_input_tokens", &self.model_max_input_tokens)
            .field("model_max_retries", &self.model_max_retries)
            .field("model_backoff_base_ms", &self.model_backoff_base_ms)
            .field("model_timeout_secs", &self.model_timeout_secs)
            .field("api_keys", &format_args!("[{} redacted]", self.api_keys.len()))
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .finish()
    }
}
