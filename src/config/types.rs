use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Desktop browser user agent sent with every extraction request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Most common body container across hosts without a mapped rule
pub const DEFAULT_SELECTOR: &str = "#article-view-content-div";

/// Main configuration structure for Corpus-Sieve
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// HTTP fetch behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetchConfig {
    /// User-Agent header value
    pub user_agent: String,

    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,

    /// Base of the retry backoff; retry `i` waits `base * 2^(i-1)`
    pub retry_base_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: 5_000,
            retry_base_delay_ms: 1_000,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Content extraction behavior and rule map locations
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtractConfig {
    /// Extracted text shorter than this (in characters) counts as a miss
    pub min_text_length: usize,

    /// Rule used for hosts with no mapped rule
    pub default_selector: String,

    /// Additional full passes over `request_error` records
    pub batch_retry_passes: u32,

    /// Fixed sleep before each retry pass (milliseconds)
    pub batch_retry_interval_ms: u64,

    /// Sleep between the first pass and the retry passes (milliseconds)
    pub batch_retry_cooldown_ms: u64,

    /// JSON map host -> [rule, ...]
    pub selectors_path: PathBuf,

    /// JSON map host -> [[pattern, ...], prefix, suffix]
    pub redirections_path: PathBuf,

    /// JSON map host -> attribute name
    pub attributes_path: PathBuf,

    /// Cookie header sent with forum requests
    pub cookie: Option<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_text_length: 300,
            default_selector: DEFAULT_SELECTOR.to_string(),
            batch_retry_passes: 3,
            batch_retry_interval_ms: 1_000,
            batch_retry_cooldown_ms: 5_000,
            selectors_path: PathBuf::from("materials/news_maintext_selectors.json"),
            redirections_path: PathBuf::from("materials/news_maintext_redirections.json"),
            attributes_path: PathBuf::from("materials/news_maintext_attributes.json"),
            cookie: None,
        }
    }
}

/// Deduplication behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DedupConfig {
    /// Pairs strictly above this similarity are duplicates
    pub threshold: f64,

    /// SQLite file holding cached similarity matrices
    pub cache_path: PathBuf,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            cache_path: PathBuf::from("results/similarity_cache.db"),
        }
    }
}

/// Relevance classifier behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClassifierConfig {
    /// Chat-completions endpoint
    pub endpoint: String,

    /// Model name sent with each request
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Optional organization header value
    pub organization: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Records classified concurrently per batch
    pub batch_size: usize,

    /// Combined text above this many characters bypasses the model
    pub max_text_length: usize,

    /// Exponent of the first retry delay (`2^exp` units)
    pub initial_backoff_exponent: u32,

    /// Length of one backoff unit (milliseconds)
    pub backoff_unit_ms: u64,

    /// Per-call timeout (milliseconds)
    pub timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            organization: None,
            temperature: 0.5,
            batch_size: 30,
            max_text_length: 10_000,
            initial_backoff_exponent: 6,
            backoff_unit_ms: 1_000,
            timeout_ms: 15_000,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }
}

/// Record store location
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StoreConfig {
    /// Directory holding the JSON record documents
    pub results_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
        }
    }
}
