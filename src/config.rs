use anyhow::{ensure, Context};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Where the JSON artifact is written
    #[serde(default = "default_output")]
    pub output: String,
    /// Cap on the number of articles kept after sorting
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,
    /// Entries taken from each feed
    #[serde(default = "default_per_feed_limit")]
    pub per_feed_limit: usize,
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
    /// Feeds fetched at once; 1 fetches them one after another
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    /// Pause between feed requests when fetching one at a time
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,
    /// HTTP timeout for feed requests, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub translator: TranslatorConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_output() -> String {
    "data/news.json".to_string()
}

fn default_max_articles() -> usize {
    100
}

fn default_per_feed_limit() -> usize {
    20
}

fn default_summary_max_chars() -> usize {
    300
}

fn default_fetch_concurrency() -> usize {
    1
}

fn default_fetch_delay_ms() -> u64 {
    500
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "GlobalNews/1.0 (RSS Aggregator)".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SourceConfig {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub country: String,
    pub language: String,
    pub category: String,
    #[serde(alias = "rss")]
    pub rss_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranslatorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable consulted before `api_key`
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_translator_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_translator_concurrency")]
    pub concurrency: usize,
}

fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_target_language() -> String {
    "Simplified Chinese".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_translator_timeout() -> u64 {
    30
}

fn default_max_tokens() -> usize {
    150
}

fn default_temperature() -> f32 {
    0.3
}

fn default_translator_concurrency() -> usize {
    4
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            endpoint: default_endpoint(),
            model: default_model(),
            target_language: default_target_language(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_translator_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            concurrency: default_translator_concurrency(),
        }
    }
}

impl TranslatorConfig {
    /// The environment variable wins over a key written in the config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        let from_env = if self.api_key_env.is_empty() {
            None
        } else {
            std::env::var(&self.api_key_env).ok()
        };

        from_env
            .into_iter()
            .chain(self.api_key.clone())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }
}

impl Config {
    /// Load from a `.json` sources file or a TOML config, chosen by extension.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
        .with_context(|| format!("invalid config {}", path.display()))?;

        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.max_articles > 0, "max_articles must be positive");
        ensure!(self.per_feed_limit > 0, "per_feed_limit must be positive");
        ensure!(self.fetch_concurrency > 0, "fetch_concurrency must be positive");

        for source in &self.sources {
            ensure!(
                !source.rss_url.trim().is_empty(),
                "source '{}' has an empty rss_url",
                source.name
            );
        }

        Ok(())
    }
}
