use std::time::Duration;

use anyhow::Context;
use feed_rs::parser::{self, ParseFeedError};
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{error, info};

use crate::article::Article;
use crate::config::{Config, SourceConfig};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),
    #[error("invalid feed: {0}")]
    Parse(#[from] ParseFeedError),
}

pub struct Fetcher {
    client: Client,
    per_feed_limit: usize,
    summary_max_chars: usize,
    concurrency: usize,
    delay: Duration,
}

impl Fetcher {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            per_feed_limit: config.per_feed_limit,
            summary_max_chars: config.summary_max_chars,
            concurrency: config.fetch_concurrency.max(1),
            delay: Duration::from_millis(config.fetch_delay_ms),
        })
    }

    /// Fetch every source, returning articles in source order. Failed
    /// sources contribute nothing.
    ///
    /// With a concurrency of 1 the sources are fetched one after another,
    /// pausing `fetch_delay_ms` between requests.
    pub async fn fetch_all(&self, sources: &[SourceConfig]) -> Vec<Article> {
        info!("Fetching {} sources", sources.len());

        if self.concurrency == 1 {
            let mut articles = Vec::new();
            for (i, source) in sources.iter().enumerate() {
                if i > 0 && !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                articles.extend(self.fetch_source(source).await);
            }
            return articles;
        }

        let batches: Vec<Vec<Article>> = stream::iter(sources)
            .map(|source| self.fetch_source(source))
            .buffered(self.concurrency)
            .collect()
            .await;

        batches.into_iter().flatten().collect()
    }

    /// Best-effort fetch of one source. Errors are logged and yield no articles.
    pub async fn fetch_source(&self, source: &SourceConfig) -> Vec<Article> {
        match self.try_fetch(source).await {
            Ok(articles) => {
                info!("Fetched {} articles from '{}'", articles.len(), source.name);
                articles
            }
            Err(e) => {
                error!("Failed to fetch source '{}' ({}): {}", source.name, source.rss_url, e);
                Vec::new()
            }
        }
    }

    pub async fn try_fetch(&self, source: &SourceConfig) -> Result<Vec<Article>, FetchError> {
        info!("Fetching feed: {} ({})", source.name, source.rss_url);

        let response = self.client.get(&source.rss_url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        let bytes = response.bytes().await?;

        parse_entries(&bytes, source, self.per_feed_limit, self.summary_max_chars)
    }
}

/// Parse raw feed bytes into at most `limit` articles.
pub fn parse_entries(
    bytes: &[u8],
    source: &SourceConfig,
    limit: usize,
    summary_max_chars: usize,
) -> Result<Vec<Article>, FetchError> {
    let parsed = parser::parse(bytes)?;

    Ok(parsed
        .entries
        .iter()
        .take(limit)
        .filter_map(|entry| Article::from_entry(entry, source, summary_max_chars))
        .collect())
}
