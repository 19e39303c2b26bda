use chrono::{DateTime, Utc};
use tracing::info;

use crate::article::Article;
use crate::config::SourceConfig;
use crate::dedup::dedupe;
use crate::fetcher::Fetcher;
use crate::output::NewsDigest;
use crate::translator::Translator;

/// Articles without a usable date sort as if published at the Unix epoch.
pub fn sort_key(article: &Article) -> DateTime<Utc> {
    article.published.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Newest first, then keep the top `cap`. The sort is stable, so ties keep
/// source order.
pub fn sort_and_truncate(articles: &mut Vec<Article>, cap: usize) {
    articles.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
    articles.truncate(cap);
}

pub struct Pipeline {
    fetcher: Fetcher,
    translator: Option<Translator>,
    max_articles: usize,
}

impl Pipeline {
    pub fn new(fetcher: Fetcher, translator: Option<Translator>, max_articles: usize) -> Self {
        Self {
            fetcher,
            translator,
            max_articles,
        }
    }

    /// One full run: fetch, dedupe, sort, cap, translate.
    pub async fn run(&self, sources: &[SourceConfig]) -> NewsDigest {
        let fetched = self.fetcher.fetch_all(sources).await;
        let fetched_count = fetched.len();

        let mut articles = dedupe(fetched);
        let total = articles.len();
        info!("Total articles: {}, unique: {}", fetched_count, total);

        sort_and_truncate(&mut articles, self.max_articles);

        if let Some(translator) = &self.translator {
            translator.translate_all(&mut articles).await;
        }

        NewsDigest {
            updated: Utc::now(),
            total,
            sources_count: sources.len(),
            articles,
        }
    }
}
