use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::article::{format_utc, serialize_utc, Article};

/// The JSON document read by the front-end.
#[derive(Debug, Serialize)]
pub struct NewsDigest {
    #[serde(serialize_with = "serialize_utc")]
    pub updated: DateTime<Utc>,
    /// Unique articles found this run, before the cap was applied
    pub total: usize,
    pub sources_count: usize,
    pub articles: Vec<Article>,
}

/// Write the digest as pretty JSON, replacing any previous file in one step.
pub async fn write_digest<P: AsRef<Path>>(path: P, digest: &NewsDigest) -> anyhow::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(digest)?;

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json)
        .await
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("failed to replace {}", path.display()))?;

    info!(
        "Saved {} articles to {} (updated {})",
        digest.articles.len(),
        path.display(),
        format_utc(&digest.updated)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn digest(titles: &[&str]) -> NewsDigest {
        let articles = titles
            .iter()
            .map(|title| Article {
                id: "abc123def456".to_string(),
                title: title.to_string(),
                link: "https://example.com".to_string(),
                published: None,
                source: "Example".to_string(),
                country: "CN".to_string(),
                language: "zh".to_string(),
                category: "world".to_string(),
                summary: String::new(),
                title_zh: None,
                one_line: None,
            })
            .collect::<Vec<_>>();

        NewsDigest {
            updated: Utc::now(),
            total: articles.len(),
            sources_count: 1,
            articles,
        }
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("news.json");

        write_digest(&path, &digest(&["全球新闻"])).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        // Non-ASCII text is written as-is, not escaped
        assert!(content.contains("全球新闻"));

        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["sources_count"], 1);
        assert!(value["updated"].as_str().unwrap().ends_with('Z'));
        assert!(!value["updated"].as_str().unwrap().contains('.'));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_timestamps_share_one_format() {
        let when = Utc.with_ymd_and_hms(2024, 12, 9, 12, 0, 0).unwrap();
        let mut digest = digest(&["dated"]);
        digest.updated = when;
        digest.articles[0].published = Some(when);

        let value = serde_json::to_value(&digest).unwrap();
        assert_eq!(value["updated"], "2024-12-09T12:00:00Z");
        assert_eq!(value["articles"][0]["published"], value["updated"]);
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.json");

        write_digest(&path, &digest(&["one", "two"])).await.unwrap();
        write_digest(&path, &digest(&[])).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total"], 0);
        assert_eq!(value["articles"].as_array().unwrap().len(), 0);
    }
}
