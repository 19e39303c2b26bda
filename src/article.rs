use chrono::{DateTime, SecondsFormat, Utc};
use feed_rs::model::Entry;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::config::SourceConfig;

/// A feed entry merged with the metadata of the source it came from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub link: String,
    #[serde(serialize_with = "serialize_published")]
    pub published: Option<DateTime<Utc>>,
    pub source: String,
    pub country: String,
    pub language: String,
    pub category: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_zh: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_line: Option<String>,
}

/// RFC 3339 in UTC with a `Z` suffix, the one timestamp format the
/// artifact uses.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn serialize_utc<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_utc(dt))
}

// Consumers expect a string; a missing date is written as "".
fn serialize_published<S>(published: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match published {
        Some(dt) => serialize_utc(dt, serializer),
        None => serializer.serialize_str(""),
    }
}

impl Article {
    /// Normalize a parsed feed entry. Returns `None` for entries with no
    /// title or no link.
    pub fn from_entry(entry: &Entry, source: &SourceConfig, summary_max_chars: usize) -> Option<Self> {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .unwrap_or_default();

        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .unwrap_or_default();

        if title.is_empty() {
            warn!("Skipping entry with no title from '{}': {}", source.name, link);
            return None;
        }

        if link.is_empty() {
            warn!("Skipping entry with no link from '{}': {}", source.name, title);
            return None;
        }

        let published = entry.published.or(entry.updated);

        let summary = entry
            .summary
            .as_ref()
            .map(|s| s.content.as_str())
            .or_else(|| entry.content.as_ref().and_then(|c| c.body.as_deref()))
            .map(|s| truncate_chars(s.trim(), summary_max_chars))
            .unwrap_or_default();

        Some(Self {
            id: link_id(&link),
            title,
            link,
            published,
            source: source.name.clone(),
            country: source.country.clone(),
            language: source.language.clone(),
            category: source.category.clone(),
            summary,
            title_zh: None,
            one_line: None,
        })
    }
}

/// Short stable identifier derived from the article link.
pub fn link_id(link: &str) -> String {
    let digest = Sha256::digest(link.as_bytes());
    hex::encode(digest)[..12].to_string()
}

pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
