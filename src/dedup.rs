use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::article::Article;

/// Hash of the lowercased, trimmed title. Two articles with the same key are
/// treated as the same story.
pub fn title_key(title: &str) -> String {
    let normalized = title.trim().to_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// Keep the first article for each title key, preserving input order.
pub fn dedupe(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| seen.insert(title_key(&article.title)))
        .collect()
}
