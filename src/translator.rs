//! Localized titles and one-line summaries through an OpenAI-compatible
//! chat completions endpoint.
//!
//! Every failure here is soft: an article that cannot be translated keeps
//! its original title and summary.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::article::Article;
use crate::config::TranslatorConfig;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Translation {
    pub title: Option<String>,
    pub one_line: Option<String>,
}

pub struct Translator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    target_language: String,
    max_tokens: usize,
    temperature: f32,
    concurrency: usize,
}

impl Translator {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        target_language: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to create translator HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            target_language: target_language.into(),
            max_tokens: 150,
            temperature: 0.3,
            concurrency: 4,
        })
    }

    pub fn with_defaults(mut self, max_tokens: usize, temperature: f32, concurrency: usize) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self.concurrency = concurrency.max(1);
        self
    }

    /// Build a translator from config. Returns `None` when translation is
    /// disabled or no API key is available.
    pub fn from_config(config: &TranslatorConfig) -> Option<Self> {
        if !config.enabled {
            info!("Translation disabled");
            return None;
        }

        let Some(api_key) = config.resolve_api_key() else {
            warn!(
                "No translation API key (checked ${} and config), keeping original text",
                config.api_key_env
            );
            return None;
        };

        match Self::new(
            &config.endpoint,
            api_key,
            &config.model,
            &config.target_language,
            Duration::from_secs(config.timeout_secs),
        ) {
            Ok(translator) => Some(translator.with_defaults(
                config.max_tokens,
                config.temperature,
                config.concurrency,
            )),
            Err(e) => {
                warn!("Translator unavailable: {:#}", e);
                None
            }
        }
    }

    fn prompt(&self, title: &str, summary: Option<&str>) -> String {
        let summary = summary.filter(|s| !s.trim().is_empty()).unwrap_or("(none)");
        format!(
            r#"Translate this news headline into {lang} and write a one-line summary in {lang} (max 40 characters).

Reply with strict JSON only:
{{"title": "translated headline", "one_line": "one-line summary"}}

HEADLINE:
{title}

SUMMARY:
{summary}
"#,
            lang = self.target_language,
        )
    }

    pub async fn translate(&self, title: &str, summary: Option<&str>) -> Result<Translation> {
        let req_body = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: self.prompt(title, summary),
            }],
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req_body)
            .send()
            .await
            .context("translation request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("translation API error {}: {}", status, body);
        }

        let resp_body: ChatResponse = response
            .json()
            .await
            .context("failed to parse translation response")?;

        let choice = resp_body
            .choices
            .first()
            .context("translation response has no choices")?;

        parse_translation(&choice.message.content)
    }

    /// Translate articles in place. Articles whose request fails are left
    /// untouched. Returns how many were translated.
    pub async fn translate_all(&self, articles: &mut [Article]) -> usize {
        let results: Vec<Result<Translation>> = stream::iter(articles.iter())
            .map(|article| {
                let summary = Some(article.summary.as_str());
                self.translate(&article.title, summary)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut translated = 0;
        for (article, result) in articles.iter_mut().zip(results) {
            match result {
                Ok(translation) => {
                    article.title_zh = translation.title;
                    article.one_line = translation.one_line;
                    translated += 1;
                }
                Err(e) => warn!("Translation failed for '{}': {:#}", article.title, e),
            }
        }

        info!("Translated {}/{} articles", translated, articles.len());
        translated
    }
}

/// Read the model reply. Falls back to the first non-empty line as the
/// one-line summary when the reply carries no JSON.
pub fn parse_translation(content: &str) -> Result<Translation> {
    for json in json_candidates(content) {
        if let Ok(reply) = serde_json::from_str::<TranslationJson>(&json) {
            return Ok(Translation {
                title: non_empty(reply.title),
                one_line: non_empty(reply.one_line),
            });
        }
    }

    let line = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("```"))
        .context("empty translation reply")?;

    // A JSON object that failed to parse must not leak into the output
    if line.starts_with('{') {
        bail!("unparseable JSON in translation reply: {}", line);
    }

    Ok(Translation {
        title: None,
        one_line: Some(line.to_string()),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Possible JSON objects in a reply, most specific first: the body of a code
/// fence (any language tag), then the outermost brace-delimited span.
pub fn json_candidates(text: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        if let Some(end) = rest.find("```") {
            let fenced = rest[..end].trim_start();
            let tag_len = fenced
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(fenced.len());
            let (tag, body) = fenced.split_at(tag_len);
            let body = if tag.eq_ignore_ascii_case("json") { body } else { fenced };
            candidates.push(body.trim().to_string());
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            let span = text[start..=end].to_string();
            if !candidates.contains(&span) {
                candidates.push(span);
            }
        }
    }

    candidates
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct TranslationJson {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    one_line: Option<String>,
}
