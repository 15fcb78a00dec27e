// src/feeds/providers/devto.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use serde_json::Value;

use super::{non_empty, record_fetch_ms};
use crate::feeds::config::DevtoParams;
use crate::feeds::transport::Transport;
use crate::feeds::types::{ArticleOrigin, NormalizedArticle, SourceProvider};
use crate::feeds::{normalize_text, reading_time_minutes, timestamp_or_epoch};

const NAME: &str = "devto";

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    id: Value,
    title: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
    reading_time_minutes: Option<u32>,
    url: Option<String>,
    #[serde(default)]
    tag_list: Value,
}

/// dev.to sends `tag_list` as an array on listings and as a comma-separated
/// string on single-article payloads.
fn unify_tags(v: &Value) -> Vec<String> {
    let raw: Vec<&str> = match v {
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        Value::String(s) => s.split(',').collect(),
        _ => Vec::new(),
    };
    raw.into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

pub struct DevtoProvider {
    params: DevtoParams,
    transport: Arc<dyn Transport>,
}

impl DevtoProvider {
    pub fn new(params: DevtoParams, transport: Arc<dyn Transport>) -> Self {
        Self { params, transport }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/articles", self.params.base_url.trim_end_matches('/'))
    }

    pub fn parse_items(body: Value) -> Result<Vec<NormalizedArticle>> {
        let articles: Vec<Article> =
            serde_json::from_value(body).context("parsing dev.to articles")?;
        let mut out = Vec::with_capacity(articles.len());
        for a in articles {
            let (Some(id), Some(title)) = (id_string(&a.id), non_empty(a.title)) else {
                tracing::debug!(provider = NAME, "article without id/title skipped");
                continue;
            };
            let description = a.description.as_deref().map(normalize_text).unwrap_or_default();
            let minutes = a
                .reading_time_minutes
                .filter(|m| *m > 0)
                .unwrap_or_else(|| reading_time_minutes(&description));
            out.push(NormalizedArticle {
                id: format!("devto-{id}"),
                title,
                published_at: timestamp_or_epoch(a.published_at.as_deref(), NAME),
                reading_time_minutes: minutes,
                url: a.url.unwrap_or_default(),
                origin: ArticleOrigin::Devto,
                tags: unify_tags(&a.tag_list),
                description,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for DevtoProvider {
    type Record = NormalizedArticle;

    async fn fetch_latest(&self) -> Result<Vec<NormalizedArticle>> {
        let t0 = std::time::Instant::now();
        counter!("feeds_fetch_attempts_total", "provider" => NAME).increment(1);

        let query = vec![("username".to_string(), self.params.username.clone())];
        let body = match self.transport.get_json(&self.endpoint(), &query).await {
            Ok(b) => b,
            Err(e) => {
                counter!("feeds_fetch_failures_total", "provider" => NAME).increment(1);
                return Err(e).context("dev.to articles request");
            }
        };
        let out = Self::parse_items(body)?;
        record_fetch_ms(t0);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
