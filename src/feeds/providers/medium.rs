// src/feeds/providers/medium.rs
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use serde_json::Value;

use super::{non_empty, record_fetch_ms};
use crate::feeds::config::MediumParams;
use crate::feeds::transport::Transport;
use crate::feeds::types::{ArticleOrigin, NormalizedArticle, SourceProvider};
use crate::feeds::{excerpt, normalize_text, reading_time_minutes, timestamp_or_epoch};

const NAME: &str = "medium";

#[derive(Debug, Deserialize)]
struct Rss2Json {
    status: Option<String>,
    message: Option<String>,
    items: Option<Vec<Item>>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    link: Option<String>,
    // rss2json sends `null` as readily as it omits the field.
    content: Option<String>,
    categories: Option<Vec<String>>,
}

pub struct MediumProvider {
    params: MediumParams,
    transport: Arc<dyn Transport>,
}

impl MediumProvider {
    pub fn new(params: MediumParams, transport: Arc<dyn Transport>) -> Self {
        Self { params, transport }
    }

    pub fn endpoint(&self) -> String {
        self.params.rss2json_url.clone()
    }

    pub fn parse_items(body: Value) -> Result<Vec<NormalizedArticle>> {
        let feed: Rss2Json = serde_json::from_value(body).context("parsing rss2json payload")?;
        if let Some(status) = feed.status.as_deref() {
            if !status.eq_ignore_ascii_case("ok") {
                bail!(
                    "rss2json status {status}: {}",
                    feed.message.unwrap_or_default()
                );
            }
        }

        let items = feed.items.unwrap_or_default();
        let mut out = Vec::with_capacity(items.len());
        // Ids follow the feed position, so they are only stable within one load.
        for (index, it) in items.into_iter().enumerate() {
            let Some(title) = non_empty(it.title) else {
                tracing::debug!(provider = NAME, index, "item without title skipped");
                continue;
            };
            let content = it.content.unwrap_or_default();
            let description = it
                .description
                .as_deref()
                .map(normalize_text)
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| excerpt(&content));
            let mut tags = it.categories.unwrap_or_default();
            tags.retain(|t| !t.trim().is_empty());
            out.push(NormalizedArticle {
                id: format!("medium-{index}"),
                title,
                description,
                published_at: timestamp_or_epoch(it.pub_date.as_deref(), NAME),
                reading_time_minutes: reading_time_minutes(&content),
                url: it.link.unwrap_or_default(),
                origin: ArticleOrigin::Medium,
                tags,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for MediumProvider {
    type Record = NormalizedArticle;

    async fn fetch_latest(&self) -> Result<Vec<NormalizedArticle>> {
        let t0 = std::time::Instant::now();
        counter!("feeds_fetch_attempts_total", "provider" => NAME).increment(1);

        let query = vec![("rss_url".to_string(), self.params.feed_url())];
        let body = match self.transport.get_json(&self.endpoint(), &query).await {
            Ok(b) => b,
            Err(e) => {
                counter!("feeds_fetch_failures_total", "provider" => NAME).increment(1);
                return Err(e).context("rss2json medium request");
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
