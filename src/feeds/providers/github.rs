// src/feeds/providers/github.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;

use super::{lenient_u64, non_empty, record_fetch_ms};
use crate::feeds::config::GithubParams;
use crate::feeds::timestamp_or_epoch;
use crate::feeds::transport::{Query, Transport};
use crate::feeds::types::{NormalizedProject, ProjectOrigin, SourceProvider};

const NAME: &str = "github";

#[derive(Debug, Deserialize)]
struct Repo {
    id: u64,
    name: Option<String>,
    description: Option<String>,
    language: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    stargazers_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    forks_count: u64,
    html_url: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

pub struct GithubProvider {
    params: GithubParams,
    transport: Arc<dyn Transport>,
}

impl GithubProvider {
    pub fn new(params: GithubParams, transport: Arc<dyn Transport>) -> Self {
        Self { params, transport }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/users/{}/repos",
            self.params.base_url.trim_end_matches('/'),
            self.params.username
        )
    }

    fn query(&self) -> Query {
        vec![
            ("type".to_string(), self.params.owner_type.clone()),
            ("per_page".to_string(), self.params.per_page.to_string()),
        ]
    }

    pub fn parse_items(body: serde_json::Value) -> Result<Vec<NormalizedProject>> {
        let repos: Vec<Repo> = serde_json::from_value(body).context("parsing github repos")?;
        let mut out = Vec::with_capacity(repos.len());
        for r in repos {
            let Some(name) = non_empty(r.name) else {
                tracing::debug!(provider = NAME, id = r.id, "repo without name skipped");
                continue;
            };
            out.push(NormalizedProject {
                id: r.id,
                name,
                description: non_empty(r.description),
                language: non_empty(r.language),
                stars: r.stargazers_count,
                forks: r.forks_count,
                url: r.html_url.unwrap_or_default(),
                origin: ProjectOrigin::Github,
                created_at: timestamp_or_epoch(r.created_at.as_deref(), NAME),
                updated_at: timestamp_or_epoch(r.updated_at.as_deref(), NAME),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for GithubProvider {
    type Record = NormalizedProject;

    async fn fetch_latest(&self) -> Result<Vec<NormalizedProject>> {
        let t0 = std::time::Instant::now();
        counter!("feeds_fetch_attempts_total", "provider" => NAME).increment(1);

        let body = match self.transport.get_json(&self.endpoint(), &self.query()).await {
            Ok(b) => b,
            Err(e) => {
                counter!("feeds_fetch_failures_total", "provider" => NAME).increment(1);
                return Err(e).context("github repos request");
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
