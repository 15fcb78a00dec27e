// src/feeds/providers/gitlab.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;

use super::{lenient_u64, non_empty, record_fetch_ms};
use crate::feeds::config::GitlabParams;
use crate::feeds::timestamp_or_epoch;
use crate::feeds::transport::{Query, Transport};
use crate::feeds::types::{NormalizedProject, ProjectOrigin, SourceProvider};

const NAME: &str = "gitlab";

#[derive(Debug, Deserialize)]
struct Project {
    id: u64,
    name: Option<String>,
    description: Option<String>,
    // Not part of GitLab's documented list payload, but some instances send it.
    language: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    star_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    forks_count: u64,
    web_url: Option<String>,
    created_at: Option<String>,
    last_activity_at: Option<String>,
}

pub struct GitlabProvider {
    params: GitlabParams,
    transport: Arc<dyn Transport>,
}

impl GitlabProvider {
    pub fn new(params: GitlabParams, transport: Arc<dyn Transport>) -> Self {
        Self { params, transport }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/users/{}/projects",
            self.params.base_url.trim_end_matches('/'),
            self.params.username
        )
    }

    fn query(&self) -> Query {
        vec![
            ("visibility".to_string(), self.params.visibility.clone()),
            (
                "include_statistics".to_string(),
                self.params.include_statistics.to_string(),
            ),
            ("per_page".to_string(), self.params.per_page.to_string()),
        ]
    }

    pub fn parse_items(body: serde_json::Value) -> Result<Vec<NormalizedProject>> {
        let projects: Vec<Project> =
            serde_json::from_value(body).context("parsing gitlab projects")?;
        let mut out = Vec::with_capacity(projects.len());
        for p in projects {
            let Some(name) = non_empty(p.name) else {
                tracing::debug!(provider = NAME, id = p.id, "project without name skipped");
                continue;
            };
            out.push(NormalizedProject {
                id: p.id,
                name,
                description: non_empty(p.description),
                language: non_empty(p.language),
                stars: p.star_count,
                forks: p.forks_count,
                url: p.web_url.unwrap_or_default(),
                origin: ProjectOrigin::Gitlab,
                created_at: timestamp_or_epoch(p.created_at.as_deref(), NAME),
                updated_at: timestamp_or_epoch(p.last_activity_at.as_deref(), NAME),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for GitlabProvider {
    type Record = NormalizedProject;

    async fn fetch_latest(&self) -> Result<Vec<NormalizedProject>> {
        let t0 = std::time::Instant::now();
        counter!("feeds_fetch_attempts_total", "provider" => NAME).increment(1);

        let body = match self.transport.get_json(&self.endpoint(), &self.query()).await {
            Ok(b) => b,
            Err(e) => {
                counter!("feeds_fetch_failures_total", "provider" => NAME).increment(1);
                return Err(e).context("gitlab projects request");
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
