// src/feeds/transport.rs
//! HTTP seam for the adapters. Production uses `HttpTransport`; tests swap in
//! `FixtureTransport`, which answers from scripted JSON without touching the network.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;

pub type Query = Vec<(String, String)>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` with `query` appended; any non-2xx status is an error.
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value>;

    /// POST a JSON body; any non-2xx status is an error. Response body is ignored.
    async fn post_json(&self, url: &str, body: &Value) -> Result<()>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building reqwest client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} non-2xx"))?;
        resp.json::<Value>()
            .await
            .with_context(|| format!("GET {url} json body"))
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<()> {
        self.client
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()
            .with_context(|| format!("POST {url} non-2xx"))?;
        Ok(())
    }
}

/// Scripted reply for one request.
#[derive(Debug, Clone)]
pub enum FixtureReply {
    Json(Value),
    Status(u16),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    Get { url: String, query: Query },
    Post { url: String, body: Value },
}

/// In-memory transport keyed by URL (query excluded).
///
/// Replies for a URL are consumed front to back; the last one sticks, so a
/// single scripted reply answers every call. Unknown URLs answer 404.
#[derive(Default)]
pub struct FixtureTransport {
    replies: Mutex<HashMap<String, VecDeque<FixtureReply>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, url: &str, body: Value) -> Self {
        self.push(url, FixtureReply::Json(body));
        self
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.push(url, FixtureReply::Status(status));
        self
    }

    pub fn push(&self, url: &str, reply: FixtureReply) {
        let mut map = self.replies.lock().expect("fixture mutex poisoned");
        map.entry(url.to_string()).or_default().push_back(reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("fixture mutex poisoned").clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| match r {
                RecordedRequest::Get { url: u, .. } | RecordedRequest::Post { url: u, .. } => {
                    u == url
                }
            })
            .count()
    }

    fn next_reply(&self, url: &str) -> FixtureReply {
        let mut map = self.replies.lock().expect("fixture mutex poisoned");
        match map.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(FixtureReply::Status(404)),
            Some(queue) => queue.front().cloned().unwrap_or(FixtureReply::Status(404)),
            None => FixtureReply::Status(404),
        }
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value> {
        self.requests
            .lock()
            .expect("fixture mutex poisoned")
            .push(RecordedRequest::Get {
                url: url.to_string(),
                query: query.to_vec(),
            });
        match self.next_reply(url) {
            FixtureReply::Json(v) => Ok(v),
            FixtureReply::Status(code) => Err(anyhow!("GET {url} non-2xx: HTTP {code}")),
        }
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<()> {
        self.requests
            .lock()
            .expect("fixture mutex poisoned")
            .push(RecordedRequest::Post {
                url: url.to_string(),
                body: body.clone(),
            });
        match self.next_reply(url) {
            FixtureReply::Json(_) => Ok(()),
            FixtureReply::Status(code) if (200..300).contains(&code) => Ok(()),
            FixtureReply::Status(code) => Err(anyhow!("POST {url} non-2xx: HTTP {code}")),
        }
    }
}
