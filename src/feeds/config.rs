// src/feeds/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregator::MergePolicy;
use crate::retry::RetryPolicy;

pub const ENV_CONFIG_PATH: &str = "FEEDS_CONFIG_PATH";
pub const ENV_EMAILJS_PUBLIC_KEY: &str = "EMAILJS_PUBLIC_KEY";

const DEFAULT_TOML_PATH: &str = "config/feeds.toml";
const DEFAULT_JSON_PATH: &str = "config/feeds.json";

/// Top-level configuration: who to list, where to list from, how hard to try.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedsConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub retry: RetryConfig,
    pub merge_policy: MergePolicy,
    pub github: GithubParams,
    pub gitlab: GitlabParams,
    pub devto: DevtoParams,
    pub medium: MediumParams,
    pub contact: ContactConfig,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            user_agent: "portfolio-feeds/0.1".to_string(),
            timeout_secs: 10,
            retry: RetryConfig::default(),
            merge_policy: MergePolicy::default(),
            github: GithubParams::default(),
            gitlab: GitlabParams::default(),
            devto: DevtoParams::default(),
            medium: MediumParams::default(),
            contact: ContactConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let p = RetryPolicy::default();
        Self {
            max_retries: p.max_retries,
            initial_delay_ms: p.initial_delay.as_millis() as u64,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(c: &RetryConfig) -> Self {
        RetryPolicy {
            max_retries: c.max_retries,
            initial_delay: Duration::from_millis(c.initial_delay_ms),
        }
    }
}

/// GitHub `/users/{user}/repos`. Request parameters are fixed per deployment,
/// not per call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GithubParams {
    pub base_url: String,
    pub username: String,
    pub owner_type: String,
    pub per_page: u32,
}

impl Default for GithubParams {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            username: String::new(),
            owner_type: "owner".to_string(),
            per_page: 100,
        }
    }
}

/// GitLab `/users/{user}/projects`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GitlabParams {
    pub base_url: String,
    pub username: String,
    pub visibility: String,
    pub include_statistics: bool,
    pub per_page: u32,
}

impl Default for GitlabParams {
    fn default() -> Self {
        Self {
            base_url: "https://gitlab.com/api/v4".to_string(),
            username: String::new(),
            visibility: "public".to_string(),
            include_statistics: true,
            per_page: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DevtoParams {
    pub base_url: String,
    pub username: String,
}

impl Default for DevtoParams {
    fn default() -> Self {
        Self {
            base_url: "https://dev.to/api".to_string(),
            username: String::new(),
        }
    }
}

/// Medium has no JSON listing API; its RSS feed is read through rss2json.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MediumParams {
    pub rss2json_url: String,
    pub feed_base: String,
    /// Medium handle including the leading `@`.
    pub username: String,
}

impl Default for MediumParams {
    fn default() -> Self {
        Self {
            rss2json_url: "https://api.rss2json.com/v1/api.json".to_string(),
            feed_base: "https://medium.com/feed".to_string(),
            username: String::new(),
        }
    }
}

impl MediumParams {
    pub fn feed_url(&self) -> String {
        format!(
            "{}/{}",
            self.feed_base.trim_end_matches('/'),
            self.username.trim()
        )
    }
}

/// EmailJS-compatible transactional mail settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContactConfig {
    pub endpoint: String,
    pub service_id: String,
    pub template_id: String,
    /// "ENV" means: read from EMAILJS_PUBLIC_KEY
    pub public_key: String,
    /// Recipient display name put into the template.
    pub to_name: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.emailjs.com/api/v1.0/email/send".to_string(),
            service_id: String::new(),
            template_id: String::new(),
            public_key: "ENV".to_string(),
            to_name: String::new(),
        }
    }
}

impl FeedsConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feeds config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing feeds config {}", path.display()))?;
        cfg.resolved()
    }

    /// Load using env var + fallbacks:
    /// 1) $FEEDS_CONFIG_PATH
    /// 2) config/feeds.toml
    /// 3) config/feeds.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        for p in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        Self::default().resolved()
    }

    /// Resolve env-backed secrets and clamp nonsense values.
    fn resolved(mut self) -> Result<Self> {
        if self.contact.public_key.trim().eq_ignore_ascii_case("env") {
            self.contact.public_key = std::env::var(ENV_EMAILJS_PUBLIC_KEY).unwrap_or_default();
        }
        if self.github.per_page == 0 || self.gitlab.per_page == 0 {
            bail!("per_page must be positive");
        }
        self.github.per_page = self.github.per_page.min(100);
        self.gitlab.per_page = self.gitlab.per_page.min(100);
        Ok(self)
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<FeedsConfig> {
    if hint_ext == "json" {
        return serde_json::from_str(s).context("invalid JSON feeds config");
    }
    match toml::from_str(s) {
        Ok(cfg) => Ok(cfg),
        Err(toml_err) => serde_json::from_str(s)
            .map_err(|_| anyhow!("unsupported feeds config format: {toml_err}")),
    }
}
