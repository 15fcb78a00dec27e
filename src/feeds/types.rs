// src/feeds/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const NO_DESCRIPTION: &str = "No description available";
pub const NO_LANGUAGE: &str = "N/A";

/// Repository host a project was listed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectOrigin {
    Github,
    Gitlab,
}

/// Blog platform an article was listed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleOrigin {
    Devto,
    Medium,
}

impl ProjectOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectOrigin::Github => "github",
            ProjectOrigin::Gitlab => "gitlab",
        }
    }
}

impl ArticleOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleOrigin::Devto => "devto",
            ArticleOrigin::Medium => "medium",
        }
    }
}

/// A repository listing, independent of the host it came from.
/// `id` is only unique within one `origin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedProject {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub url: String,
    pub origin: ProjectOrigin,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NormalizedProject {
    pub fn display_description(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(NO_DESCRIPTION)
    }

    pub fn display_language(&self) -> &str {
        self.language
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(NO_LANGUAGE)
    }
}

/// A blog post listing. `id` carries the origin prefix (`devto-42`, `medium-0`)
/// so it is unique across platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedArticle {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub reading_time_minutes: u32, // always >= 1
    pub url: String,
    pub origin: ArticleOrigin,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One upstream listing endpoint mapped into a normalized record shape.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    type Record: Send + 'static;

    async fn fetch_latest(&self) -> Result<Vec<Self::Record>>;
    fn name(&self) -> &'static str;
}
