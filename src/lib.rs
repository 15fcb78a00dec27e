// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregator;
pub mod api;
pub mod contact;
pub mod derive;
pub mod feeds;
pub mod languages;
pub mod metrics;
pub mod retry;

// ---- Re-exports for stable public API ----
pub use crate::aggregator::{Aggregator, LoadState, MergePolicy, PageController};
pub use crate::api::{router, AppState};
pub use crate::derive::{derive_articles, derive_projects, ArticleFilter, ProjectFilter};
pub use crate::feeds::types::{
    ArticleOrigin, NormalizedArticle, NormalizedProject, ProjectOrigin, SourceProvider,
};
pub use crate::retry::{retry_with_backoff, RetryPolicy};
