// src/aggregator.rs
//! Concurrent fan-out over the source adapters of one domain (projects, articles)
//! plus the per-page load state observers read.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use futures::future::{join_all, try_join_all};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::feeds::types::SourceProvider;
use crate::retry::{retry_with_backoff, RetryPolicy};

pub const PROJECTS_ERROR: &str = "Unable to fetch projects";
pub const ARTICLES_ERROR: &str = "Unable to fetch articles";
pub const LANGUAGES_ERROR: &str = "Unable to fetch programming languages";

pub type DynSource<T> = Arc<dyn SourceProvider<Record = T>>;

/// What to do when some adapters succeed and others exhaust their retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Any failure fails the whole cycle; successful results are discarded.
    #[default]
    AllOrNothing,
    /// Keep what succeeded and name the adapters that failed in the error.
    Partial,
}

/// Outcome of one aggregation cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated<T> {
    pub items: Vec<T>,
    pub error: Option<String>,
}

pub struct Aggregator<T> {
    sources: Vec<DynSource<T>>,
    retry: RetryPolicy,
    policy: MergePolicy,
    error_message: String,
}

impl<T: Send + 'static> Aggregator<T> {
    pub fn new(error_message: &str) -> Self {
        Self {
            sources: Vec::new(),
            retry: RetryPolicy::default(),
            policy: MergePolicy::default(),
            error_message: error_message.to_string(),
        }
    }

    pub fn with_source(mut self, source: DynSource<T>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Run one aggregation cycle. All adapters are polled concurrently, each
    /// wrapped in its own retry loop. Output order is adapter registration
    /// order, not completion order.
    pub async fn collect(&self) -> Aggregated<T> {
        crate::feeds::ensure_metrics_described();
        counter!("feeds_aggregation_cycles_total").increment(1);

        let retry = self.retry;
        let calls = self.sources.iter().map(|s| {
            let s = Arc::clone(s);
            async move {
                let name = s.name();
                retry_with_backoff(retry, name, || s.fetch_latest())
                    .await
                    .map_err(|e| (name, e))
            }
        });

        let out = match self.policy {
            MergePolicy::AllOrNothing => match try_join_all(calls).await {
                Ok(lists) => Aggregated {
                    items: lists.into_iter().flatten().collect(),
                    error: None,
                },
                Err((name, e)) => {
                    warn!(target: "aggregator", provider = name, error = ?e, "aggregation failed");
                    Aggregated {
                        items: Vec::new(),
                        error: Some(self.error_message.clone()),
                    }
                }
            },
            MergePolicy::Partial => {
                let mut items = Vec::new();
                let mut failed = Vec::new();
                for res in join_all(calls).await {
                    match res {
                        Ok(mut v) => items.append(&mut v),
                        Err((name, e)) => {
                            warn!(target: "aggregator", provider = name, error = ?e, "provider failed");
                            failed.push(name);
                        }
                    }
                }
                let error = (!failed.is_empty())
                    .then(|| format!("{} (failed: {})", self.error_message, failed.join(", ")));
                Aggregated { items, error }
            }
        };

        if out.error.is_some() {
            counter!("feeds_aggregation_failures_total").increment(1);
        }
        info!(
            target: "aggregator",
            sources = self.sources.len(),
            items = out.items.len(),
            failed = out.error.is_some(),
            "aggregation cycle done"
        );
        out
    }
}

/// The items/loading/error triad a page renders from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

/// Load state owned by one page. Created on mount; after `unmount` any
/// in-flight load finishes without writing.
///
/// A failed cycle keeps the items from the last successful one (empty until
/// the first success) and sets the error.
///
/// Loads may overlap (initial load plus a manual reload). Only the most
/// recently started cycle writes its result; an older one that finishes later
/// is dropped, and `loading` stays set until the newest cycle lands.
pub struct PageController<T> {
    aggregator: Aggregator<T>,
    state: RwLock<LoadState<T>>,
    mounted: AtomicBool,
    generation: AtomicU64,
}

impl<T: Clone + Send + Sync + 'static> PageController<T> {
    pub fn mount(aggregator: Aggregator<T>) -> Arc<Self> {
        Arc::new(Self {
            aggregator,
            state: RwLock::new(LoadState::default()),
            mounted: AtomicBool::new(true),
            generation: AtomicU64::new(0),
        })
    }

    pub fn snapshot(&self) -> LoadState<T> {
        self.state.read().expect("page state poisoned").clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    /// Start a new aggregation cycle; also the manual "retry" action.
    pub async fn load(&self) -> LoadState<T> {
        let cycle = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.write(|s| {
            s.loading = true;
            s.error = None;
        }) {
            return self.snapshot();
        }

        let Aggregated { items, error } = self.aggregator.collect().await;

        let generation = &self.generation;
        self.write(move |s| {
            // Checked under the state lock; a newer cycle owns `loading` and the result.
            if generation.load(Ordering::SeqCst) != cycle {
                tracing::debug!(target: "aggregator", cycle, "superseded cycle result dropped");
                return;
            }
            s.loading = false;
            match error {
                None => s.items = items,
                Some(msg) if !items.is_empty() => {
                    // Partial policy: show what came back, keep the error visible.
                    s.items = items;
                    s.error = Some(msg);
                }
                Some(msg) => s.error = Some(msg),
            }
        });
        self.snapshot()
    }

    /// Apply `f` only while mounted; returns whether it was applied.
    fn write(&self, f: impl FnOnce(&mut LoadState<T>)) -> bool {
        if !self.is_mounted() {
            tracing::debug!(target: "aggregator", "late write after unmount ignored");
            return false;
        }
        let mut guard = self.state.write().expect("page state poisoned");
        f(&mut guard);
        true
    }
}
