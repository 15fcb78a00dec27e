use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::aggregator::{
    Aggregator, DynSource, LoadState, PageController, ARTICLES_ERROR, LANGUAGES_ERROR,
    PROJECTS_ERROR,
};
use crate::contact::{ContactMailer, ContactMessage, ContactStatus};
use crate::derive::{derive_articles, derive_projects, unique_languages, ArticleFilter, ProjectFilter};
use crate::feeds::config::FeedsConfig;
use crate::feeds::providers::{
    devto::DevtoProvider, github::GithubProvider, gitlab::GitlabProvider, medium::MediumProvider,
};
use crate::feeds::transport::Transport;
use crate::feeds::types::{NormalizedArticle, NormalizedProject};
use crate::languages::{language_stats, LanguageStat};

#[derive(Clone)]
pub struct AppState {
    pub projects: Arc<PageController<NormalizedProject>>,
    pub articles: Arc<PageController<NormalizedArticle>>,
    pub languages: Arc<PageController<NormalizedProject>>,
    pub mailer: Arc<ContactMailer>,
}

impl AppState {
    /// Wire adapters for every provider that has a username configured.
    pub fn from_config(cfg: &FeedsConfig, transport: Arc<dyn Transport>) -> Self {
        let project_sources = || {
            let mut v: Vec<DynSource<NormalizedProject>> = Vec::new();
            if !cfg.github.username.is_empty() {
                v.push(Arc::new(GithubProvider::new(cfg.github.clone(), transport.clone())));
            }
            if !cfg.gitlab.username.is_empty() {
                v.push(Arc::new(GitlabProvider::new(cfg.gitlab.clone(), transport.clone())));
            }
            v
        };
        let mut article_sources: Vec<DynSource<NormalizedArticle>> = Vec::new();
        if !cfg.devto.username.is_empty() {
            article_sources.push(Arc::new(DevtoProvider::new(cfg.devto.clone(), transport.clone())));
        }
        if !cfg.medium.username.is_empty() {
            article_sources.push(Arc::new(MediumProvider::new(cfg.medium.clone(), transport.clone())));
        }

        let projects = with_sources(Aggregator::new(PROJECTS_ERROR), project_sources(), cfg);
        let languages = with_sources(Aggregator::new(LANGUAGES_ERROR), project_sources(), cfg);
        let articles = with_sources(Aggregator::new(ARTICLES_ERROR), article_sources, cfg);

        tracing::info!(
            projects = ?projects.source_names(),
            articles = ?articles.source_names(),
            "feed sources wired"
        );

        Self {
            projects: PageController::mount(projects),
            articles: PageController::mount(articles),
            languages: PageController::mount(languages),
            mailer: Arc::new(ContactMailer::new(cfg.contact.clone(), transport)),
        }
    }

    /// Kick off the first load of every page in the background.
    pub fn spawn_initial_loads(&self) {
        let p = self.projects.clone();
        let a = self.articles.clone();
        let l = self.languages.clone();
        tokio::spawn(async move {
            tokio::join!(p.load(), a.load(), l.load());
        });
    }

    pub fn unmount_all(&self) {
        self.projects.unmount();
        self.articles.unmount();
        self.languages.unmount();
    }
}

fn with_sources<T: Send + 'static>(
    mut agg: Aggregator<T>,
    sources: Vec<DynSource<T>>,
    cfg: &FeedsConfig,
) -> Aggregator<T> {
    for s in sources {
        agg = agg.with_source(s);
    }
    agg.with_retry(cfg.retry_policy()).with_policy(cfg.merge_policy)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/projects", get(list_projects))
        .route("/projects/reload", post(reload_projects))
        .route("/articles", get(list_articles))
        .route("/articles/reload", post(reload_articles))
        .route("/languages", get(list_languages))
        .route("/languages/reload", post(reload_languages))
        .route("/contact", post(send_contact))
        .route("/contact/status", get(contact_status))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct ProjectsView {
    projects: Vec<NormalizedProject>,
    total: usize,
    languages: Vec<String>,
    loading: bool,
    error: Option<String>,
}

#[derive(serde::Serialize)]
struct ArticlesView {
    articles: Vec<NormalizedArticle>,
    total: usize,
    loading: bool,
    error: Option<String>,
}

#[derive(serde::Serialize)]
struct LanguagesView {
    languages: BTreeMap<String, LanguageStat>,
    loading: bool,
    error: Option<String>,
}

#[derive(serde::Serialize)]
struct ReloadOut {
    count: usize,
    error: Option<String>,
}

impl<T> From<LoadState<T>> for ReloadOut {
    fn from(s: LoadState<T>) -> Self {
        Self {
            count: s.items.len(),
            error: s.error,
        }
    }
}

fn projects_view(state: LoadState<NormalizedProject>, filter: &ProjectFilter) -> ProjectsView {
    ProjectsView {
        projects: derive_projects(&state.items, filter),
        total: state.items.len(),
        languages: unique_languages(&state.items),
        loading: state.loading,
        error: state.error,
    }
}

async fn list_projects(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> Json<ProjectsView> {
    Json(projects_view(state.projects.snapshot(), &filter))
}

async fn reload_projects(State(state): State<AppState>) -> Json<ReloadOut> {
    Json(state.projects.load().await.into())
}

async fn list_articles(
    State(state): State<AppState>,
    Query(filter): Query<ArticleFilter>,
) -> Json<ArticlesView> {
    let s = state.articles.snapshot();
    Json(ArticlesView {
        articles: derive_articles(&s.items, &filter),
        total: s.items.len(),
        loading: s.loading,
        error: s.error,
    })
}

async fn reload_articles(State(state): State<AppState>) -> Json<ReloadOut> {
    Json(state.articles.load().await.into())
}

async fn list_languages(State(state): State<AppState>) -> Json<LanguagesView> {
    let s = state.languages.snapshot();
    Json(LanguagesView {
        languages: language_stats(&s.items),
        loading: s.loading,
        error: s.error,
    })
}

async fn reload_languages(State(state): State<AppState>) -> Json<ReloadOut> {
    Json(state.languages.load().await.into())
}

#[derive(serde::Serialize)]
struct ContactOut {
    status: ContactStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn send_contact(
    State(state): State<AppState>,
    Json(msg): Json<ContactMessage>,
) -> impl IntoResponse {
    if let Err(e) = msg.validate() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ContactOut {
                status: ContactStatus::Error,
                error: Some(e.to_string()),
            }),
        );
    }
    if !state.mailer.is_configured() {
        tracing::warn!("contact form used but mail delivery is not configured");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ContactOut {
                status: ContactStatus::Error,
                error: Some("Contact form is not available".to_string()),
            }),
        );
    }
    match state.mailer.send(&msg).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ContactOut {
                status: ContactStatus::Success,
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = ?e, "contact send failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ContactOut {
                    status: ContactStatus::Error,
                    error: Some("Unable to send message".to_string()),
                }),
            )
        }
    }
}

async fn contact_status(State(state): State<AppState>) -> Json<ContactOut> {
    Json(ContactOut {
        status: state.mailer.status(),
        error: None,
    })
}
