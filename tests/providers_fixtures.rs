// tests/providers_fixtures.rs
//
// Each adapter against its recorded provider payload, served by FixtureTransport.

mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::*;
use portfolio_feeds::feeds::providers::{
    devto::DevtoProvider, github::GithubProvider, gitlab::GitlabProvider, medium::MediumProvider,
};
use portfolio_feeds::feeds::transport::{FixtureTransport, RecordedRequest};
use portfolio_feeds::{ArticleOrigin, ProjectOrigin, SourceProvider};

fn query_of(t: &FixtureTransport, idx: usize) -> Vec<(String, String)> {
    match &t.requests()[idx] {
        RecordedRequest::Get { query, .. } => query.clone(),
        other => panic!("expected GET, got {other:?}"),
    }
}

#[tokio::test]
async fn github_fixture_maps_all_repos() {
    let cfg = fixture_config();
    let t = Arc::new(healthy_transport());
    let p = GithubProvider::new(cfg.github, t.clone());

    let items = p.fetch_latest().await.expect("github ok");
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.origin == ProjectOrigin::Github));

    let lexer = &items[0];
    assert_eq!(lexer.name, "tiny-lexer");
    assert_eq!(lexer.stars, 10);
    assert_eq!(lexer.forks, 3);
    assert_eq!(lexer.language.as_deref(), Some("Rust"));
    assert_eq!(
        lexer.created_at,
        Utc.with_ymd_and_hms(2022, 1, 10, 8, 0, 0).unwrap()
    );

    assert_eq!(items[1].display_description(), "No description available");
    assert_eq!(items[2].display_language(), "N/A");

    let q = query_of(&t, 0);
    assert!(q.contains(&("type".into(), "owner".into())));
    assert!(q.contains(&("per_page".into(), "100".into())));
}

#[tokio::test]
async fn gitlab_fixture_defaults_missing_counts() {
    let cfg = fixture_config();
    let t = Arc::new(healthy_transport());
    let p = GitlabProvider::new(cfg.gitlab, t);

    let items = p.fetch_latest().await.expect("gitlab ok");
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.origin == ProjectOrigin::Gitlab));
    assert_eq!(items[0].stars, 5);
    assert_eq!(items[0].url, "https://gitlab.com/someone/distro-installer");
    assert_eq!(
        items[0].updated_at,
        Utc.with_ymd_and_hms(2024, 5, 5, 5, 5, 5).unwrap()
    );
    assert_eq!(items[1].stars, 0);
    assert_eq!(items[1].forks, 0);
    assert_eq!(items[1].description, None);
}

#[tokio::test]
async fn devto_fixture_prefixes_ids_and_sends_username() {
    let cfg = fixture_config();
    let t = Arc::new(healthy_transport());
    let p = DevtoProvider::new(cfg.devto, t.clone());

    let items = p.fetch_latest().await.expect("devto ok");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, "devto-1501");
    assert_eq!(items[0].reading_time_minutes, 6);
    assert_eq!(items[0].tags, vec!["rust", "tutorial"]);
    assert!(items.iter().all(|a| a.origin == ArticleOrigin::Devto));
    assert_eq!(query_of(&t, 0), vec![("username".into(), "someone".into())]);
}

#[tokio::test]
async fn medium_fixture_derives_reading_time_and_excerpt() {
    let cfg = fixture_config();
    let t = Arc::new(healthy_transport());
    let p = MediumProvider::new(cfg.medium, t.clone());

    let items = p.fetch_latest().await.expect("medium ok");
    assert_eq!(items.len(), 2);

    let first = &items[0];
    assert_eq!(first.id, "medium-0");
    assert_eq!(first.reading_time_minutes, 2);
    assert!(first.description.ends_with("..."));
    assert!(!first.description.contains('<'));
    assert_eq!(
        first.published_at,
        Utc.with_ymd_and_hms(2024, 4, 10, 9, 0, 0).unwrap()
    );

    let second = &items[1];
    assert_eq!(second.id, "medium-1");
    assert_eq!(second.description, "Notes from a & switch");
    assert_eq!(second.reading_time_minutes, 1);
    assert!(second.tags.is_empty());

    assert_eq!(
        query_of(&t, 0),
        vec![(
            "rss_url".into(),
            "https://medium.com/feed/@someone".into()
        )]
    );
}

#[tokio::test]
async fn provider_http_error_fails_the_fetch() {
    let cfg = fixture_config();
    let t = Arc::new(FixtureTransport::new().with_status(GITHUB_URL, 500));
    let p = GithubProvider::new(cfg.github, t);
    let err = p.fetch_latest().await.unwrap_err();
    assert!(format!("{err:#}").contains("500"));
}
