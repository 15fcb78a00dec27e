// tests/common/mod.rs
#![allow(dead_code)]

use std::time::Duration;

use portfolio_feeds::feeds::config::{
    ContactConfig, DevtoParams, FeedsConfig, GithubParams, GitlabParams, MediumParams, RetryConfig,
};
use portfolio_feeds::feeds::transport::FixtureTransport;
use serde_json::Value;

pub const GITHUB_URL: &str = "http://fixture.test/github/users/someone/repos";
pub const GITLAB_URL: &str = "http://fixture.test/gitlab/users/someone/projects";
pub const DEVTO_URL: &str = "http://fixture.test/devto/articles";
pub const RSS2JSON_URL: &str = "http://fixture.test/rss2json";
pub const MAIL_URL: &str = "http://fixture.test/mail/send";

pub fn fixture(name: &str) -> Value {
    let raw = match name {
        "github" => include_str!("../fixtures/github_repos.json"),
        "gitlab" => include_str!("../fixtures/gitlab_projects.json"),
        "devto" => include_str!("../fixtures/devto_articles.json"),
        "medium" => include_str!("../fixtures/medium_rss2json.json"),
        other => panic!("unknown fixture {other}"),
    };
    serde_json::from_str(raw).expect("fixture json")
}

/// Config pointing every provider at the fixture host, with fast retries.
pub fn fixture_config() -> FeedsConfig {
    FeedsConfig {
        retry: RetryConfig {
            max_retries: 3,
            initial_delay_ms: 1000,
        },
        github: GithubParams {
            base_url: "http://fixture.test/github".into(),
            username: "someone".into(),
            ..Default::default()
        },
        gitlab: GitlabParams {
            base_url: "http://fixture.test/gitlab".into(),
            username: "someone".into(),
            ..Default::default()
        },
        devto: DevtoParams {
            base_url: "http://fixture.test/devto".into(),
            username: "someone".into(),
        },
        medium: MediumParams {
            rss2json_url: RSS2JSON_URL.into(),
            username: "@someone".into(),
            ..Default::default()
        },
        contact: ContactConfig {
            endpoint: MAIL_URL.into(),
            service_id: "service_x".into(),
            template_id: "template_y".into(),
            public_key: "public_z".into(),
            to_name: "Portfolio Owner".into(),
        },
        ..Default::default()
    }
}

/// Transport answering every provider with its fixture.
pub fn healthy_transport() -> FixtureTransport {
    FixtureTransport::new()
        .with_json(GITHUB_URL, fixture("github"))
        .with_json(GITLAB_URL, fixture("gitlab"))
        .with_json(DEVTO_URL, fixture("devto"))
        .with_json(RSS2JSON_URL, fixture("medium"))
        .with_status(MAIL_URL, 200)
}

/// Total backoff for the default policy: 1s + 2s + 4s.
pub const FULL_BACKOFF: Duration = Duration::from_millis(7000);
