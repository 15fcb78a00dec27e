//! One-shot probe: run a single aggregation cycle against the live providers
//! and print the derived lists (stdout/log only).

use std::sync::Arc;

use portfolio_feeds::derive::{derive_articles, derive_projects, ArticleFilter, ProjectFilter};
use portfolio_feeds::feeds::config::FeedsConfig;
use portfolio_feeds::feeds::transport::HttpTransport;
use portfolio_feeds::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = FeedsConfig::load_default()?;
    let transport = Arc::new(HttpTransport::new(&cfg.user_agent, cfg.timeout())?);
    let state = AppState::from_config(&cfg, transport);

    let (projects, articles) = tokio::join!(state.projects.load(), state.articles.load());

    if let Some(e) = &projects.error {
        println!("projects: {e}");
    }
    for p in derive_projects(&projects.items, &ProjectFilter::default()) {
        println!(
            "[{}] {} ({}) stars={} forks={}",
            p.origin.as_str(),
            p.name,
            p.display_language(),
            p.stars,
            p.forks
        );
    }

    if let Some(e) = &articles.error {
        println!("articles: {e}");
    }
    for a in derive_articles(&articles.items, &ArticleFilter::default()) {
        println!(
            "[{}] {} ({} min, {})",
            a.origin.as_str(),
            a.title,
            a.reading_time_minutes,
            a.published_at.format("%Y-%m-%d")
        );
    }

    state.unmount_all();
    println!("feeds-probe done");
    Ok(())
}
