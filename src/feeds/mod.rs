// src/feeds/mod.rs
pub mod config;
pub mod providers;
pub mod transport;
pub mod types;

use chrono::{DateTime, NaiveDateTime, Utc};
use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

pub const WORDS_PER_MINUTE: usize = 200;
pub const EXCERPT_CHARS: usize = 150;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "feeds_fetch_attempts_total",
            "Upstream listing requests issued, retries included."
        );
        describe_counter!(
            "feeds_fetch_failures_total",
            "Upstream listing requests that failed."
        );
        describe_counter!(
            "feeds_aggregation_cycles_total",
            "Aggregation cycles started."
        );
        describe_counter!(
            "feeds_aggregation_failures_total",
            "Aggregation cycles that ended with an error."
        );
        describe_histogram!(
            "feeds_fetch_ms",
            "Provider fetch + normalize time in milliseconds."
        );
    });
}

/// Normalize text: decode entities, strip markup, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Plain-text preview of raw (possibly HTML) content, capped at `EXCERPT_CHARS`.
pub fn excerpt(content: &str) -> String {
    let text = normalize_text(content);
    if text.chars().count() <= EXCERPT_CHARS {
        return text;
    }
    let cut: String = text.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Estimated reading time: words / 200, rounded up, never below one minute.
pub fn reading_time_minutes(content: &str) -> u32 {
    let words = normalize_text(content).split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Parse the timestamp shapes the providers emit:
/// RFC 3339 (GitHub/GitLab/dev.to), `YYYY-MM-DD HH:MM:SS` in UTC (rss2json),
/// RFC 2822 (raw RSS).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Like `parse_timestamp`, falling back to the Unix epoch so a bad date
/// sorts last instead of failing the whole listing.
pub(crate) fn timestamp_or_epoch(raw: Option<&str>, provider: &'static str) -> DateTime<Utc> {
    match raw.and_then(parse_timestamp) {
        Some(dt) => dt,
        None => {
            tracing::debug!(provider, raw = ?raw, "unparseable timestamp, using epoch");
            DateTime::<Utc>::default()
        }
    }
}
