pub mod devto;
pub mod github;
pub mod gitlab;
pub mod medium;

use serde::Deserialize;
use serde_json::Value;

use metrics::histogram;

/// Accept a JSON integer, a numeric string, or null; anything else is 0.
pub(crate) fn lenient_u64<'de, D>(d: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Non-empty, trimmed text or `None`.
pub(crate) fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub(crate) fn record_fetch_ms(t0: std::time::Instant) {
    histogram!("feeds_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
}
