// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One normalized news item for a tracked asset.
///
/// Dedup identity is the full field tuple: two records collapse only when
/// every field matches after normalization, not just `url`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, Hash)]
pub struct NewsRecord {
    pub subject: String, // tracked asset query, e.g. "Bitcoin"
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Publication time; an unparseable provider date becomes `None`, never an error.
    #[serde(default, deserialize_with = "de_published_at")]
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
    #[serde(default)]
    pub publisher: Option<String>,
}

/// Permissive timestamp field: accepts RFC 3339 (our own output) or RFC 2822
/// (provider-native), anything else coerces to `None`.
fn de_published_at<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Parse a provider or history timestamp, yielding `None` on drift.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    /// Fetch the latest items for one subject query.
    async fn search(&self, subject: &str) -> Result<Vec<NewsRecord>>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc2822_and_rfc3339() {
        let a = parse_timestamp("Tue, 06 Aug 2024 12:34:56 GMT").unwrap();
        let b = parse_timestamp("2024-08-06T12:34:56Z").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn drifted_dates_become_none() {
        assert!(parse_timestamp("yesterday-ish").is_none());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("  ").is_none());
    }
}
