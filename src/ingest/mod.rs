// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::collections::BTreeMap;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::ingest::types::{NewsProvider, NewsRecord};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("fetch_records_total", "Records fetched from the provider.");
        describe_counter!(
            "fetch_subject_errors_total",
            "Per-subject provider fetch/parse errors."
        );
        describe_counter!(
            "fetch_subjects_empty_total",
            "Subjects that yielded zero records."
        );
        describe_gauge!("fetch_last_run_ts", "Unix ts when the last fetch ran.");
    });
}

/// Normalize provider text: decode HTML entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Fetch news for every subject, one at a time, in the supplied order.
///
/// A single subject's failure never aborts the batch: the error is logged,
/// counted, and the remaining subjects proceed. Subjects that yield zero
/// records are omitted from the result.
pub async fn fetch_all(
    provider: &dyn NewsProvider,
    subjects: &[String],
) -> BTreeMap<String, Vec<NewsRecord>> {
    ensure_metrics_described();

    let mut fetched = BTreeMap::new();
    for subject in subjects {
        match provider.search(subject).await {
            Ok(records) if records.is_empty() => {
                tracing::debug!(subject = %subject, "no records for subject");
                counter!("fetch_subjects_empty_total").increment(1);
            }
            Ok(records) => {
                tracing::info!(
                    subject = %subject,
                    count = records.len(),
                    "downloaded news for subject"
                );
                counter!("fetch_records_total").increment(records.len() as u64);
                fetched.insert(subject.clone(), records);
            }
            Err(e) => {
                tracing::warn!(error = ?e, subject = %subject, provider = provider.name(), "subject fetch failed");
                counter!("fetch_subject_errors_total").increment(1);
            }
        }
    }

    gauge!("fetch_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
    fetched
}
