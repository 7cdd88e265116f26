// tests/ingest_pipeline.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use crypto_news_rag::ingest;
use crypto_news_rag::ingest::types::{NewsProvider, NewsRecord};

/// Fails for "FAIL", returns nothing for "EMPTY", one record otherwise.
struct FlakyProvider;

#[async_trait]
impl NewsProvider for FlakyProvider {
    async fn search(&self, subject: &str) -> Result<Vec<NewsRecord>> {
        match subject {
            "FAIL" => Err(anyhow!("simulated provider outage")),
            "EMPTY" => Ok(vec![]),
            _ => Ok(vec![NewsRecord {
                subject: subject.to_string(),
                title: format!("{subject} news"),
                description: Some("details".to_string()),
                published_at: None,
                url: format!("https://example.test/{subject}"),
                publisher: Some("Example".to_string()),
            }]),
        }
    }
    fn name(&self) -> &'static str {
        "FlakyProvider"
    }
}

#[tokio::test]
async fn one_failing_subject_does_not_abort_the_batch() {
    let subjects = vec!["FAIL".to_string(), "BTC".to_string()];
    let fetched = ingest::fetch_all(&FlakyProvider, &subjects).await;

    assert_eq!(fetched.len(), 1);
    let records = fetched.get("BTC").expect("surviving subject kept");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "BTC news");
}

#[tokio::test]
async fn empty_subjects_are_omitted_not_errored() {
    let subjects = vec!["EMPTY".to_string(), "ETH".to_string()];
    let fetched = ingest::fetch_all(&FlakyProvider, &subjects).await;

    assert!(!fetched.contains_key("EMPTY"));
    assert!(fetched.contains_key("ETH"));
}

#[tokio::test]
async fn all_subjects_failing_yields_an_empty_map() {
    let subjects = vec!["FAIL".to_string()];
    let fetched = ingest::fetch_all(&FlakyProvider, &subjects).await;
    assert!(fetched.is_empty());
}
