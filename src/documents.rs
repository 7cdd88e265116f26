// src/documents.rs
// Pure projection of the history log into retrievable documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::types::NewsRecord;

/// Separator between title and description in embedded content.
const CONTENT_SEPARATOR: &str = " \n ";

/// Fixed-shape document metadata. Every field is recoverable from the source
/// record; absent values stay `None` and render as placeholders downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMetadata {
    /// Source article url.
    pub source: String,
    pub date: Option<DateTime<Utc>>,
    pub publisher: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub subject: String,
}

/// A record projected into retrievable content + metadata. Immutable once
/// built; rebuilt from the log on each ingestion pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Embedded text: title + separator + description (empty when absent).
    pub content: String,
    pub metadata: DocMetadata,
}

impl Document {
    pub fn from_record(record: &NewsRecord) -> Self {
        let content = format!(
            "{}{}{}",
            record.title,
            CONTENT_SEPARATOR,
            record.description.as_deref().unwrap_or_default()
        );
        Self {
            content,
            metadata: DocMetadata {
                source: record.url.clone(),
                date: record.published_at,
                publisher: record.publisher.clone(),
                title: record.title.clone(),
                description: record.description.clone(),
                subject: record.subject.clone(),
            },
        }
    }
}

/// One document per record, in log order.
pub fn build(log: &[NewsRecord]) -> Vec<Document> {
    log.iter().map(Document::from_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(description: Option<&str>) -> NewsRecord {
        NewsRecord {
            subject: "BTC".into(),
            title: "X".into(),
            description: description.map(Into::into),
            published_at: None,
            url: "u1".into(),
            publisher: None,
        }
    }

    #[test]
    fn content_joins_title_and_description() {
        let doc = Document::from_record(&record(Some("Y")));
        assert_eq!(doc.content, "X \n Y");
    }

    #[test]
    fn missing_description_still_applies_separator() {
        let doc = Document::from_record(&record(None));
        assert_eq!(doc.content, "X \n ");
        assert!(doc.metadata.description.is_none());
    }

    #[test]
    fn metadata_mirrors_the_record() {
        let doc = Document::from_record(&record(Some("Y")));
        assert_eq!(doc.metadata.source, "u1");
        assert_eq!(doc.metadata.title, "X");
        assert_eq!(doc.metadata.subject, "BTC");
        assert!(doc.metadata.publisher.is_none());
    }
}
