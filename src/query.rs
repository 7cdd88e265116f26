//! Query engine: embed the question, retrieve the most similar indexed
//! documents, and generate a grounded answer with citations.

use anyhow::{anyhow, Context, Result};

use crate::chat::ChatClient;
use crate::documents::Document;
use crate::embeddings::Embedder;
use crate::store::{SqliteDocStore, DEFAULT_TOP_K};

/// Sentinel token ending the query loop (case-insensitive exact match).
pub const EXIT_COMMAND: &str = "quit";

pub fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

/// Generated answer plus its supporting documents, in retriever rank order.
#[derive(Debug)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<Document>,
}

pub struct QueryEngine {
    store: SqliteDocStore,
    embedder: Box<dyn Embedder>,
    chat: Box<dyn ChatClient>,
}

impl QueryEngine {
    pub fn new(store: SqliteDocStore, embedder: Box<dyn Embedder>, chat: Box<dyn ChatClient>) -> Self {
        Self {
            store,
            embedder,
            chat,
        }
    }

    /// Answer one free-text question. Each question is independent: no
    /// conversation memory carries across calls.
    ///
    /// An empty index is not an error — generation runs with no grounding
    /// context and the source list comes back empty. Collaborator failures
    /// propagate.
    pub async fn answer(&self, question: &str) -> Result<QueryResult> {
        let mut vectors = self
            .embedder
            .embed(&[question.to_string()])
            .await
            .context("embedding question")?;
        let query_embedding = match vectors.pop() {
            Some(v) if vectors.is_empty() => v,
            _ => return Err(anyhow!("embedder returned an unexpected vector count")),
        };

        let ranked = self
            .store
            .search_similar(&query_embedding, DEFAULT_TOP_K)
            .await?;
        let sources: Vec<Document> = ranked.into_iter().map(|(doc, _)| doc).collect();

        let context: Vec<String> = sources.iter().map(|doc| doc.content.clone()).collect();
        let answer = self
            .chat
            .generate(question, &context)
            .await
            .context("generating answer")?;

        Ok(QueryResult { answer, sources })
    }
}

/// Numbered source list for the query surface: index, url, subject, title,
/// publisher, date. Absent fields render as "-".
pub fn render_sources(sources: &[Document]) -> String {
    let mut out = String::new();
    for (i, doc) in sources.iter().enumerate() {
        let m = &doc.metadata;
        let date = m
            .date
            .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("[{}] {}\n", i + 1, m.source));
        out.push_str(&format!(
            " {} -> Title: {}  Publisher: {}\n",
            m.subject,
            m.title,
            m.publisher.as_deref().unwrap_or("-")
        ));
        out.push_str(&format!(" Date: {date}\n---\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::DocMetadata;
    use chrono::{TimeZone, Utc};

    #[test]
    fn exit_command_matches_case_insensitively() {
        assert!(is_exit_command("quit"));
        assert!(is_exit_command("QUIT"));
        assert!(is_exit_command("  Quit  "));
        assert!(!is_exit_command("quit now"));
        assert!(!is_exit_command("exit"));
    }

    #[test]
    fn sources_render_numbered_with_placeholders() {
        let docs = vec![
            Document {
                content: "t1 \n d1".into(),
                metadata: DocMetadata {
                    source: "https://example.test/1".into(),
                    date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                    publisher: Some("Example".into()),
                    title: "t1".into(),
                    description: Some("d1".into()),
                    subject: "BTC".into(),
                },
            },
            Document {
                content: "t2 \n ".into(),
                metadata: DocMetadata {
                    source: "https://example.test/2".into(),
                    date: None,
                    publisher: None,
                    title: "t2".into(),
                    description: None,
                    subject: "ETH".into(),
                },
            },
        ];
        let out = render_sources(&docs);
        assert!(out.contains("[1] https://example.test/1"));
        assert!(out.contains("BTC -> Title: t1  Publisher: Example"));
        assert!(out.contains("Date: 2024-01-01 00:00:00 UTC"));
        assert!(out.contains("[2] https://example.test/2"));
        assert!(out.contains("Publisher: -"));
        assert!(out.contains("Date: -"));
    }
}
