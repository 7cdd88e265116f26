// src/index.rs
// Indexer: embed documents via the external collaborator and persist them.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use sha2::{Digest, Sha256};

use crate::documents::Document;
use crate::embeddings::Embedder;
use crate::store::SqliteDocStore;

/// Deterministic store id: SHA-256 over every source field, so re-ingesting
/// an unchanged log upserts the same rows instead of growing the index.
pub fn document_id(doc: &Document) -> String {
    let m = &doc.metadata;
    let mut hasher = Sha256::new();
    for field in [
        Some(m.subject.as_str()),
        Some(m.title.as_str()),
        m.description.as_deref(),
        m.publisher.as_deref(),
        Some(m.source.as_str()),
    ] {
        // presence byte keeps None distinct from Some("")
        match field {
            Some(value) => {
                hasher.update([1]);
                hasher.update(value.as_bytes());
            }
            None => hasher.update([0]),
        }
        hasher.update([0]);
    }
    match m.date {
        Some(date) => {
            hasher.update([1]);
            hasher.update(date.to_rfc3339().as_bytes());
        }
        None => hasher.update([0]),
    }

    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Embed all documents and upsert them at `store_path`, creating the target
/// location if absent. Returns how many documents were stored this run.
pub async fn index_documents(
    store_path: &Path,
    embedder: &dyn Embedder,
    documents: &[Document],
) -> Result<usize> {
    if let Some(dir) = store_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating index dir {}", dir.display()))?;
        }
    }
    let store = SqliteDocStore::open(store_path).await?;
    if documents.is_empty() {
        return Ok(0);
    }

    let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
    let vectors = embedder
        .embed(&texts)
        .await
        .context("computing document embeddings")?;
    ensure!(
        vectors.len() == documents.len(),
        "embedder returned {} vectors for {} documents",
        vectors.len(),
        documents.len()
    );

    let rows = documents
        .iter()
        .cloned()
        .zip(vectors)
        .map(|(doc, vector)| (document_id(&doc), doc, vector))
        .collect();
    store.upsert(rows).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::NewsRecord;

    fn doc(title: &str, description: Option<&str>) -> Document {
        Document::from_record(&NewsRecord {
            subject: "BTC".into(),
            title: title.into(),
            description: description.map(Into::into),
            published_at: None,
            url: "u1".into(),
            publisher: None,
        })
    }

    #[test]
    fn identical_documents_share_an_id() {
        assert_eq!(document_id(&doc("a", Some("x"))), document_id(&doc("a", Some("x"))));
    }

    #[test]
    fn any_field_change_changes_the_id() {
        let base = document_id(&doc("a", Some("x")));
        assert_ne!(base, document_id(&doc("b", Some("x"))));
        assert_ne!(base, document_id(&doc("a", Some("y"))));
        assert_ne!(base, document_id(&doc("a", None)));
    }

    #[test]
    fn none_and_empty_description_differ() {
        assert_ne!(document_id(&doc("a", None)), document_id(&doc("a", Some(""))));
    }
}
