//! Persisted vector store: one SQLite file holding document rows and their
//! embeddings, similarity search through the sqlite-vec extension.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::{Mutex, Once};

use anyhow::{Context, Result};
use tokio_rusqlite::{ffi, Connection};

use crate::documents::{DocMetadata, Document};
use crate::ingest::types::parse_timestamp;

/// Retriever-side default for top-k similarity search.
pub const DEFAULT_TOP_K: usize = 4;

pub struct SqliteDocStore {
    conn: Connection,
}

impl SqliteDocStore {
    /// Open (or create) the store file and its schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        register_sqlite_vec()?;
        let conn = Connection::open(path.as_ref())
            .await
            .with_context(|| format!("opening vector store {}", path.as_ref().display()))?;
        conn.call(|conn| {
            // Fails fast if the extension did not load.
            conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))
                ?;
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS documents (
                    id TEXT PRIMARY KEY,
                    content TEXT NOT NULL,
                    source TEXT NOT NULL,
                    date TEXT,
                    publisher TEXT,
                    title TEXT NOT NULL,
                    description TEXT,
                    subject TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS documents_embeddings (
                    id TEXT PRIMARY KEY,
                    embedding BLOB NOT NULL
                );",
            )
            ?;
            Ok::<_, tokio_rusqlite::rusqlite::Error>(())
        })
        .await
        .context("initializing vector store schema")?;
        Ok(Self { conn })
    }

    /// Upsert documents with their embeddings. Re-inserting an existing id
    /// replaces the row, so re-indexing an unchanged log is idempotent.
    pub async fn upsert(&self, rows: Vec<(String, Document, Vec<f32>)>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        // Encode parameters up front so the connection closure only does SQL.
        let mut prepared = Vec::with_capacity(rows.len());
        for (id, doc, embedding) in rows {
            let embedding_json =
                serde_json::to_string(&embedding).context("encoding embedding")?;
            prepared.push((id, doc, embedding_json));
        }

        let stored = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut stored = 0usize;
                for (id, doc, embedding_json) in prepared {
                    let m = &doc.metadata;
                    tx.execute(
                        "INSERT OR REPLACE INTO documents
                         (id, content, source, date, publisher, title, description, subject)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                        (
                            &id,
                            &doc.content,
                            &m.source,
                            m.date.map(|d| d.to_rfc3339()),
                            m.publisher.as_deref(),
                            &m.title,
                            m.description.as_deref(),
                            &m.subject,
                        ),
                    )
                    ?;
                    tx.execute(
                        "INSERT OR REPLACE INTO documents_embeddings (id, embedding)
                         VALUES (?1, vec_f32(?2))",
                        (&id, &embedding_json),
                    )
                    ?;
                    stored += 1;
                }
                tx.commit()?;
                Ok::<_, tokio_rusqlite::rusqlite::Error>(stored)
            })
            .await
            .context("storing documents in the vector index")?;
        Ok(stored)
    }

    /// Top-k cosine similarity search. Returns documents with similarity
    /// (1 - cosine distance), nearest first. An empty store yields no rows.
    pub async fn search_similar(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<(Document, f32)>> {
        let embedding_json =
            serde_json::to_string(query_embedding).context("encoding query embedding")?;

        let results = self
            .conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT d.content, d.source, d.date, d.publisher, d.title, \
                         d.description, d.subject, \
                         vec_distance_cosine(e.embedding, vec_f32(?1)) AS distance \
                         FROM documents d \
                         JOIN documents_embeddings e ON d.id = e.id \
                         ORDER BY distance ASC \
                         LIMIT {top_k}"
                    ))
                    ?;

                let rows = stmt
                    .query_map([&embedding_json], |row| {
                        let doc = Document {
                            content: row.get(0)?,
                            metadata: DocMetadata {
                                source: row.get(1)?,
                                date: row
                                    .get::<_, Option<String>>(2)?
                                    .as_deref()
                                    .and_then(parse_timestamp),
                                publisher: row.get(3)?,
                                title: row.get(4)?,
                                description: row.get(5)?,
                                subject: row.get(6)?,
                            },
                        };
                        let distance: f32 = row.get(7)?;
                        Ok((doc, 1.0 - distance))
                    })
                    ?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row?);
                }
                Ok::<_, tokio_rusqlite::rusqlite::Error>(results)
            })
            .await
            .context("searching the vector index")?;
        Ok(results)
    }

    pub async fn count(&self) -> Result<usize> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
                    ?;
                Ok::<_, tokio_rusqlite::rusqlite::Error>(count as usize)
            })
            .await
            .context("counting indexed documents")?;
        Ok(count)
    }
}

/// Register sqlite-vec as an auto extension, once per process.
fn register_sqlite_vec() -> Result<()> {
    static INIT: Once = Once::new();
    static INIT_RESULT: Mutex<Option<Result<(), String>>> = Mutex::new(None);

    INIT.call_once(|| {
        let result = unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc != 0 {
                Err(format!("failed to register sqlite-vec extension (code {rc})"))
            } else {
                Ok(())
            }
        };
        *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
    });

    INIT_RESULT
        .lock()
        .expect("init result mutex poisoned")
        .clone()
        .expect("init was called but result not set")
        .map_err(|msg| anyhow::anyhow!(msg))
}
