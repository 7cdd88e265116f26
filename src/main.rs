//! Ingestion pipeline binary.
//! One shot: fetch news for every tracked asset, merge into the history log,
//! build documents, embed and store them in the vector index.

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use crypto_news_rag::config::{OpenAiConfig, PipelineConfig};
use crypto_news_rag::embeddings::OpenAiEmbedder;
use crypto_news_rag::history::HistoryStore;
use crypto_news_rag::ingest::providers::GoogleNewsProvider;
use crypto_news_rag::{documents, index, ingest};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = PipelineConfig::load()?;
    if config.assets.is_empty() {
        bail!("no tracked assets configured (create config/assets.toml with `assets = [...]`)");
    }
    let openai = OpenAiConfig::from_env()?;

    tracing::info!(assets = config.assets.len(), "1/4 fetching news");
    let provider = GoogleNewsProvider::new();
    let fetched = ingest::fetch_all(&provider, &config.assets).await;
    let batch: Vec<_> = fetched.into_values().flatten().collect();
    if batch.is_empty() {
        tracing::info!("no news found for any asset; nothing to ingest");
        return Ok(());
    }

    tracing::info!(records = batch.len(), "2/4 updating news history");
    let store = HistoryStore::new(&config.history_path);
    let log = store.update(batch).context("updating news history")?;

    tracing::info!(records = log.len(), "3/4 building documents");
    let docs = documents::build(&log);

    tracing::info!(documents = docs.len(), "4/4 embedding and storing");
    let embedder = OpenAiEmbedder::new(&openai);
    // History is already persisted; a failure past this point leaves the
    // index stale relative to history, never the other way around.
    let stored = index::index_documents(&config.index_path, &embedder, &docs)
        .await
        .context("vector index update failed; the news history was already saved and is intact")?;

    tracing::info!(
        stored,
        index = %config.index_path.display(),
        "ingestion complete"
    );
    Ok(())
}
