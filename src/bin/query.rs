//! Interactive question loop over the persisted news index.
//! One question per line; a case-insensitive `quit` ends the loop.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crypto_news_rag::chat::OpenAiChat;
use crypto_news_rag::config::{OpenAiConfig, PipelineConfig};
use crypto_news_rag::embeddings::OpenAiEmbedder;
use crypto_news_rag::query::{is_exit_command, render_sources, QueryEngine, EXIT_COMMAND};
use crypto_news_rag::store::SqliteDocStore;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = PipelineConfig::load()?;
    let openai = OpenAiConfig::from_env()?;

    // An absent index is an empty one: opening creates the schema and every
    // search comes back with zero documents.
    if let Some(dir) = config.index_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating index dir {}", dir.display()))?;
        }
    }
    let store = SqliteDocStore::open(&config.index_path).await?;
    let engine = QueryEngine::new(
        store,
        Box::new(OpenAiEmbedder::new(&openai)),
        Box::new(OpenAiChat::new(&openai)),
    );

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        write!(
            stdout,
            "\nAsk about your tracked assets (type '{EXIT_COMMAND}' to exit)\n> "
        )?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF ends the loop like the sentinel
        }
        if is_exit_command(&line) {
            println!("Exiting!");
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        // A failed question is reported and the loop continues.
        match engine.answer(question).await {
            Ok(result) => {
                println!("\nAnswer:\n\n{}", result.answer);
                println!("\nSources:\n{}", render_sources(&result.sources));
            }
            Err(e) => eprintln!("question failed: {e:#}"),
        }
    }
    Ok(())
}
