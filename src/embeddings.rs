// src/embeddings.rs
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;

const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Inputs per request; the API accepts arrays, so a run embeds in few calls.
const EMBED_BATCH: usize = 64;

/// Embedding collaborator. Used identically at index time and query time;
/// vectors are only comparable when they come from the same model.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// OpenAI embeddings API client. Requires an api key in the config.
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(config: &OpenAiConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("crypto-news-rag/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: config.api_key.clone(),
            model: config.embed_model.clone(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            input: &'a [String],
        }
        #[derive(Deserialize)]
        struct Resp {
            data: Vec<Item>,
        }
        #[derive(Deserialize)]
        struct Item {
            index: usize,
            embedding: Vec<f32>,
        }

        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH) {
            let req = Req {
                model: &self.model,
                input: batch,
            };
            let resp = self
                .http
                .post(EMBEDDINGS_URL)
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .context("embeddings http post")?;
            if !resp.status().is_success() {
                return Err(anyhow!("embeddings api returned {}", resp.status()));
            }
            let mut body: Resp = resp.json().await.context("decoding embeddings response")?;
            if body.data.len() != batch.len() {
                return Err(anyhow!(
                    "embeddings api returned {} vectors for {} inputs",
                    body.data.len(),
                    batch.len()
                ));
            }
            body.data.sort_by_key(|item| item.index);
            out.extend(body.data.into_iter().map(|item| item.embedding));
        }
        Ok(out)
    }
}
