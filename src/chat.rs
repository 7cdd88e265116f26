// src/chat.rs
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;

const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are a crypto news assistant. Answer the user's question \
from the provided news context. If the context does not contain the answer, say you \
don't know rather than guessing.";

/// Generation collaborator: question + retrieved context in, answer text out.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn generate(&self, question: &str, context: &[String]) -> Result<String>;
}

/// OpenAI chat completions client.
pub struct OpenAiChat {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiChat {
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
            model: config.chat_model.clone(),
        }
    }
}

/// Stuff the retrieved documents ahead of the question. With no context the
/// question stands alone and the model answers ungrounded.
fn build_user_prompt(question: &str, context: &[String]) -> String {
    let mut prompt = String::new();
    if !context.is_empty() {
        prompt.push_str("Context:\n");
        for block in context {
            prompt.push_str(block);
            prompt.push_str("\n---\n");
        }
        prompt.push('\n');
    }
    prompt.push_str("Question: ");
    prompt.push_str(question);
    prompt
}

#[async_trait]
impl ChatClient for OpenAiChat {
    async fn generate(&self, question: &str, context: &[String]) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let user = build_user_prompt(question, context);
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.2,
            max_tokens: 512,
        };

        let resp = self
            .http
            .post(CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("chat http post")?;
        if !resp.status().is_success() {
            return Err(anyhow!("chat api returned {}", resp.status()));
        }
        let body: Resp = resp.json().await.context("decoding chat response")?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("chat api returned no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_stuffs_context_before_question() {
        let prompt = build_user_prompt("what moved?", &["doc one".into(), "doc two".into()]);
        assert!(prompt.starts_with("Context:\ndoc one\n---\ndoc two\n---\n"));
        assert!(prompt.ends_with("Question: what moved?"));
    }

    #[test]
    fn prompt_without_context_is_just_the_question() {
        assert_eq!(build_user_prompt("hi", &[]), "Question: hi");
    }
}
