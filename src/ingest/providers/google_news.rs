// src/ingest/providers/google_news.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::normalize_text;
use crate::ingest::types::{parse_timestamp, NewsProvider, NewsRecord};

const DEFAULT_BASE_URL: &str = "https://news.google.com";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    // A query with no hits returns a channel without <item> elements.
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    source: Option<Source>,
}

#[derive(Debug, Deserialize)]
struct Source {
    #[serde(rename = "$text")]
    name: Option<String>,
}

/// Google News RSS search provider. One HTTP request per subject query.
pub struct GoogleNewsProvider {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleNewsProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Base URL override, used by HTTP-mock tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("crypto-news-rag/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn parse_feed(subject: &str, xml: &str) -> Result<Vec<NewsRecord>> {
        let rss: Rss = from_str(xml).context("parsing google news rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            let url = match it.link {
                Some(link) if !link.trim().is_empty() => link.trim().to_string(),
                _ => continue, // url is identity-bearing; an item without one is unusable
            };
            if title.is_empty() {
                continue;
            }

            let description = it
                .description
                .as_deref()
                .map(normalize_text)
                .filter(|d| !d.is_empty());
            let publisher = it
                .source
                .and_then(|s| s.name)
                .map(|n| normalize_text(&n))
                .filter(|n| !n.is_empty());

            out.push(NewsRecord {
                subject: subject.to_string(),
                title,
                description,
                // fixed provider format is RFC 2822; drift coerces to None
                published_at: it.pub_date.as_deref().and_then(parse_timestamp),
                url,
                publisher,
            });
        }
        Ok(out)
    }
}

impl Default for GoogleNewsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsProvider for GoogleNewsProvider {
    async fn search(&self, subject: &str) -> Result<Vec<NewsRecord>> {
        let url = format!("{}/rss/search", self.base_url);
        let body = self
            .http
            .get(&url)
            .query(&[
                ("q", subject),
                ("hl", "en-US"),
                ("gl", "US"),
                ("ceid", "US:en"),
            ])
            .send()
            .await
            .context("google news http get()")?
            .error_for_status()
            .context("google news http status")?
            .text()
            .await
            .context("google news http .text()")?;

        Self::parse_feed(subject, &body)
    }

    fn name(&self) -> &'static str {
        "GoogleNews"
    }
}
