//! Web page fetching.
//!
//! Wraps a [`reqwest::Client`] with the configured timeout and user agent,
//! fetches a URL, and hands the body to [`crate::extract`] for structured
//! text extraction. Fetching is the only failing step in the scrape path;
//! extraction itself always produces best-effort output.

use anyhow::{Context, Result};
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::extract;
use crate::models::ScrapedPage;

pub struct Scraper {
    client: reqwest::Client,
}

impl Scraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// Fetch a page and extract its structured content.
    ///
    /// Captures the `Last-Modified` response header, falling back to `Date`
    /// when the server omits it.
    pub async fn scrape(&self, url: &str) -> Result<ScrapedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL {}", url))?;

        let response = response
            .error_for_status()
            .with_context(|| format!("Failed to fetch URL {}", url))?;

        let last_modified = header_value(&response, "last-modified")
            .or_else(|| header_value(&response, "date"));

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))?;

        let extracted = extract::extract(&body);

        Ok(ScrapedPage {
            title: extracted.title,
            url: url.to_string(),
            description: extracted.description,
            last_modified,
            content: extracted.content,
        })
    }
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}
