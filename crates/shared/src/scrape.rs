use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::config::Config;
use crate::error::FailureReason;
use crate::models::StrategyId;
use crate::scratch::ScratchFactory;
use crate::strategy::Strategy;

const SCRAPE_API_URL: &str = "https://app.scrapingbee.com/api/v1/";

// Anything shorter is boilerplate (cookie banners, error pages), not an article.
const MIN_CONTENT_LEN: usize = 100;

/// Delegates extraction to the managed scraping provider, which runs
/// its own proxies and anti-bot handling.
pub struct ScrapeService {
    client: Client,
    api_key: Option<String>,
}

impl ScrapeService {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: config.scrape_api_key.clone(),
        })
    }
}

#[async_trait]
impl Strategy for ScrapeService {
    fn id(&self) -> StrategyId {
        StrategyId::ScrapeService
    }

    async fn run(&self, url: &str, _scratch: &ScratchFactory) -> Result<String, FailureReason> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| {
                FailureReason::ServiceError("SCRAPINGBEE_API_KEY not configured".to_string())
            })?;

        let request_url = format!(
            "{}?api_key={}&url={}&render_js=false",
            SCRAPE_API_URL,
            api_key,
            urlencoding::encode(url)
        );

        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(|e| FailureReason::ServiceError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(FailureReason::ServiceError(format!(
                "scrape service returned {}: {}",
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FailureReason::ServiceError(e.to_string()))?;

        let text = html2text::from_read(html.as_bytes(), 100);
        if text.trim().len() < MIN_CONTENT_LEN {
            return Err(FailureReason::ServiceError(
                "scrape service returned an empty payload".to_string(),
            ));
        }

        Ok(text)
    }
}
