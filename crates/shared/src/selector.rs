use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::FailureReason;
use crate::models::StrategyId;
use crate::scratch::ScratchFactory;
use crate::strategy::Strategy;

/// Container selectors tried in priority order; first non-empty match wins.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "div.post-content",
    "section.blog-body",
    "div.article-body",
    "div.entry-content",
    "main",
];

const MIN_CONTENT_LEN: usize = 100;

/// Metadata harvested from the page head, best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleMeta {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published: Option<String>,
}

/// Plain HTTP fetch plus CSS-selector matching. Cheap and fast, but
/// loses to client-rendered pages and anti-bot walls.
pub struct SelectorScrape {
    client: Client,
}

impl SelectorScrape {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; GeneratePost/1.0)")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Strategy for SelectorScrape {
    fn id(&self) -> StrategyId {
        StrategyId::SelectorScrape
    }

    async fn run(&self, url: &str, _scratch: &ScratchFactory) -> Result<String, FailureReason> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FailureReason::ServiceError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureReason::ServiceError(format!("HTTP {}", status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FailureReason::ServiceError(e.to_string()))?;

        let body = extract_content(&html).ok_or(FailureReason::NoContentFound)?;
        let meta = extract_meta(&html);

        match meta.title {
            Some(title) => Ok(format!("{}\n\n{}", title, body)),
            None => Ok(body),
        }
    }
}

/// Try each content selector in order and return the text of the first
/// container with enough substance.
pub fn extract_content(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for raw in CONTENT_SELECTORS {
        let selector = match Selector::parse(raw) {
            Ok(s) => s,
            Err(_) => continue,
        };

        if let Some(element) = document.select(&selector).next() {
            let text = html2text::from_read(element.html().as_bytes(), 100);
            if text.trim().len() >= MIN_CONTENT_LEN {
                return Some(text);
            }
        }
    }

    None
}

/// Separate metadata probes; absence of any of them is fine.
pub fn extract_meta(html: &str) -> ArticleMeta {
    let document = Html::parse_document(html);

    let probe_attr = |selector: &str| -> Option<String> {
        let parsed = Selector::parse(selector).ok()?;
        document
            .select(&parsed)
            .next()
            .and_then(|e| e.value().attr("content"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    let title = probe_attr(r#"meta[property="og:title"]"#).or_else(|| {
        let parsed = Selector::parse("title").ok()?;
        document
            .select(&parsed)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    });

    ArticleMeta {
        title,
        author: probe_attr(r#"meta[name="author"]"#),
        published: probe_attr(r#"meta[property="article:published_time"]"#),
    }
}
