use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;

use crate::classify;
use crate::error::FailureReason;
use crate::models::StrategyId;
use crate::scratch::ScratchFactory;
use crate::strategy::Strategy;

const TIMEDTEXT_URL: &str = "https://video.google.com/timedtext";

/// Direct caption fetch from the transcript provider. Cheapest video
/// strategy: one HTTP request, no media download.
pub struct TranscriptFetch {
    client: Client,
}

impl TranscriptFetch {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Strategy for TranscriptFetch {
    fn id(&self) -> StrategyId {
        StrategyId::TranscriptApi
    }

    async fn run(&self, url: &str, _scratch: &ScratchFactory) -> Result<String, FailureReason> {
        let video_id = classify::video_id(url).ok_or(FailureReason::InvalidVideoUrl)?;

        let response = self
            .client
            .get(timedtext_url(&video_id))
            .send()
            .await
            .map_err(|e| FailureReason::ServiceError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureReason::ServiceError(format!(
                "transcript provider returned {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FailureReason::ServiceError(e.to_string()))?;

        if body.trim().is_empty() {
            return Err(FailureReason::NoTranscript);
        }

        let fragments = parse_caption_xml(&body);
        if fragments.is_empty() {
            return Err(FailureReason::NoTranscript);
        }

        Ok(join_fragments(&fragments))
    }
}

/// Caption endpoint URL for a video id. Ids are already URL-safe
/// (alphanumerics, `-` and `_`), so no percent-encoding is needed.
fn timedtext_url(video_id: &str) -> String {
    format!("{}?lang=en&v={}", TIMEDTEXT_URL, video_id)
}

/// Pull the text content out of every `<text>` element in a timedtext
/// caption document, entity-decoded and whitespace-trimmed.
fn parse_caption_xml(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut fragments = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"text" => in_text = true,
            Ok(Event::End(e)) if e.name().as_ref() == b"text" => in_text = false,
            Ok(Event::Text(t)) if in_text => {
                if let Ok(decoded) = t.unescape() {
                    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !collapsed.is_empty() {
                        fragments.push(collapsed);
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    fragments
}

fn join_fragments(fragments: &[String]) -> String {
    fragments.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_url_carries_language_and_video_id() {
        assert_eq!(
            timedtext_url("dQw4w9WgXcQ"),
            "https://video.google.com/timedtext?lang=en&v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn fragments_join_with_single_spaces() {
        let fragments = vec![
            "Hello".to_string(),
            "world".to_string(),
            "today".to_string(),
        ];
        assert_eq!(join_fragments(&fragments), "Hello world today");
    }

    #[test]
    fn caption_xml_parses_into_ordered_fragments() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<transcript>
  <text start="0.0" dur="1.2">Hello</text>
  <text start="1.2" dur="0.8">world</text>
  <text start="2.0" dur="1.0">today</text>
</transcript>"#;

        let fragments = parse_caption_xml(xml);
        assert_eq!(fragments, vec!["Hello", "world", "today"]);
        assert_eq!(join_fragments(&fragments), "Hello world today");
    }

    #[test]
    fn caption_entities_are_decoded() {
        let xml = r#"<transcript><text start="0" dur="1">Tom &amp; Jerry</text></transcript>"#;
        assert_eq!(parse_caption_xml(xml), vec!["Tom & Jerry"]);
    }

    #[test]
    fn empty_caption_document_yields_no_fragments() {
        assert!(parse_caption_xml("<transcript></transcript>").is_empty());
        assert!(parse_caption_xml("").is_empty());
    }
}
