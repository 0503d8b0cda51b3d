use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FailureReason;

/// Kind of content behind a URL, decided by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    Article,
    Video,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Article => write!(f, "article"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// One incoming extraction job. Immutable for its lifetime.
#[derive(Debug, Clone)]
pub struct AcquisitionRequest {
    pub url: String,
    pub content_type: ContentType,
}

impl AcquisitionRequest {
    pub fn new(url: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            url: url.into(),
            content_type,
        }
    }
}

/// Identifier for one extraction technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyId {
    TranscriptApi,
    AudioTranscribe,
    ScrapeService,
    SelectorScrape,
    BrowserRenderA,
    BrowserRenderB,
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TranscriptApi => write!(f, "transcript-api"),
            Self::AudioTranscribe => write!(f, "audio-transcribe"),
            Self::ScrapeService => write!(f, "scrape-service"),
            Self::SelectorScrape => write!(f, "selector-scrape"),
            Self::BrowserRenderA => write!(f, "browser-render-a"),
            Self::BrowserRenderB => write!(f, "browser-render-b"),
        }
    }
}

/// How a single strategy attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    Success,
    Failure(FailureReason),
    TimedOut,
}

/// Record of one strategy invocation, kept for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: StrategyId,
    pub started_at: DateTime<Utc>,
    pub timeout_ms: u64,
    pub duration_ms: u64,
    pub outcome: AttemptOutcome,
}

/// Terminal output of the extraction orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    pub source_strategy: StrategyId,
    pub duration_ms: u64,
}

/// Provider and timing details attached to a generated post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMetadata {
    pub model: String,
    pub source_strategy: StrategyId,
    pub extraction_ms: u64,
    pub generation_ms: u64,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

/// Final product of the pipeline: a post body plus its hashtags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub post_text: String,
    pub hashtags: Vec<String>,
    pub metadata: PostMetadata,
}
