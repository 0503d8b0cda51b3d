// Error types for the acquisition pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{AttemptOutcome, StrategyAttempt};

/// Why a single strategy gave up. Local to one attempt; the chain
/// advances past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Transcript provider returned nothing for this video
    NoTranscript,

    /// The URL is not a recognizable video URL
    InvalidVideoUrl,

    /// No content selector matched the fetched page
    NoContentFound,

    /// An external provider returned an error or an empty payload
    ServiceError(String),

    /// Browser render did not reach a stable page in time
    RenderTimeout,

    /// Media download sub-process failed
    DownloadFailed(String),

    /// Could not acquire or read a scoped temp resource
    ResourceError(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTranscript => write!(f, "no transcript available for this video"),
            Self::InvalidVideoUrl => write!(f, "could not derive a video id from the URL"),
            Self::NoContentFound => write!(f, "no content selector matched the page"),
            Self::ServiceError(msg) => write!(f, "service error: {}", msg),
            Self::RenderTimeout => write!(f, "browser render timed out"),
            Self::DownloadFailed(msg) => write!(f, "media download failed: {}", msg),
            Self::ResourceError(msg) => write!(f, "temp resource error: {}", msg),
        }
    }
}

/// Terminal pipeline errors, the only ones the caller ever sees.
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// The input is not a well-formed absolute http(s) URL. Not retried.
    InvalidUrl(String),

    /// Every strategy in the chain failed; carries the full attempt log.
    ExtractionFailed(Vec<StrategyAttempt>),

    /// Both the primary and the fallback generation model failed.
    GenerationFailed(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(msg) => write!(f, "invalid URL: {}", msg),
            Self::ExtractionFailed(attempts) => {
                write!(f, "all {} extraction strategies failed:", attempts.len())?;
                for attempt in attempts {
                    match &attempt.outcome {
                        AttemptOutcome::Failure(reason) => write!(
                            f,
                            "\n  {} ({} ms): {}",
                            attempt.strategy, attempt.duration_ms, reason
                        )?,
                        AttemptOutcome::TimedOut => write!(
                            f,
                            "\n  {} ({} ms): timed out after {} ms",
                            attempt.strategy, attempt.duration_ms, attempt.timeout_ms
                        )?,
                        AttemptOutcome::Success => write!(
                            f,
                            "\n  {} ({} ms): succeeded",
                            attempt.strategy, attempt.duration_ms
                        )?,
                    }
                }
                Ok(())
            }
            Self::GenerationFailed(msg) => write!(f, "generation failed: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}
