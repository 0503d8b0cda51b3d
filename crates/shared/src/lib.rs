// Public modules
pub mod browser;
pub mod classify;
pub mod config;
pub mod error;
pub mod generate;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod pipeline;
pub mod scrape;
pub mod scratch;
pub mod selector;
pub mod strategy;
pub mod transcribe;
pub mod transcript;

// Re-export commonly used types
pub use classify::{classify, video_id};
pub use config::Config;
pub use error::{FailureReason, PipelineError};
pub use models::{
    AcquisitionRequest, AttemptOutcome, ContentType, ExtractionResult, Post, PostMetadata,
    StrategyAttempt, StrategyId,
};
pub use normalize::{normalize, NormalizedText};
pub use orchestrator::Orchestrator;
pub use pipeline::{Extracted, Pipeline};
pub use strategy::Strategy;
