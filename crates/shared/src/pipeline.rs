use anyhow::Result;
use futures::stream::{self, StreamExt};

use crate::classify;
use crate::config::Config;
use crate::error::PipelineError;
use crate::generate::Generator;
use crate::models::{AcquisitionRequest, Post, PostMetadata, StrategyId};
use crate::normalize::{normalize, NormalizedText};
use crate::orchestrator::Orchestrator;

/// Extraction-only output: normalized text plus where it came from.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub text: NormalizedText,
    pub source_strategy: StrategyId,
    pub duration_ms: u64,
}

/// Wires the whole pipeline together:
/// classify → extract → normalize → generate.
pub struct Pipeline {
    orchestrator: Orchestrator,
    generator: Generator,
}

impl Pipeline {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::from_parts(
            Orchestrator::new(config)?,
            Generator::new(config)?,
        ))
    }

    fn from_parts(orchestrator: Orchestrator, generator: Generator) -> Self {
        Self {
            orchestrator,
            generator,
        }
    }

    /// The one operation exposed to callers: a URL in, a finished post
    /// out, or a single terminal error.
    pub async fn acquire_and_generate(&self, url: &str) -> Result<Post, PipelineError> {
        let extracted = self.extract_text(url).await?;

        let generation = self.generator.generate(&extracted.text.body).await?;

        // The provider returns free text; split its trailing hashtag
        // line with the same normalizer used on extractions.
        let post = normalize(&generation.text);

        Ok(Post {
            post_text: post.body,
            hashtags: post.hashtags,
            metadata: PostMetadata {
                model: generation.model,
                source_strategy: extracted.source_strategy,
                extraction_ms: extracted.duration_ms,
                generation_ms: generation.duration_ms,
                prompt_tokens: generation.prompt_tokens,
                completion_tokens: generation.completion_tokens,
            },
        })
    }

    /// Classify, extract and normalize without calling the generation
    /// provider.
    pub async fn extract_text(&self, url: &str) -> Result<Extracted, PipelineError> {
        let content_type = classify::classify(url)?;
        let request = AcquisitionRequest::new(url, content_type);

        let extraction = self.orchestrator.extract(&request).await?;

        Ok(Extracted {
            text: normalize(&extraction.text),
            source_strategy: extraction.source_strategy,
            duration_ms: extraction.duration_ms,
        })
    }

    /// Process several URLs concurrently. Each URL still runs its own
    /// strategy chain strictly sequentially.
    pub async fn process_urls_parallel(
        &self,
        urls: Vec<String>,
    ) -> Vec<(String, Result<Post, PipelineError>)> {
        stream::iter(urls)
            .map(|url| async move {
                let result = self.acquire_and_generate(&url).await;
                (url, result)
            })
            .buffer_unordered(2)
            .collect()
            .await
    }
}
