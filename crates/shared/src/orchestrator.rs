use anyhow::Result;
use chrono::Utc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::browser::BrowserRender;
use crate::config::Config;
use crate::error::PipelineError;
use crate::models::{
    AcquisitionRequest, AttemptOutcome, ContentType, ExtractionResult, StrategyAttempt,
};
use crate::scrape::ScrapeService;
use crate::scratch::ScratchFactory;
use crate::selector::SelectorScrape;
use crate::strategy::Strategy;
use crate::transcribe::AudioTranscribe;
use crate::transcript::TranscriptFetch;

/// Runs the ordered strategy chain for a request: strictly sequential,
/// bounded per attempt, short-circuiting on the first success.
///
/// The chains are data built once in `new`; cheaper and more reliable
/// techniques come first because the later entries spawn processes or
/// render full pages.
pub struct Orchestrator {
    video_chain: Vec<Box<dyn Strategy>>,
    article_chain: Vec<Box<dyn Strategy>>,
    attempt_timeout: Duration,
    scratch: ScratchFactory,
}

impl Orchestrator {
    pub fn new(config: &Config) -> Result<Self> {
        let video_chain: Vec<Box<dyn Strategy>> = vec![
            Box::new(TranscriptFetch::new()?),
            Box::new(AudioTranscribe::new(config)?),
        ];
        let article_chain: Vec<Box<dyn Strategy>> = vec![
            Box::new(ScrapeService::new(config)?),
            Box::new(SelectorScrape::new()?),
            Box::new(BrowserRender::plain()),
            Box::new(BrowserRender::stealth()),
        ];

        Ok(Self::from_parts(
            video_chain,
            article_chain,
            Duration::from_secs(config.attempt_timeout_secs),
        ))
    }

    /// Build an orchestrator from explicit chains. The chain order is
    /// the fallback order.
    pub fn from_parts(
        video_chain: Vec<Box<dyn Strategy>>,
        article_chain: Vec<Box<dyn Strategy>>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            video_chain,
            article_chain,
            attempt_timeout,
            scratch: ScratchFactory::new("generate-post"),
        }
    }

    fn chain_for(&self, content_type: ContentType) -> &[Box<dyn Strategy>] {
        match content_type {
            ContentType::Video => &self.video_chain,
            ContentType::Article => &self.article_chain,
        }
    }

    /// Execute the chain for the request's content type. Returns the
    /// first successful extraction, or the full attempt log once every
    /// strategy has failed.
    pub async fn extract(
        &self,
        request: &AcquisitionRequest,
    ) -> Result<ExtractionResult, PipelineError> {
        let chain = self.chain_for(request.content_type);
        let timeout_ms = self.attempt_timeout.as_millis() as u64;
        let mut attempts = Vec::with_capacity(chain.len());
        let overall = Instant::now();

        for strategy in chain {
            let started_at = Utc::now();
            let attempt_start = Instant::now();

            // One attempt in flight at a time; a timeout drops the
            // future, which releases any scoped resources it held.
            let outcome = timeout(
                self.attempt_timeout,
                strategy.run(&request.url, &self.scratch),
            )
            .await;
            let duration_ms = attempt_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(Ok(text)) => {
                    return Ok(ExtractionResult {
                        text,
                        source_strategy: strategy.id(),
                        duration_ms: overall.elapsed().as_millis() as u64,
                    });
                }
                Ok(Err(reason)) => {
                    eprintln!("  ✗ {} failed: {}", strategy.id(), reason);
                    attempts.push(StrategyAttempt {
                        strategy: strategy.id(),
                        started_at,
                        timeout_ms,
                        duration_ms,
                        outcome: AttemptOutcome::Failure(reason),
                    });
                }
                Err(_) => {
                    eprintln!(
                        "  ✗ {} timed out after {} ms",
                        strategy.id(),
                        timeout_ms
                    );
                    attempts.push(StrategyAttempt {
                        strategy: strategy.id(),
                        started_at,
                        timeout_ms,
                        duration_ms,
                        outcome: AttemptOutcome::TimedOut,
                    });
                }
            }
        }

        Err(PipelineError::ExtractionFailed(attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureReason;
    use crate::models::StrategyId;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Scripted strategy for chain tests: fixed result, optional delay,
    /// call counter.
    struct Scripted {
        id: StrategyId,
        result: Result<String, FailureReason>,
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn ok(id: StrategyId, text: &str, calls: &Arc<AtomicUsize>) -> Box<dyn Strategy> {
            Box::new(Self {
                id,
                result: Ok(text.to_string()),
                delay: Duration::ZERO,
                calls: Arc::clone(calls),
            })
        }

        fn failing(
            id: StrategyId,
            reason: FailureReason,
            calls: &Arc<AtomicUsize>,
        ) -> Box<dyn Strategy> {
            Box::new(Self {
                id,
                result: Err(reason),
                delay: Duration::ZERO,
                calls: Arc::clone(calls),
            })
        }

        fn slow(id: StrategyId, delay: Duration, calls: &Arc<AtomicUsize>) -> Box<dyn Strategy> {
            Box::new(Self {
                id,
                result: Ok("too late".to_string()),
                delay,
                calls: Arc::clone(calls),
            })
        }
    }

    #[async_trait]
    impl Strategy for Scripted {
        fn id(&self) -> StrategyId {
            self.id
        }

        async fn run(
            &self,
            _url: &str,
            _scratch: &ScratchFactory,
        ) -> Result<String, FailureReason> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        }
    }

    fn article_request() -> AcquisitionRequest {
        AcquisitionRequest::new("https://example.com/post", ContentType::Article)
    }

    fn orchestrator(chain: Vec<Box<dyn Strategy>>) -> Orchestrator {
        Orchestrator::from_parts(Vec::new(), chain, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn first_success_short_circuits_the_chain() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let orch = orchestrator(vec![
            Scripted::ok(StrategyId::ScrapeService, "article text", &first),
            Scripted::ok(StrategyId::SelectorScrape, "never seen", &second),
        ]);

        let result = orch.extract(&article_request()).await.unwrap();
        assert_eq!(result.text, "article text");
        assert_eq!(result.source_strategy, StrategyId::ScrapeService);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failure_advances_to_the_next_strategy() {
        let calls = Arc::new(AtomicUsize::new(0));

        let orch = orchestrator(vec![
            Scripted::failing(StrategyId::ScrapeService, FailureReason::NoContentFound, &calls),
            Scripted::ok(StrategyId::SelectorScrape, "recovered", &calls),
        ]);

        let result = orch.extract(&article_request()).await.unwrap();
        assert_eq!(result.source_strategy, StrategyId::SelectorScrape);
        assert_eq!(result.text, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_chain_reports_every_attempt_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));

        let orch = orchestrator(vec![
            Scripted::failing(StrategyId::ScrapeService, FailureReason::NoContentFound, &calls),
            Scripted::failing(StrategyId::SelectorScrape, FailureReason::NoContentFound, &calls),
            Scripted::failing(StrategyId::BrowserRenderA, FailureReason::NoContentFound, &calls),
            Scripted::failing(StrategyId::BrowserRenderB, FailureReason::RenderTimeout, &calls),
        ]);

        let err = orch.extract(&article_request()).await.unwrap_err();
        match err {
            PipelineError::ExtractionFailed(attempts) => {
                assert_eq!(attempts.len(), 4);
                let order: Vec<StrategyId> = attempts.iter().map(|a| a.strategy).collect();
                assert_eq!(
                    order,
                    vec![
                        StrategyId::ScrapeService,
                        StrategyId::SelectorScrape,
                        StrategyId::BrowserRenderA,
                        StrategyId::BrowserRenderB,
                    ]
                );
                assert_eq!(
                    attempts[3].outcome,
                    AttemptOutcome::Failure(FailureReason::RenderTimeout)
                );
            }
            other => panic!("expected ExtractionFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn timed_out_attempt_is_recorded_and_does_not_block_the_chain() {
        let slow_calls = Arc::new(AtomicUsize::new(0));
        let fast_calls = Arc::new(AtomicUsize::new(0));

        let orch = orchestrator(vec![
            Scripted::slow(StrategyId::ScrapeService, Duration::from_secs(10), &slow_calls),
            Scripted::ok(StrategyId::SelectorScrape, "fast path", &fast_calls),
        ]);

        let result = orch.extract(&article_request()).await.unwrap();
        assert_eq!(result.source_strategy, StrategyId::SelectorScrape);
        assert_eq!(slow_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fast_calls.load(Ordering::SeqCst), 1);
    }

    /// Strategy that acquires a scoped file, writes to it, then hangs.
    struct HangingAcquirer {
        acquired: Arc<Mutex<Option<std::path::PathBuf>>>,
    }

    #[async_trait]
    impl Strategy for HangingAcquirer {
        fn id(&self) -> StrategyId {
            StrategyId::AudioTranscribe
        }

        async fn run(&self, _url: &str, scratch: &ScratchFactory) -> Result<String, FailureReason> {
            let file = scratch.acquire("mp3")?;
            std::fs::write(file.path(), b"partial download").unwrap();
            *self.acquired.lock().unwrap() = Some(file.path().to_path_buf());
            // Hang until the per-attempt timeout drops this future,
            // and the guard with it.
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok("unreachable".to_string())
        }
    }

    #[tokio::test]
    async fn timeout_cancellation_still_releases_scoped_files() {
        let acquired = Arc::new(Mutex::new(None));
        let orch = Orchestrator::from_parts(
            vec![Box::new(HangingAcquirer {
                acquired: Arc::clone(&acquired),
            })],
            Vec::new(),
            Duration::from_millis(100),
        );

        let request = AcquisitionRequest::new(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            ContentType::Video,
        );
        let err = orch.extract(&request).await.unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailed(ref a) if a.len() == 1));

        let path = acquired.lock().unwrap().clone().expect("strategy acquired a file");
        assert!(!path.exists(), "scoped file must be gone after timeout");
    }
}
