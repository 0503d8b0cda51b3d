use async_trait::async_trait;

use crate::error::FailureReason;
use crate::models::StrategyId;
use crate::scratch::ScratchFactory;

/// One concrete technique for extracting text from a URL.
///
/// Every technique implements the same capability so the orchestrator
/// can iterate a chain without knowing what is behind each entry.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn id(&self) -> StrategyId;

    /// Attempt an extraction. Failures are data, not hard errors; the
    /// orchestrator records them and moves on to the next strategy.
    async fn run(&self, url: &str, scratch: &ScratchFactory) -> Result<String, FailureReason>;
}
