use async_trait::async_trait;
use std::time::Duration;

/// Pause inserted between receiving an utterance and replying
///
/// Purely a UX affordance: implementations must not influence the reply.
/// Test harnesses use a zero-duration implementation.
#[async_trait]
pub trait ThinkingDelay: Send + Sync + 'static {
    /// Duration of the next pause
    fn next_delay(&self) -> Duration;

    /// Sleep for `next_delay()`
    async fn pause(&self);
}
