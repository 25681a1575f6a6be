//! Caller-side policy around the agent: retry a conversation whose answer
//! could not be read as recommendations, then fall back to the raw text.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::agent::Agent;
use crate::errors::{ChatError, ChatResult};
use crate::location::LocationContext;
use crate::recommendation::{extract_recommendations, Answer};

/// Configuration for retrying malformed answers.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,

    /// Base backoff delay in milliseconds.
    pub base_backoff_ms: u64,

    /// Maximum backoff delay in seconds.
    pub max_backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff_ms: 500,
            max_backoff_secs: 5,
        }
    }
}

/// Calculate exponential backoff delay.
///
/// Formula: `min(base * 2^(attempt - 1), max_backoff)`, with `attempt` starting at 1.
#[must_use]
pub fn exponential_backoff(attempt: u32, base_backoff_ms: u64, max_backoff_secs: u64) -> Duration {
    let max_ms = max_backoff_secs.saturating_mul(1000);

    // Cap the exponent to avoid overflow.
    let capped_attempt = attempt.saturating_sub(1).min(20);
    let base_delay = base_backoff_ms.saturating_mul(1u64 << capped_attempt);

    Duration::from_millis(base_delay.min(max_ms))
}

pub struct Concierge {
    agent: Agent,
    retry: RetryConfig,
}

impl Concierge {
    pub fn new(agent: Agent, retry: RetryConfig) -> Self {
        Self { agent, retry }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Answer a prompt for a user at `location`.
    ///
    /// Conversations whose final text is not a recommendation array are rerun
    /// from scratch up to `max_retries` times; after that the last text is
    /// returned as is. Errors from the conversation itself are not retried.
    pub async fn answer(
        &self,
        prompt: &str,
        location: LocationContext,
        cancel: CancellationToken,
    ) -> ChatResult<Answer> {
        let mut attempt = 0u32;

        loop {
            let reply = self
                .agent
                .respond(prompt, location, cancel.clone())
                .await?;

            match extract_recommendations(&reply.content) {
                Ok(records) => return Ok(Answer::Recommendations(records)),
                Err(error) => {
                    attempt += 1;

                    if attempt > self.retry.max_retries {
                        warn!(
                            attempt,
                            max = self.retry.max_retries,
                            error = error.to_string(),
                            "Answer is not a recommendation list, returning text."
                        );
                        return Ok(Answer::Text(reply.content));
                    }

                    let delay = exponential_backoff(
                        attempt,
                        self.retry.base_backoff_ms,
                        self.retry.max_backoff_secs,
                    );
                    debug!(
                        attempt,
                        max = self.retry.max_retries,
                        delay_ms = delay.as_millis(),
                        error = error.to_string(),
                        "Malformed answer, retrying."
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => return Err(ChatError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Message;
    use crate::providers::mock::MockProvider;
    use crate::recommendation::RecommendationRecord;
    use crate::sources::{ForecastSource, RestaurantSource, Venue};
    use crate::tools::ToolRegistry;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct Clear;

    #[async_trait]
    impl ForecastSource for Clear {
        async fn overview(&self) -> Result<String> {
            Ok("Clear skies".to_string())
        }
    }

    struct Nothing;

    #[async_trait]
    impl RestaurantSource for Nothing {
        async fn search(&self, _location: LocationContext, _count: u32) -> Result<Vec<Venue>> {
            Ok(vec![])
        }
    }

    type Seen = Arc<Mutex<Vec<Vec<Message>>>>;

    fn concierge(responses: Vec<Message>, max_retries: u32) -> (Concierge, Seen) {
        let provider = MockProvider::new(responses);
        let seen = provider.seen();
        let registry = ToolRegistry::with_builtins(Arc::new(Clear), Arc::new(Nothing), 10).unwrap();
        let agent = Agent::new(Box::new(provider), registry);
        let retry = RetryConfig {
            max_retries,
            base_backoff_ms: 1,
            max_backoff_secs: 1,
        };
        (Concierge::new(agent, retry), seen)
    }

    fn tokyo() -> LocationContext {
        LocationContext::new(Some(35.681), Some(139.767)).unwrap()
    }

    #[test]
    fn test_exponential_backoff() {
        assert_eq!(exponential_backoff(1, 500, 5), Duration::from_millis(500));
        assert_eq!(exponential_backoff(2, 500, 5), Duration::from_millis(1000));
        assert_eq!(exponential_backoff(3, 500, 5), Duration::from_millis(2000));
        assert_eq!(exponential_backoff(5, 500, 5), Duration::from_secs(5));
        assert_eq!(exponential_backoff(100, 500, 5), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_recommendations_first_try() -> ChatResult<()> {
        let (concierge, seen) = concierge(
            vec![Message::assistant()
                .with_text(r#"[{"name":"Sushi Taro","genre":"和食","budget":"3500円"}]"#)],
            2,
        );

        let answer = concierge
            .answer("Dinner?", tokyo(), CancellationToken::new())
            .await?;

        match answer {
            Answer::Recommendations(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].name, "Sushi Taro");
            }
            other => panic!("expected recommendations, got {:?}", other),
        }
        assert_eq!(seen.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_answer_is_retried() -> ChatResult<()> {
        let (concierge, seen) = concierge(
            vec![
                Message::assistant().with_text("Here are some ideas!"),
                Message::assistant().with_text(r#"[{"name":"Ramen Jiro","genre":"ラーメン"}]"#),
            ],
            2,
        );

        let answer = concierge
            .answer("Dinner?", tokyo(), CancellationToken::new())
            .await?;

        assert_eq!(
            answer,
            Answer::Recommendations(vec![RecommendationRecord {
                name: "Ramen Jiro".to_string(),
                genre: "ラーメン".to_string(),
                budget: None,
                time: None,
                photo: None,
            }])
        );

        // The retry starts over from the system and user messages
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_falls_back_to_text_after_retries() -> ChatResult<()> {
        let (concierge, seen) = concierge(
            vec![
                Message::assistant().with_text("Sorry, no results."),
                Message::assistant().with_text("Still nothing."),
                Message::assistant().with_text("Try another area."),
            ],
            2,
        );

        let answer = concierge
            .answer("Dinner?", tokyo(), CancellationToken::new())
            .await?;

        assert_eq!(answer, Answer::Text("Try another area.".to_string()));
        assert_eq!(seen.lock().unwrap().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_loop_errors_are_not_retried() {
        let (concierge, seen) = concierge(vec![], 2);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = concierge.answer("Dinner?", tokyo(), cancel).await.unwrap_err();

        assert!(matches!(err, ChatError::Cancelled));
        assert!(seen.lock().unwrap().is_empty());
    }
}
