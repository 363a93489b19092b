use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Text-generation collaborator boundary.
///
/// The evaluation core never talks to a model service directly; upstream
/// generation constructs one client per run and passes it in. The only
/// retry policy in the system lives here: rate-limit errors back off
/// exponentially, everything else propagates to the caller.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message { role: Role::User, content: content.into() }
    }
}

/// One completed generation with its token accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    /// The service refused the request for quota reasons; retryable.
    #[error("rate limited by generation service")]
    RateLimited,
    /// Anything else: transport failure, bad credentials, model error.
    /// Terminal for the request.
    #[error("generation failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, conversation: &[Message]) -> Result<Generation, GenerateError>;
}

/// Wraps any generator with the rate-limit retry policy: the wait starts at
/// one second and doubles without bound, while each individual sleep is
/// capped at `max_wait` (60s by default). Attempts are uncapped.
pub struct BackoffGenerator<G> {
    inner: G,
    max_wait: Duration,
}

impl<G> BackoffGenerator<G> {
    pub fn new(inner: G) -> Self {
        BackoffGenerator { inner, max_wait: Duration::from_secs(60) }
    }

    pub fn with_max_wait(inner: G, max_wait: Duration) -> Self {
        BackoffGenerator { inner, max_wait }
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for BackoffGenerator<G> {
    async fn generate(&self, conversation: &[Message]) -> Result<Generation, GenerateError> {
        let mut wait = Duration::from_secs(1);
        loop {
            match self.inner.generate(conversation).await {
                Err(GenerateError::RateLimited) => {
                    tokio::time::sleep(wait.min(self.max_wait)).await;
                    wait *= 2;
                }
                other => return other,
            }
        }
    }
}
