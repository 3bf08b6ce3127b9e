mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

const RATE_LIMITED_MESSAGE: &str =
    "Has alcanzado el límite de solicitudes. Por favor, espera un momento antes de volver a intentarlo.";

/// Failure reported by the text-generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Quota or resource exhaustion on the service side.
    #[error("rate limited by the generation service")]
    RateLimited,
    /// Network fault, timeout, bad status or malformed response.
    #[error("generation failed: {0}")]
    Generic(String),
}

impl GenerationError {
    /// Fixed user-facing message. `context` completes "no pude ... en este momento".
    pub fn user_message(&self, context: &str) -> String {
        match self {
            GenerationError::RateLimited => RATE_LIMITED_MESSAGE.to_string(),
            GenerationError::Generic(_) => format!(
                "Lo siento, no pude {context} en este momento. Por favor, inténtalo de nuevo."
            ),
        }
    }
}

/// Opaque text-completion service: one prompt in, one complete text out.
#[async_trait]
pub trait Generator: Send + Sync {
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
