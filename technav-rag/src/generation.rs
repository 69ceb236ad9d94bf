//! Generative model trait for turning an assembled prompt into an answer.

use async_trait::async_trait;

use crate::error::Result;

/// A hosted language model reached over the network.
///
/// Treated as a function from prompt text to completion text. Model identity,
/// temperature and similar knobs belong to the implementation's configuration.
///
/// Implementations classify their failures: a missing or rejected credential
/// is [`RagError::Configuration`](crate::RagError::Configuration), a network
/// failure is [`RagError::Transient`](crate::RagError::Transient), anything
/// else is [`RagError::Generation`](crate::RagError::Generation).
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Produce a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model name used in errors and logs.
    fn name(&self) -> &str;
}
