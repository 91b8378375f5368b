//! Completion provider trait for turning a prompt into an answer.

use async_trait::async_trait;

use crate::error::Result;

/// A hosted language model that completes a single text prompt.
///
/// Implementations report every failure (auth, quota, network, timeout) as
/// [`QaError::CompletionProvider`](crate::QaError::CompletionProvider). No
/// retries are performed at this layer.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Name of the provider, used in logs and error messages.
    fn name(&self) -> &str;

    /// Complete `prompt` and return the raw model output.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
