/*!
 * Provider implementations for text-generation backends.
 *
 * This module contains client implementations for the generation services the
 * relay can call:
 * - Ollama: Local LLM server
 * - Mock: Deterministic adapter for tests and dry runs
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably behind the generation client.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Providers that can be driven with a plain (system prompt, user prompt) pair
pub trait PromptRequest: Provider {
    /// Build a provider request for the given prompts
    fn build_request(&self, system: &str, prompt: &str) -> Self::Request;
}

pub mod mock;
pub mod ollama;
