/*!
 * Error types for the polyglot-relay application.
 *
 * This module contains custom error types for the different layers of the
 * relay, using the thiserror crate for ergonomic error definitions.
 */

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Why a single generation call did not produce a usable result.
///
/// Soft failures are well-formed but unusable answers and are never retried.
/// Hard failures and timeouts are transient and eligible for retry.
#[derive(Error, Debug)]
pub enum CallFailure {
    /// The backend answered, but the answer cannot be used
    #[error("unusable result: {0}")]
    Soft(String),

    /// The backend call itself failed
    #[error("{0}")]
    Hard(#[from] ProviderError),

    /// The call did not settle within the per-call timeout
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
}

impl CallFailure {
    /// Whether another attempt may be made after this failure
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Soft(_))
    }
}

/// Errors raised at the chat platform boundary
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The reply sink refused or failed to deliver a reply
    #[error("Reply delivery failed: {0}")]
    DeliveryFailed(String),

    /// An inbound event could not be decoded into a message
    #[error("Malformed inbound event: {0}")]
    MalformedEvent(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the chat platform boundary
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
