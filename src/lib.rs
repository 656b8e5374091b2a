/*!
 * # polyglot-relay - chat translation relay
 *
 * A Rust library that watches chat conversations and replies to every
 * eligible message with its translation into a configured set of languages.
 *
 * ## Features
 *
 * - Deduplication of redelivered events within a TTL window
 * - Eligibility filtering (bots, system events, emoji-only, opt-out markers)
 * - Language detection and concurrent translation through an LLM backend:
 *   - Ollama (local LLM)
 * - Bounded retries with exponential backoff and per-call timeouts
 * - Labeled, length-bounded replies posted in the message thread
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `chat`: Inbound message and outbound reply types, reply sinks
 * - `translation`: The dispatch core:
 *   - `translation::dedup`: Deduplication cache
 *   - `translation::eligibility`: Eligibility filter
 *   - `translation::retry`: Retry/backoff executor
 *   - `translation::fanout`: Fan-out orchestrator
 *   - `translation::formatter`: Reply formatting and splitting
 *   - `translation::pipeline`: Per-message pipeline
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for generation backends:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::mock`: Deterministic generation client for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod chat;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use chat::{InboundMessage, OutboundReply, ReplySink};
pub use errors::{AppError, CallFailure, ChannelError, ProviderError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use translation::{MessagePipeline, PipelineOutcome};
