/*!
 * Translation dispatch core.
 *
 * This module turns inbound chat messages into translated replies. It is
 * split into several submodules:
 *
 * - `dedup`: TTL cache of processed message keys
 * - `eligibility`: Filter deciding which messages are translated
 * - `client`: Generation client boundary (detect, translate)
 * - `retry`: Retry/backoff executor with per-call timeout
 * - `fanout`: Concurrent translation into every target language
 * - `formatter`: Reply rendering and length-bounded splitting
 * - `pipeline`: Per-message orchestration and error boundary
 * - `stats`: Pull-based health counters
 */

// Re-export main types for easier usage
pub use self::client::{GenerationClient, LlmGenerationClient};
pub use self::dedup::{CacheStats, DedupCache};
pub use self::eligibility::{Eligibility, EligibilityFilter, RejectReason};
pub use self::fanout::{Batch, FanOutOrchestrator, TranslationOutcome};
pub use self::formatter::ReplyFormatter;
pub use self::pipeline::{MessagePipeline, PipelineOutcome};
pub use self::retry::{RetryExecutor, RetryOutcome};
pub use self::stats::StatsSnapshot;

// Submodules
pub mod client;
pub mod dedup;
pub mod eligibility;
pub mod fanout;
pub mod formatter;
pub mod pipeline;
pub mod retry;
pub mod stats;
