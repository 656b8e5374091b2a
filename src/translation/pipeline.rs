/*!
 * Per-message translation pipeline.
 *
 * One inbound event runs through: dedup check, eligibility filter, key claim,
 * language detection, fan-out to the target languages, reply formatting and
 * posting. `handle_event` is the outermost boundary of a unit of work; errors
 * and panics below it abandon the message without touching other messages.
 */

use anyhow::{Context, Result};
use futures::FutureExt;
use log::{debug, error, info, warn};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::client::GenerationClient;
use super::dedup::DedupCache;
use super::eligibility::{EligibilityFilter, RejectReason};
use super::fanout::FanOutOrchestrator;
use super::formatter::ReplyFormatter;
use super::retry::RetryExecutor;
use super::stats::{PipelineStats, StatsSnapshot};
use crate::app_config::Config;
use crate::chat::{InboundMessage, OutboundReply, ReplySink};
use crate::errors::CallFailure;
use crate::language_utils::DetectedLanguage;

/// What happened to one inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Kept out by the filter or the dedup claim
    Skipped(RejectReason),

    /// Language detection soft-failed or ran out of attempts
    DetectionFailed(String),

    /// Every target equals the source language
    NoTargets { source_language: String },

    /// Reply posted in `parts` parts
    Replied {
        source_language: String,
        parts: usize,
        succeeded: usize,
        failed: usize,
    },

    /// Unexpected error or panic; the message was dropped
    Abandoned(String),
}

/// The dispatch core wired to a generation client and a reply sink
pub struct MessagePipeline {
    dedup: DedupCache,
    filter: EligibilityFilter,
    client: Arc<dyn GenerationClient>,
    detector: RetryExecutor,
    orchestrator: FanOutOrchestrator,
    formatter: ReplyFormatter,
    sink: Arc<dyn ReplySink>,
    target_languages: Vec<String>,
    thread_replies: bool,
    stats: PipelineStats,
}

impl MessagePipeline {
    /// Build a pipeline from configuration.
    ///
    /// Detection and translation calls share one in-flight limit of
    /// `dispatch.max_in_flight_calls`.
    pub fn from_config(
        config: &Config,
        dedup: DedupCache,
        client: Arc<dyn GenerationClient>,
        sink: Arc<dyn ReplySink>,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(config.dispatch.max_in_flight_calls));
        let executor = RetryExecutor::from_config(&config.dispatch).with_limiter(limiter);

        Self {
            dedup,
            filter: EligibilityFilter::from_config(&config.filter),
            client: client.clone(),
            detector: executor.clone(),
            orchestrator: FanOutOrchestrator::new(client, executor),
            formatter: ReplyFormatter::from_config(&config.reply),
            sink,
            target_languages: config.target_languages.clone(),
            thread_replies: config.reply.thread_replies,
            stats: PipelineStats::new(),
        }
    }

    /// The shared deduplication cache
    pub fn dedup(&self) -> &DedupCache {
        &self.dedup
    }

    pub fn target_languages(&self) -> &[String] {
        &self.target_languages
    }

    /// Current health counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.dedup.stats())
    }

    /// Handle one inbound event to completion. Never fails and never panics.
    pub async fn handle_event(&self, message: InboundMessage) -> PipelineOutcome {
        self.stats.record_received();

        let detail = match AssertUnwindSafe(self.process(&message)).catch_unwind().await {
            Ok(Ok(outcome)) => return outcome,
            Ok(Err(e)) => format!("{:#}", e),
            Err(panic) => format!("panic: {}", panic_message(panic.as_ref())),
        };

        error!(
            "Abandoned message {} in {} from {}: {}",
            message.message_id, message.conversation_id, message.author_id, detail
        );
        self.stats.record_abandoned();
        PipelineOutcome::Abandoned(detail)
    }

    async fn process(&self, message: &InboundMessage) -> Result<PipelineOutcome> {
        let key = message.dedup_key();

        let verdict = self.filter.evaluate(message, self.dedup.is_processed(&key));
        if let Some(reason) = verdict.reason() {
            debug!("Skipping {}: {}", key, reason);
            self.stats.record_skipped();
            return Ok(PipelineOutcome::Skipped(reason));
        }

        // Claim the key before the first suspension point
        if !self.dedup.try_mark_processed(key.clone()) {
            debug!("Skipping {}: claimed by a concurrent delivery", key);
            self.stats.record_skipped();
            return Ok(PipelineOutcome::Skipped(RejectReason::AlreadyProcessed));
        }

        let text = message.text.trim();

        let source_language = match self.detect(text).await {
            Ok(code) => code,
            Err(failure) => {
                warn!("Language detection failed for {}: {}", key, failure);
                self.stats.record_skipped();
                return Ok(PipelineOutcome::DetectionFailed(failure.to_string()));
            }
        };

        let Some(batch) = self
            .orchestrator
            .translate_all(text, &source_language, &self.target_languages)
            .await
        else {
            debug!("Skipping {}: source {} is the only target", key, source_language);
            self.stats.record_skipped();
            return Ok(PipelineOutcome::NoTargets { source_language });
        };
        self.stats.record_batch(&batch);

        let parts = self.formatter.format(&batch);
        let thread_id = self.thread_replies.then(|| message.message_id.clone());

        for (index, part) in parts.iter().enumerate() {
            self.sink
                .post(OutboundReply {
                    conversation_id: message.conversation_id.clone(),
                    text: part.clone(),
                    thread_id: thread_id.clone(),
                })
                .await
                .with_context(|| format!("posting reply part {} of {} for {}", index + 1, parts.len(), key))?;
            self.stats.record_reply_posted();
        }

        info!(
            "Replied to {} from {}: {} succeeded, {} failed, {} part(s) after {:?}",
            key,
            source_language,
            batch.succeeded_count(),
            batch.failed_count(),
            parts.len(),
            batch.elapsed
        );

        Ok(PipelineOutcome::Replied {
            succeeded: batch.succeeded_count(),
            failed: batch.failed_count(),
            parts: parts.len(),
            source_language,
        })
    }

    /// Detect the source language under the retry policy; undetermined is a soft failure
    async fn detect(&self, text: &str) -> Result<String, CallFailure> {
        self.detector
            .run(|_| async move {
                match self.client.detect_language(text).await? {
                    DetectedLanguage::Code(code) => Ok(code),
                    DetectedLanguage::Undetermined => {
                        Err(CallFailure::Soft("source language undetermined".to_string()))
                    }
                }
            })
            .await
            .result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
