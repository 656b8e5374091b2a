/*!
 * Fan-out of one message to all target languages.
 *
 * Every target gets its own retried, time-bounded translate call; all calls
 * run concurrently and the batch waits for every one of them to settle.
 * Failures are recorded per target and never abort the batch.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::client::GenerationClient;
use super::retry::RetryExecutor;
use crate::errors::CallFailure;
use crate::language_utils::language_codes_match;

/// Result of translating one message into one target language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    /// Target language code
    pub target_language: String,

    /// Translated text, empty on failure
    pub text: String,

    /// Whether a usable translation was produced
    pub succeeded: bool,

    /// Why the translation failed
    pub error_detail: Option<String>,

    /// Attempts spent on this target
    pub attempts: u32,
}

impl TranslationOutcome {
    pub fn success(target_language: &str, text: String, attempts: u32) -> Self {
        Self {
            target_language: target_language.to_string(),
            text,
            succeeded: true,
            error_detail: None,
            attempts,
        }
    }

    pub fn failure(target_language: &str, error_detail: String, attempts: u32) -> Self {
        Self {
            target_language: target_language.to_string(),
            text: String::new(),
            succeeded: false,
            error_detail: Some(error_detail),
            attempts,
        }
    }
}

/// All outcomes for one message, in the caller's target order
#[derive(Debug, Clone)]
pub struct Batch {
    /// Detected source language
    pub source_language: String,

    /// One outcome per target language
    pub outcomes: Vec<TranslationOutcome>,

    /// Wall time from first dispatch until the last call settled
    pub elapsed: Duration,
}

impl Batch {
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.succeeded).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.succeeded_count()
    }

    pub fn target_languages(&self) -> Vec<&str> {
        self.outcomes.iter().map(|outcome| outcome.target_language.as_str()).collect()
    }
}

/// Dispatches one translate call per target language and collects every outcome
pub struct FanOutOrchestrator {
    client: Arc<dyn GenerationClient>,
    executor: RetryExecutor,
}

impl FanOutOrchestrator {
    pub fn new(client: Arc<dyn GenerationClient>, executor: RetryExecutor) -> Self {
        Self { client, executor }
    }

    /// Targets left after dropping every language matching `source_language`
    pub fn effective_targets(source_language: &str, targets: &[String]) -> Vec<String> {
        targets
            .iter()
            .filter(|target| {
                !(target.eq_ignore_ascii_case(source_language) || language_codes_match(target, source_language))
            })
            .cloned()
            .collect()
    }

    /// Translate `text` into every target except the source language.
    ///
    /// Returns `None` when no target remains after self-filtering.
    pub async fn translate_all(&self, text: &str, source_language: &str, targets: &[String]) -> Option<Batch> {
        let targets = Self::effective_targets(source_language, targets);
        if targets.is_empty() {
            debug!("No target language besides source {}, nothing to translate", source_language);
            return None;
        }

        let start_time = Instant::now();
        let concurrency = targets.len();

        let mut results = stream::iter(targets.into_iter().enumerate())
            .map(|(index, target)| async move {
                (index, self.translate_one(text, source_language, &target).await)
            })
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>()
            .await;

        // Restore the caller's order regardless of completion order
        results.sort_by_key(|(index, _)| *index);

        let batch = Batch {
            source_language: source_language.to_string(),
            outcomes: results.into_iter().map(|(_, outcome)| outcome).collect(),
            elapsed: start_time.elapsed(),
        };

        debug!(
            "Batch {} -> [{}] settled in {:?}: {} succeeded, {} failed",
            source_language,
            batch.target_languages().join(", "),
            batch.elapsed,
            batch.succeeded_count(),
            batch.failed_count()
        );

        Some(batch)
    }

    async fn translate_one(&self, text: &str, source_language: &str, target_language: &str) -> TranslationOutcome {
        let outcome = self
            .executor
            .run(|_| async move {
                let translated = self
                    .client
                    .translate(text, target_language, Some(source_language))
                    .await?;
                classify_translation(text, translated)
            })
            .await;

        match outcome.result {
            Ok(translated) => TranslationOutcome::success(target_language, translated, outcome.attempts),
            Err(failure) => {
                warn!(
                    "Translation {} -> {} failed after {} attempt(s): {}",
                    source_language, target_language, outcome.attempts, failure
                );
                TranslationOutcome::failure(target_language, failure.to_string(), outcome.attempts)
            }
        }
    }
}

/// Reject empty translations and translations that merely echo the input
pub fn classify_translation(input: &str, translated: String) -> Result<String, CallFailure> {
    let trimmed = translated.trim();
    if trimmed.is_empty() {
        return Err(CallFailure::Soft("empty translation".to_string()));
    }
    if trimmed == input.trim() {
        return Err(CallFailure::Soft("translation echoed the input".to_string()));
    }
    Ok(trimmed.to_string())
}
