/*!
 * Mock generation client for testing.
 *
 * This module provides a deterministic `GenerationClient` that simulates
 * different backend behaviors:
 * - `MockGenerationClient::working()` - Always succeeds with tagged text
 * - `MockGenerationClient::fail_times(n)` - Fails n times per language, then succeeds
 * - `MockGenerationClient::failing()` - Always fails with an error
 *
 * Behaviors can be overridden per target language, and every call is counted.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::language_utils::DetectedLanguage;
use crate::translation::client::GenerationClient;

/// Behavior mode for translate calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Always succeeds with `[<target>] <text>`
    Working,
    /// Always fails with an API error
    Failing,
    /// Fails the first `times` calls for a language, then works
    FailTimes { times: usize },
    /// Returns the input unchanged
    Echo,
    /// Returns an empty response
    Empty,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
    /// Panics inside the call
    Panic,
}

/// Behavior mode for detect calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockDetection {
    /// Answer with this language code
    Language(String),
    /// Answer that the language cannot be determined
    Undetermined,
    /// Fail with a connection error
    Failing,
}

/// Mock generation client with call counters shared between clones
#[derive(Debug, Clone)]
pub struct MockGenerationClient {
    /// Default translate behavior
    behavior: MockBehavior,
    /// Per-target overrides
    language_behaviors: HashMap<String, MockBehavior>,
    /// Detect behavior
    detection: MockDetection,
    translate_calls: Arc<AtomicUsize>,
    detect_calls: Arc<AtomicUsize>,
    calls_per_language: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockGenerationClient {
    /// Create a mock detecting English with the given translate behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            language_behaviors: HashMap::new(),
            detection: MockDetection::Language("en".to_string()),
            translate_calls: Arc::new(AtomicUsize::new(0)),
            detect_calls: Arc::new(AtomicUsize::new(0)),
            calls_per_language: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn fail_times(times: usize) -> Self {
        Self::new(MockBehavior::FailTimes { times })
    }

    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Override the translate behavior for one target language
    pub fn with_language_behavior(mut self, target_language: &str, behavior: MockBehavior) -> Self {
        self.language_behaviors.insert(target_language.to_string(), behavior);
        self
    }

    /// Set the detect behavior
    pub fn with_detection(mut self, detection: MockDetection) -> Self {
        self.detection = detection;
        self
    }

    /// Detect every text as `code`
    pub fn detecting(self, code: &str) -> Self {
        self.with_detection(MockDetection::Language(code.to_string()))
    }

    /// Total translate calls across clones
    pub fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }

    /// Total detect calls across clones
    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    /// Translate calls made for `target_language`
    pub fn calls_for(&self, target_language: &str) -> usize {
        self.calls_per_language
            .lock()
            .get(target_language)
            .copied()
            .unwrap_or(0)
    }

    fn behavior_for(&self, target_language: &str) -> MockBehavior {
        self.language_behaviors
            .get(target_language)
            .copied()
            .unwrap_or(self.behavior)
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn detect_language(&self, _text: &str) -> Result<DetectedLanguage, ProviderError> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);

        match &self.detection {
            MockDetection::Language(code) => Ok(DetectedLanguage::Code(code.clone())),
            MockDetection::Undetermined => Ok(DetectedLanguage::Undetermined),
            MockDetection::Failing => Err(ProviderError::ConnectionError(
                "Simulated detection failure".to_string(),
            )),
        }
    }

    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        _source_language: Option<&str>,
    ) -> Result<String, ProviderError> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        let previous_calls = {
            let mut per_language = self.calls_per_language.lock();
            let count = per_language.entry(target_language.to_string()).or_insert(0);
            *count += 1;
            *count - 1
        };

        match self.behavior_for(target_language) {
            MockBehavior::Working => Ok(format!("[{}] {}", target_language, text)),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::FailTimes { times } => {
                if previous_calls < times {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated failure (call #{})", previous_calls + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(format!("[{}] {}", target_language, text))
                }
            }

            MockBehavior::Echo => Ok(text.to_string()),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(format!("[{}] {}", target_language, text))
            }

            MockBehavior::Panic => panic!("Simulated panic translating into {}", target_language),
        }
    }
}
