use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::default::Default;
use std::path::Path;
use std::time::Duration;

use crate::language_utils;

/// Application configuration module
/// This module handles the relay configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Languages every eligible message is translated into (ISO codes)
    #[serde(default = "default_target_languages")]
    pub target_languages: Vec<String>,

    /// Fan-out and retry settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Reply formatting settings
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Eligibility filter settings
    #[serde(default)]
    pub filter: FilterConfig,

    /// Deduplication settings
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Generation backend settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Fan-out and retry configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DispatchConfig {
    /// Timeout of a single generation call in seconds
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Maximum attempts per generation call, first attempt included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay before the first retry, doubled on each further retry
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Cap on generation calls in flight across all messages
    #[serde(default = "default_max_in_flight_calls")]
    pub max_in_flight_calls: usize,
}

impl DispatchConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            max_in_flight_calls: default_max_in_flight_calls(),
        }
    }
}

/// Reply formatting configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReplyConfig {
    /// Post replies in the thread of the original message
    #[serde(default = "default_true")]
    pub thread_replies: bool,

    /// Maximum characters per posted reply part
    #[serde(default = "default_reply_max_length")]
    pub max_length: usize,

    /// Text shown in place of a translation that failed
    #[serde(default = "default_failure_placeholder")]
    pub failure_placeholder: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            thread_replies: true,
            max_length: default_reply_max_length(),
            failure_placeholder: default_failure_placeholder(),
        }
    }
}

/// Eligibility filter configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilterConfig {
    /// Markers that opt a message out of translation (case-insensitive)
    #[serde(default = "default_opt_out_markers")]
    pub opt_out_markers: Vec<String>,

    /// Minimum number of characters, after trimming, worth translating
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            opt_out_markers: default_opt_out_markers(),
            min_text_length: default_min_text_length(),
        }
    }
}

/// Deduplication configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DedupConfig {
    /// How long a processed message id is remembered, in seconds
    #[serde(default = "default_dedup_ttl_secs")]
    pub ttl_secs: u64,
}

impl DedupConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_dedup_ttl_secs(),
        }
    }
}

/// Generation backend configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Service URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    // @field: Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,

    // @field: Sampling temperature (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    // @field: HTTP client timeout, independent of the per-call dispatch timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// System prompt for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_translate_prompt")]
    pub translate_prompt: String,

    /// System prompt for language detection
    #[serde(default = "default_detect_prompt")]
    pub detect_prompt: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            model: default_ollama_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            translate_prompt: default_translate_prompt(),
            detect_prompt: default_detect_prompt(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_target_languages() -> Vec<String> {
    vec!["en".to_string(), "ko".to_string(), "ja".to_string()]
}

fn default_call_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_max_in_flight_calls() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_reply_max_length() -> usize {
    4000
}

fn default_failure_placeholder() -> String {
    "\u{26A0}\u{FE0F} translation failed".to_string()
}

fn default_opt_out_markers() -> Vec<String> {
    vec!["/ignore".to_string()]
}

fn default_min_text_length() -> usize {
    3
}

fn default_dedup_ttl_secs() -> u64 {
    600
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_translate_prompt() -> String {
    "You are a professional translator for a team chat. Translate the following message from {source_language} to {target_language}. Preserve line breaks, mentions, links and emoji. Only respond with the translated text, without any explanations or notes.".to_string()
}

fn default_detect_prompt() -> String {
    "Identify the language of the following chat message. Respond with its ISO 639-1 code only (for example: en, ko, ja). If you cannot tell, respond with und.".to_string()
}

impl Config {
    /// Load a configuration file, creating one with defaults if it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .context(format!("Failed to open config file: {}", path.display()))?;
            serde_json::from_str(&content)
                .context(format!("Failed to parse config file: {}", path.display()))
        } else {
            let config = Config::default();
            let config_json = serde_json::to_string_pretty(&config)
                .context("Failed to serialize default config to JSON")?;
            std::fs::write(path, config_json)
                .context(format!("Failed to write default config to file: {}", path.display()))?;
            Ok(config)
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.target_languages.is_empty() {
            return Err(anyhow!("At least one target language is required"));
        }

        let mut seen = HashSet::new();
        for code in &self.target_languages {
            let normalized = language_utils::normalize_to_part2t(code)
                .context(format!("Invalid target language: {}", code))?;
            if !seen.insert(normalized) {
                return Err(anyhow!("Duplicate target language: {}", code));
            }
        }

        if self.dispatch.max_attempts == 0 {
            return Err(anyhow!("dispatch.max_attempts must be at least 1"));
        }
        if self.dispatch.call_timeout_secs == 0 {
            return Err(anyhow!("dispatch.call_timeout_secs must be greater than 0"));
        }
        if self.dispatch.max_in_flight_calls == 0 {
            return Err(anyhow!("dispatch.max_in_flight_calls must be at least 1"));
        }
        if self.reply.max_length == 0 {
            return Err(anyhow!("reply.max_length must be greater than 0"));
        }
        if self.dedup.ttl_secs == 0 {
            return Err(anyhow!("dedup.ttl_secs must be greater than 0"));
        }
        if self.provider.endpoint.trim().is_empty() {
            return Err(anyhow!("provider.endpoint cannot be empty"));
        }
        if self.provider.model.trim().is_empty() {
            return Err(anyhow!("provider.model cannot be empty"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_languages: default_target_languages(),
            dispatch: DispatchConfig::default(),
            reply: ReplyConfig::default(),
            filter: FilterConfig::default(),
            dedup: DedupConfig::default(),
            provider: ProviderConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
