/*!
 * Generation client boundary.
 *
 * The dispatch core only sees `GenerationClient`: detect a language, translate
 * a text. `LlmGenerationClient` implements it over any prompt-driven
 * `Provider`.
 */

use async_trait::async_trait;
use log::debug;

use crate::errors::ProviderError;
use crate::language_utils::{self, DetectedLanguage};
use crate::providers::PromptRequest;

/// Detect and translate operations required from the generation backend
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Detect the language of `text`, normalized to the supported set
    async fn detect_language(&self, text: &str) -> Result<DetectedLanguage, ProviderError>;

    /// Translate `text` into `target_language`
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
    ) -> Result<String, ProviderError>;
}

/// Generation client driving a chat/completion model with prompts
#[derive(Debug)]
pub struct LlmGenerationClient<P> {
    provider: P,
    translate_prompt: String,
    detect_prompt: String,
}

impl<P: PromptRequest> LlmGenerationClient<P> {
    pub fn new(provider: P, translate_prompt: impl Into<String>, detect_prompt: impl Into<String>) -> Self {
        Self {
            provider,
            translate_prompt: translate_prompt.into(),
            detect_prompt: detect_prompt.into(),
        }
    }

    /// The wrapped provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Render the translation system prompt for a language pair
    pub fn translation_system_prompt(&self, target_language: &str, source_language: Option<&str>) -> String {
        let source = source_language
            .map(display_language)
            .unwrap_or_else(|| "the detected language".to_string());

        self.translate_prompt
            .replace("{source_language}", &source)
            .replace("{target_language}", &display_language(target_language))
    }

    async fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let request = self.provider.build_request(system, prompt);
        let response = self.provider.complete(request).await?;
        Ok(P::extract_text(&response))
    }
}

#[async_trait]
impl<P: PromptRequest> GenerationClient for LlmGenerationClient<P> {
    async fn detect_language(&self, text: &str) -> Result<DetectedLanguage, ProviderError> {
        let raw = self.generate(&self.detect_prompt, text).await?;
        let detected = language_utils::normalize_detected(&raw);
        debug!("Detector answered {:?}, normalized to {}", raw, detected);
        Ok(detected)
    }

    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
    ) -> Result<String, ProviderError> {
        let system = self.translation_system_prompt(target_language, source_language);
        self.generate(&system, text).await
    }
}

/// "Korean (ko)" for known codes, the raw code otherwise
fn display_language(code: &str) -> String {
    match language_utils::get_language_name(code) {
        Ok(name) => format!("{} ({})", name, code),
        Err(_) => code.to_string(),
    }
}
