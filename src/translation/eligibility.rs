/*!
 * Eligibility filter for inbound messages.
 *
 * A pure predicate deciding whether a message enters the translation
 * pipeline. Checks run in a fixed precedence order and the first match wins.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::app_config::FilterConfig;
use crate::chat::{InboundMessage, MessageKind};

/// Text made only of emoji, modifiers, joiners, flags and `:shortcode:` emoji
static PICTOGRAPHIC_ONLY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:\s|\p{Extended_Pictographic}|\p{Emoji_Modifier}|\p{Regional_Indicator}|\x{FE0F}|\x{200D}|\x{20E3}|:[a-z0-9_+\-]+:)+$",
    )
    .expect("pictographic pattern is valid")
});

/// Why a message was kept out of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Posted by a bot or integration
    AutomatedSender,
    /// Platform-generated event kind
    UnsupportedKind,
    /// Same conversation/message id seen within the dedup window
    AlreadyProcessed,
    /// Nothing but whitespace
    EmptyText,
    /// Only emoji, no linguistic content
    PictographicOnly,
    /// Author asked not to translate
    OptedOut,
    /// Too short to be worth translating
    TooShort,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutomatedSender => "automated_sender",
            Self::UnsupportedKind => "unsupported_kind",
            Self::AlreadyProcessed => "already_processed",
            Self::EmptyText => "empty_text",
            Self::PictographicOnly => "pictographic_only",
            Self::OptedOut => "opted_out",
            Self::TooShort => "too_short",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Rejected(RejectReason),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Eligible => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }
}

/// Eligibility filter configured with opt-out markers and a minimum length
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    /// Lowercased opt-out markers
    opt_out_markers: Vec<String>,

    /// Minimum character count after trimming
    min_text_length: usize,
}

impl EligibilityFilter {
    pub fn new(opt_out_markers: &[String], min_text_length: usize) -> Self {
        Self {
            opt_out_markers: opt_out_markers
                .iter()
                .map(|marker| marker.trim().to_lowercase())
                .filter(|marker| !marker.is_empty())
                .collect(),
            min_text_length,
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.opt_out_markers, config.min_text_length)
    }

    /// Decide whether `message` should be translated.
    ///
    /// `already_processed` is the deduplication cache's answer for the
    /// message key, sampled once by the caller.
    pub fn evaluate(&self, message: &InboundMessage, already_processed: bool) -> Eligibility {
        if message.is_from_automated_sender {
            return Eligibility::Rejected(RejectReason::AutomatedSender);
        }

        if message.kind == MessageKind::System {
            return Eligibility::Rejected(RejectReason::UnsupportedKind);
        }

        if already_processed {
            return Eligibility::Rejected(RejectReason::AlreadyProcessed);
        }

        let text = message.text.trim();
        if text.is_empty() {
            return Eligibility::Rejected(RejectReason::EmptyText);
        }

        if is_pictographic_only(text) {
            return Eligibility::Rejected(RejectReason::PictographicOnly);
        }

        let lowered = text.to_lowercase();
        if self.opt_out_markers.iter().any(|marker| lowered.contains(marker.as_str())) {
            return Eligibility::Rejected(RejectReason::OptedOut);
        }

        if text.chars().count() < self.min_text_length {
            return Eligibility::Rejected(RejectReason::TooShort);
        }

        Eligibility::Eligible
    }
}

impl Default for EligibilityFilter {
    fn default() -> Self {
        Self::from_config(&FilterConfig::default())
    }
}

/// Whether `text` carries no linguistic content, only pictographs
pub fn is_pictographic_only(text: &str) -> bool {
    !text.trim().is_empty() && PICTOGRAPHIC_ONLY_REGEX.is_match(text)
}
