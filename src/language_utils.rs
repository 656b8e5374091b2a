use anyhow::{Result, anyhow};
use isolang::Language;
use std::fmt;

/// Language utilities for ISO language code handling
///
/// This module validates and normalizes ISO 639-1 (2-letter) and ISO 639-2
/// (3-letter) codes, turns free-form detector output into a code from the
/// supported set, and provides the reply label for each language.

/// Languages the relay can detect and label, with the region used for the flag
const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "US"),
    ("ko", "KR"),
    ("ja", "JP"),
    ("zh", "CN"),
    ("es", "ES"),
    ("fr", "FR"),
    ("de", "DE"),
    ("it", "IT"),
    ("pt", "PT"),
    ("ru", "RU"),
    ("vi", "VN"),
    ("th", "TH"),
    ("id", "ID"),
    ("ar", "SA"),
    ("hi", "IN"),
    ("nl", "NL"),
    ("pl", "PL"),
    ("tr", "TR"),
    ("uk", "UA"),
    ("sv", "SE"),
];

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Tokens a detector may answer with when it cannot tell
const UNDETERMINED_TOKENS: &[&str] = &["und", "unknown", "undetermined", "none", "n/a"];

/// Result of a language detection call, normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedLanguage {
    /// A code from the supported set
    Code(String),
    /// The detector could not tell, or answered outside the supported set
    Undetermined,
}

impl DetectedLanguage {
    /// The detected code, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Code(code) => Some(code),
            Self::Undetermined => None,
        }
    }
}

impl fmt::Display for DetectedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code),
            Self::Undetermined => write!(f, "und"),
        }
    }
}

fn bibliographic_to_terminologic(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
        if let Some(part2t) = bibliographic_to_terminologic(&normalized_code) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let part2t = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&part2t)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(lang
        .to_639_1()
        .map(|part1| part1.to_string())
        .unwrap_or(part2t))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(normalized1), Ok(normalized2)) => normalized1 == normalized2,
        _ => false,
    }
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Whether a code belongs to the set the relay can detect and label
pub fn is_supported(code: &str) -> bool {
    match normalize_to_part1_or_part2t(code) {
        Ok(normalized) => SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == normalized),
        Err(_) => false,
    }
}

/// All supported ISO 639-1 codes, in display order
pub fn supported_languages() -> impl Iterator<Item = &'static str> {
    SUPPORTED_LANGUAGES.iter().map(|(code, _)| *code)
}

/// Turn raw detector output into a supported language code.
///
/// Accepts answers such as `ko`, `"ja"`, `en-US`, `pt_BR`, `eng`, `Korean.`
/// and short sentences like `It is Korean.` or `The language is ko`. A
/// supported language name anywhere in the answer wins over a code, then the
/// first token that is a supported code. Anything else is `Undetermined`.
pub fn normalize_detected(raw: &str) -> DetectedLanguage {
    let tokens: Vec<String> = raw
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '_'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();

    match tokens.first() {
        None => return DetectedLanguage::Undetermined,
        Some(first) if UNDETERMINED_TOKENS.contains(&first.as_str()) => {
            return DetectedLanguage::Undetermined;
        }
        Some(_) => {}
    }

    let primaries: Vec<&str> = tokens
        .iter()
        .map(|token| token.split(['-', '_']).next().unwrap_or(""))
        .collect();

    // "It is Korean" starts with a word that is also a code
    primaries
        .iter()
        .find_map(|primary| supported_language_named(primary))
        .or_else(|| primaries.iter().find_map(|primary| supported_code(primary)))
        .map(DetectedLanguage::Code)
        .unwrap_or(DetectedLanguage::Undetermined)
}

fn supported_code(token: &str) -> Option<String> {
    normalize_to_part1_or_part2t(token)
        .ok()
        .filter(|code| is_supported(code))
}

/// Supported code whose English name is `name` ("korean", "japanese")
fn supported_language_named(name: &str) -> Option<String> {
    supported_languages()
        .find(|code| {
            Language::from_639_1(code)
                .map(|lang| lang.to_name().to_lowercase() == name)
                .unwrap_or(false)
        })
        .map(|code| code.to_string())
}

/// Flag emoji for a supported language, `None` for anything else
pub fn language_flag(code: &str) -> Option<String> {
    let normalized = normalize_to_part1_or_part2t(code).ok()?;
    let (_, region) = SUPPORTED_LANGUAGES.iter().find(|(c, _)| *c == normalized)?;

    region
        .chars()
        .map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
        .collect()
}

/// Label prefixed to a language's segment in a reply
pub fn language_label(code: &str) -> String {
    language_flag(code).unwrap_or_else(|| format!("[{}]", code.trim().to_uppercase()))
}
