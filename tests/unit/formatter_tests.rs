/*!
 * Tests for reply formatting and splitting
 */

use std::time::Duration;

use polyglot_relay::app_config::ReplyConfig;
use polyglot_relay::translation::{Batch, ReplyFormatter, TranslationOutcome};

fn batch(outcomes: Vec<TranslationOutcome>) -> Batch {
    Batch {
        source_language: "en".to_string(),
        outcomes,
        elapsed: Duration::from_millis(10),
    }
}

/// Each part is a slice of `text`, in order, with only whitespace between parts
fn assert_parts_reassemble(text: &str, parts: &[String]) {
    let mut cursor = 0;
    for part in parts {
        let found = text[cursor..]
            .find(part.as_str())
            .unwrap_or_else(|| panic!("part {:?} is not a slice of the input", part));
        assert!(text[cursor..cursor + found].trim().is_empty(), "content lost before {:?}", part);
        cursor += found + part.len();
    }
    assert!(text[cursor..].trim().is_empty(), "content lost after the last part");
}

#[test]
fn test_format_withNineThousandChars_shouldSplitWithinLimitAndKeepContent() {
    let formatter = ReplyFormatter::new(4000, "(failed)");
    let paragraph = "The quick brown fox jumps over the lazy dog near the riverbank. ".repeat(47);
    let reply = batch(vec![
        TranslationOutcome::success("ko", paragraph.trim().to_string(), 1),
        TranslationOutcome::success("ja", paragraph.trim().to_string(), 1),
        TranslationOutcome::success("de", paragraph.trim().to_string(), 1),
    ]);

    let rendered = formatter.render(&reply);
    assert!(rendered.chars().count() >= 9000);

    let parts = formatter.format(&reply);

    assert!(parts.len() >= 3);
    for part in &parts {
        assert!(part.chars().count() <= 4000);
        assert_eq!(part, part.trim());
        assert!(!part.is_empty());
    }
    assert_parts_reassemble(&rendered, &parts);
}

#[test]
fn test_format_withShortReply_shouldProduceOnePart() {
    let formatter = ReplyFormatter::from_config(&ReplyConfig::default());
    let reply = batch(vec![
        TranslationOutcome::success("ko", "안녕 팀".to_string(), 1),
        TranslationOutcome::success("ja", "こんにちは チーム".to_string(), 2),
    ]);

    let parts = formatter.format(&reply);

    assert_eq!(parts, vec!["🇰🇷 안녕 팀\n🇯🇵 こんにちは チーム".to_string()]);
}

#[test]
fn test_format_withFailedTarget_shouldRenderConfiguredPlaceholder() {
    let config = ReplyConfig {
        thread_replies: true,
        max_length: 4000,
        failure_placeholder: "⚠️ unavailable".to_string(),
    };
    let formatter = ReplyFormatter::from_config(&config);
    let reply = batch(vec![
        TranslationOutcome::failure("ko", "Connection error: reset".to_string(), 3),
        TranslationOutcome::success("vi", "xin chào".to_string(), 1),
        TranslationOutcome::failure("cy", "call timed out after 30s".to_string(), 3),
    ]);

    assert_eq!(
        formatter.format(&reply),
        vec!["🇰🇷 ⚠️ unavailable\n🇻🇳 xin chào\n[CY] ⚠️ unavailable".to_string()]
    );
}

#[test]
fn test_split_withMultibyteText_shouldCountCharactersNotBytes() {
    let formatter = ReplyFormatter::new(10, "x");
    // 10 characters, 30 bytes
    let text = "안녕하세요안녕하세요";

    assert_eq!(formatter.split(text), vec![text.to_string()]);

    let parts = formatter.split("안녕하세요 안녕하세요 안녕");
    assert_eq!(parts, vec!["안녕하세요".to_string(), "안녕하세요 안녕".to_string()]);
}

#[test]
fn test_split_withTabsAndDoubleSpaces_shouldKeepInnerWhitespace() {
    let formatter = ReplyFormatter::new(20, "x");
    let text = "🇰🇷 첫째  줄\t둘째 줄 셋째  넷째 다섯째\n🇯🇵 短い  行";

    let parts = formatter.split(text);

    assert!(parts.len() >= 2);
    for part in &parts {
        assert!(part.chars().count() <= 20);
        assert_eq!(part, part.trim());
    }
    assert!(parts[0].contains("첫째  줄\t둘째"));
    assert_parts_reassemble(text, &parts);
}
