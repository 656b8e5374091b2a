/*!
 * Tests for application configuration functionality
 */

use std::time::Duration;

use polyglot_relay::app_config::{Config, LogLevel};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.target_languages, vec!["en", "ko", "ja"]);
    assert_eq!(config.dispatch.call_timeout(), Duration::from_secs(30));
    assert_eq!(config.dispatch.max_attempts, 3);
    assert_eq!(config.dispatch.retry_base_delay(), Duration::from_secs(1));
    assert_eq!(config.dispatch.max_in_flight_calls, 8);
    assert!(config.reply.thread_replies);
    assert_eq!(config.reply.max_length, 4000);
    assert_eq!(config.filter.opt_out_markers, vec!["/ignore"]);
    assert_eq!(config.filter.min_text_length, 3);
    assert_eq!(config.dedup.ttl(), Duration::from_secs(600));
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.provider.translate_prompt.contains("{target_language}"));

    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    config.target_languages = vec![];
    assert!(config.validate().is_err());

    config.target_languages = vec!["en".to_string(), "xyz".to_string()];
    assert!(config.validate().is_err());

    // Same language in two code formats
    config.target_languages = vec!["en".to_string(), "eng".to_string()];
    assert!(config.validate().is_err());

    config.target_languages = vec!["en".to_string(), "kor".to_string(), "fre".to_string()];
    assert!(config.validate().is_ok());

    config.dispatch.max_attempts = 0;
    assert!(config.validate().is_err());
    config.dispatch.max_attempts = 1;

    config.dispatch.call_timeout_secs = 0;
    assert!(config.validate().is_err());
    config.dispatch.call_timeout_secs = 30;

    config.dispatch.max_in_flight_calls = 0;
    assert!(config.validate().is_err());
    config.dispatch.max_in_flight_calls = 2;

    config.reply.max_length = 0;
    assert!(config.validate().is_err());
    config.reply.max_length = 4000;

    config.dedup.ttl_secs = 0;
    assert!(config.validate().is_err());
    config.dedup.ttl_secs = 60;

    config.provider.model = "  ".to_string();
    assert!(config.validate().is_err());
    config.provider.model = "llama3".to_string();

    config.provider.endpoint = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path).unwrap();

    assert!(path.exists());
    assert_eq!(config.target_languages, Config::default().target_languages);

    let reloaded = Config::load_or_create(&path).unwrap();
    assert_eq!(reloaded.reply.max_length, config.reply.max_length);
    assert_eq!(reloaded.provider.model, config.provider.model);
}

#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "target_languages": ["de", "fr"],
            "dispatch": { "max_attempts": 5 },
            "reply": { "thread_replies": false },
            "log_level": "debug"
        }"#,
    )
    .unwrap();

    let config = Config::load_or_create(&path).unwrap();

    assert_eq!(config.target_languages, vec!["de", "fr"]);
    assert_eq!(config.dispatch.max_attempts, 5);
    assert_eq!(config.dispatch.call_timeout_secs, 30);
    assert!(!config.reply.thread_replies);
    assert_eq!(config.reply.max_length, 4000);
    assert_eq!(config.filter.min_text_length, 3);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_or_create_withMalformedFile_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json").unwrap();

    let error = Config::load_or_create(&path).unwrap_err();
    assert!(error.to_string().contains("Failed to parse config file"));
}
