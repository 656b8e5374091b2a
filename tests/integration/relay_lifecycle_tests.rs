/*!
 * Integration tests for concurrent event handling, the way the relay runs
 * one task per inbound event
 */

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_test::assert_err;

use polyglot_relay::chat::InboundMessage;
use polyglot_relay::providers::mock::{MockBehavior, MockGenerationClient};
use polyglot_relay::translation::{PipelineOutcome, RejectReason};

use crate::common::{RecordingReplySink, build_pipeline, message, test_config};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redeliveries_shouldProduceExactlyOneReply() {
    let client = MockGenerationClient::slow(20);
    let sink = RecordingReplySink::new();
    let pipeline = Arc::new(build_pipeline(&test_config(&["ko", "ja"]), &client, &sink));

    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        let pipeline = pipeline.clone();
        tasks.spawn(async move { pipeline.handle_event(message("T1", "hello team")).await });
    }

    let mut replied = 0;
    let mut skipped = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            PipelineOutcome::Replied { .. } => replied += 1,
            PipelineOutcome::Skipped(RejectReason::AlreadyProcessed) => skipped += 1,
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    assert_eq!(replied, 1);
    assert_eq!(skipped, 15);
    assert_eq!(sink.replies().len(), 1);
    assert_eq!(client.detect_calls(), 1);
    assert_eq!(client.translate_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_many_messages_withSingleCallSlot_shouldAllComplete() {
    let client = MockGenerationClient::slow(1_000);
    let sink = RecordingReplySink::new();
    let mut config = test_config(&["ko", "ja"]);
    config.dispatch.max_in_flight_calls = 1;
    let pipeline = Arc::new(build_pipeline(&config, &client, &sink));

    let mut tasks = JoinSet::new();
    for index in 0..5 {
        let pipeline = pipeline.clone();
        let event = InboundMessage::new(format!("C{}", index), "T1", "U1", "hello team");
        tasks.spawn(async move { pipeline.handle_event(event).await });
    }
    while let Some(joined) = tasks.join_next().await {
        assert!(matches!(joined.unwrap(), PipelineOutcome::Replied { succeeded: 2, .. }));
    }

    let mut conversations: Vec<String> = sink
        .replies()
        .into_iter()
        .map(|reply| reply.conversation_id)
        .collect();
    conversations.sort();
    assert_eq!(conversations, vec!["C0", "C1", "C2", "C3", "C4"]);
    assert_eq!(pipeline.stats().dedup_size, 5);
}

#[tokio::test(start_paused = true)]
async fn test_slow_target_withTimeout_shouldNotDelayOtherMessages() {
    let client = MockGenerationClient::working()
        .with_language_behavior("ja", MockBehavior::Slow { delay_ms: 120_000 });
    let sink = RecordingReplySink::new();
    let mut config = test_config(&["ko", "ja"]);
    config.dispatch.call_timeout_secs = 5;
    config.dispatch.max_attempts = 1;
    let pipeline = Arc::new(build_pipeline(&config, &client, &sink));

    let outcome = pipeline.handle_event(message("T1", "hello team")).await;

    assert!(matches!(outcome, PipelineOutcome::Replied { succeeded: 1, failed: 1, .. }));
    assert_eq!(pipeline.stats().last_batch_latency, Some(Duration::from_secs(5)));
}

#[test]
fn test_malformed_event_shouldBeRejectedBeforePipeline() {
    let result = tokio_test::block_on(async {
        InboundMessage::from_json(r#"{"conversation_id":"C1","text":"missing message id"}"#)
    });

    let error = assert_err!(result);
    assert!(error.to_string().contains("Malformed inbound event"));
}
