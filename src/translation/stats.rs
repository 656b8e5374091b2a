/*!
 * Pull-based pipeline counters.
 */

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::dedup::CacheStats;
use super::fanout::Batch;

/// Counters updated by the pipeline as messages flow through it
#[derive(Debug, Default)]
pub struct PipelineStats {
    received: AtomicU64,
    skipped: AtomicU64,
    abandoned: AtomicU64,
    batches: AtomicU64,
    translations_succeeded: AtomicU64,
    translations_failed: AtomicU64,
    replies_posted: AtomicU64,
    last_batch_latency: Mutex<Option<Duration>>,
}

/// Point-in-time view of the pipeline health
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub dedup_size: usize,
    pub dedup_oldest_entry_age: Option<Duration>,
    pub last_batch_latency: Option<Duration>,
    pub messages_received: u64,
    pub messages_skipped: u64,
    pub messages_abandoned: u64,
    pub batches: u64,
    pub translations_succeeded: u64,
    pub translations_failed: u64,
    pub replies_posted: u64,
}

impl StatsSnapshot {
    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} received, {} skipped, {} abandoned, {} batches ({} translated, {} failed), {} replies posted, {} dedup entries",
            self.messages_received,
            self.messages_skipped,
            self.messages_abandoned,
            self.batches,
            self.translations_succeeded,
            self.translations_failed,
            self.replies_posted,
            self.dedup_size
        )
    }
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a settled batch and remember its latency
    pub fn record_batch(&self, batch: &Batch) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.translations_succeeded
            .fetch_add(batch.succeeded_count() as u64, Ordering::Relaxed);
        self.translations_failed
            .fetch_add(batch.failed_count() as u64, Ordering::Relaxed);
        *self.last_batch_latency.lock() = Some(batch.elapsed);
    }

    pub fn record_reply_posted(&self) {
        self.replies_posted.fetch_add(1, Ordering::Relaxed);
    }

    /// Combine the counters with the dedup cache view
    pub fn snapshot(&self, cache: CacheStats) -> StatsSnapshot {
        StatsSnapshot {
            dedup_size: cache.size,
            dedup_oldest_entry_age: cache.oldest_entry_age,
            last_batch_latency: *self.last_batch_latency.lock(),
            messages_received: self.received.load(Ordering::Relaxed),
            messages_skipped: self.skipped.load(Ordering::Relaxed),
            messages_abandoned: self.abandoned.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            translations_succeeded: self.translations_succeeded.load(Ordering::Relaxed),
            translations_failed: self.translations_failed.load(Ordering::Relaxed),
            replies_posted: self.replies_posted.load(Ordering::Relaxed),
        }
    }
}
