/*!
 * Message deduplication cache.
 *
 * Remembers which (conversation, message) pairs have already been taken into
 * the pipeline for a fixed time-to-live, so redeliveries and the relay's own
 * echoes are not translated twice.
 */

use log::debug;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::chat::DedupKey;

/// Default time a processed key is remembered
pub const DEFAULT_DEDUP_TTL: Duration = Duration::from_secs(600);

/// State recorded for a seen key
#[derive(Debug, Clone, Copy)]
pub struct DedupEntry {
    /// When the key was marked
    pub first_seen_at: Instant,

    /// Whether the message was taken into the pipeline
    pub processed: bool,
}

/// Read-only cache statistics for health reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of live entries
    pub size: usize,

    /// Age of the oldest live entry
    pub oldest_entry_age: Option<Duration>,
}

/// TTL-bounded set of processed message keys, safe to share across tasks
pub struct DedupCache {
    /// Internal cache storage
    entries: Arc<Mutex<HashMap<DedupKey, DedupEntry>>>,

    /// How long an entry stays live
    ttl: Duration,
}

impl DedupCache {
    /// Create a new cache with the given time-to-live
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Whether `key` was processed within the TTL window.
    ///
    /// Expired entries are swept before answering.
    pub fn is_processed(&self, key: &DedupKey) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        self.evict_expired(&mut entries, now);

        entries.get(key).is_some_and(|entry| entry.processed)
    }

    /// Record `key` as processed with a fresh timestamp
    pub fn mark_processed(&self, key: DedupKey) {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        debug!("Marking {} as processed", key);
        entries.insert(
            key,
            DedupEntry {
                first_seen_at: now,
                processed: true,
            },
        );
    }

    /// Atomically claim `key`: mark it processed unless it already is.
    ///
    /// Returns `false` when another delivery of the same key got there first.
    pub fn try_mark_processed(&self, key: DedupKey) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        self.evict_expired(&mut entries, now);

        if entries.get(&key).is_some_and(|entry| entry.processed) {
            debug!("Key {} already claimed", key);
            return false;
        }

        entries.insert(
            key,
            DedupEntry {
                first_seen_at: now,
                processed: true,
            },
        );
        true
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.lock();

        let live = entries
            .values()
            .filter(|entry| now.duration_since(entry.first_seen_at) < self.ttl);

        let mut size = 0;
        let mut oldest: Option<Instant> = None;
        for entry in live {
            size += 1;
            oldest = Some(match oldest {
                Some(current) if current <= entry.first_seen_at => current,
                _ => entry.first_seen_at,
            });
        }

        CacheStats {
            size,
            oldest_entry_age: oldest.map(|seen| now.duration_since(seen)),
        }
    }

    /// Get the number of stored entries, expired ones included until the next sweep
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.entries.lock().clear();
        debug!("Deduplication cache cleared");
    }

    fn evict_expired(&self, entries: &mut HashMap<DedupKey, DedupEntry>, now: Instant) {
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.first_seen_at) < self.ttl);

        let evicted = before - entries.len();
        if evicted > 0 {
            debug!("Evicted {} expired deduplication entries", evicted);
        }
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_TTL)
    }
}

impl Clone for DedupCache {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            ttl: self.ttl,
        }
    }
}
