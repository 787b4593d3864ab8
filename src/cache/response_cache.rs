//! LLM response cache with LRU eviction.
//!
//! In-memory only: the cache lives as long as the client object and is reset
//! on process restart. Cache key is a SHA-256 digest of
//! `(model, system_prompt, lowercased user_prompt)`. When the store reaches
//! capacity the least-recently-used entry is evicted.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

/// A single cached LLM response.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The LLM response text.
    response: String,
    /// Tick of the last get/put touching this entry (LRU ordering).
    last_used: u64,
    /// Number of cache hits for this entry.
    hit_count: u32,
}

/// In-memory LRU response cache.
///
/// Recency is tracked with a monotonic tick counter rather than wall-clock
/// time, so eviction order is exact even for entries touched within the
/// same second.
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    max_entries: usize,
    tick: u64,
}

impl ResponseCache {
    /// Create an empty cache. `max_entries` is clamped to a minimum of 1
    /// to prevent infinite eviction loops.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: max_entries.max(1),
            tick: 0,
        }
    }

    /// Build a deterministic cache key: SHA-256 of
    /// `(model, system_prompt, lowercase(user_prompt))`.
    ///
    /// The prompt is lowercased so "Hello" and "hello" share an entry.
    /// Uses length-prefixed encoding to prevent separator collisions
    /// (e.g. `model="a|b"` vs `model="a", system="|b"`).
    pub fn cache_key(model: &str, system_prompt: &str, user_prompt: &str) -> String {
        let prompt = user_prompt.to_lowercase();
        let mut hasher = Sha256::new();
        hasher.update((model.len() as u64).to_le_bytes());
        hasher.update(model.as_bytes());
        hasher.update((system_prompt.len() as u64).to_le_bytes());
        hasher.update(system_prompt.as_bytes());
        hasher.update((prompt.len() as u64).to_le_bytes());
        hasher.update(prompt.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Look up a cached response. On hit, bumps recency and `hit_count`.
    pub fn get(&mut self, key: &str) -> Option<String> {
        self.tick += 1;
        let tick = self.tick;
        let entry = self.entries.get_mut(key)?;
        entry.last_used = tick;
        entry.hit_count = entry.hit_count.saturating_add(1);
        Some(entry.response.clone())
    }

    /// Store a response, evicting the least-recently-used entry if the
    /// store is at capacity. Overwriting an existing key does not evict.
    pub fn put(&mut self, key: String, response: String) {
        self.tick += 1;
        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.max_entries {
                self.evict_lru();
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                response,
                last_used: self.tick,
                hit_count: 0,
            },
        );
    }

    /// Return aggregate statistics about the cache.
    pub fn stats(&self) -> CacheStats {
        let total_hits: u64 = self
            .entries
            .values()
            .map(|e| u64::from(e.hit_count))
            .sum();
        CacheStats {
            total_entries: self.entries.len(),
            total_hits,
        }
    }

    /// Remove all entries from the cache.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Return the number of entries currently in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if the cache contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_lru(&mut self) {
        if let Some(lru_key) = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_used)
            .map(|(k, _)| k.clone())
        {
            debug!(key = %&lru_key[..8.min(lru_key.len())], "Evicting LRU cache entry");
            self.entries.remove(&lru_key);
        }
    }
}

/// Aggregate cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of entries currently in the cache.
    pub total_entries: usize,
    /// Cumulative number of cache hits across all entries.
    pub total_hits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_deterministic() {
        let k1 = ResponseCache::cache_key("x-ai/grok-beta", "sys", "hello");
        let k2 = ResponseCache::cache_key("x-ai/grok-beta", "sys", "hello");
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_cache_key_model_aware() {
        let k1 = ResponseCache::cache_key("x-ai/grok-beta", "sys", "hello");
        let k2 = ResponseCache::cache_key("x-ai/grok-2-1212", "sys", "hello");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_cache_key_system_prompt_aware() {
        let k1 = ResponseCache::cache_key("m", "system A", "hello");
        let k2 = ResponseCache::cache_key("m", "system B", "hello");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_cache_key_prompt_case_insensitive() {
        let k1 = ResponseCache::cache_key("m", "sys", "How do I craft a piston?");
        let k2 = ResponseCache::cache_key("m", "sys", "how do i craft a piston?");
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_cache_key_no_separator_collision() {
        // "a|b" as model with empty system must differ from "a" model with "b" system
        let k1 = ResponseCache::cache_key("a|b", "", "c");
        let k2 = ResponseCache::cache_key("a", "b", "c");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_cache_hit_miss() {
        let mut cache = ResponseCache::new(8);
        assert!(cache.get("k").is_none());
        cache.put("k".into(), "response".into());
        assert_eq!(cache.get("k"), Some("response".into()));
    }

    #[test]
    fn test_cache_capacity_evicts_lru() {
        let mut cache = ResponseCache::new(3);
        cache.put("k0".into(), "v0".into());
        cache.put("k1".into(), "v1".into());
        cache.put("k2".into(), "v2".into());
        // Touch k0 so k1 becomes the least recently used.
        let _ = cache.get("k0");
        cache.put("k3".into(), "v3".into());
        assert_eq!(cache.len(), 3, "must stay at capacity after N+1 inserts");
        assert!(cache.get("k1").is_none(), "k1 was LRU and must be evicted");
        assert!(cache.get("k0").is_some());
        assert!(cache.get("k3").is_some());
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let mut cache = ResponseCache::new(2);
        cache.put("a".into(), "1".into());
        cache.put("b".into(), "2".into());
        cache.put("a".into(), "updated".into());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some("updated".into()));
        assert_eq!(cache.get("b"), Some("2".into()));
    }

    #[test]
    fn test_cache_stats() {
        let mut cache = ResponseCache::new(8);
        cache.put("k1".into(), "r1".into());
        cache.put("k2".into(), "r2".into());
        let _ = cache.get("k1"); // 1 hit
        let _ = cache.get("k1"); // 2 hits
        let _ = cache.get("k2"); // 1 hit
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.total_hits, 3);
    }

    #[test]
    fn test_cache_clear() {
        let mut cache = ResponseCache::new(8);
        cache.put("k1".into(), "r1".into());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn test_max_entries_zero_clamped() {
        let mut cache = ResponseCache::new(0);
        cache.put("k".into(), "v".into());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_len_and_is_empty() {
        let mut cache = ResponseCache::new(4);
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        cache.put("a".into(), "b".into());
        assert!(!cache.is_empty());
        assert_eq!(cache.len(), 1);
    }
}
