//! Rate Limiting Infrastructure
//!
//! Sliding-window request counters keyed by client identity
//! (IP + route). The counter is mutated on every call, allowed or not.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::crypto::sha256;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(10 * 60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Rate limit check result
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Check and increment the counter for an identity.
    ///
    /// Mutates the stored counter regardless of the allow/deny outcome.
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitDecision, Box<dyn std::error::Error + Send + Sync>>;
}

// ============================================================================
// In-memory store (sharded)
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    window_start_ms: i64,
    count: u32,
}

const SHARD_COUNT: usize = 16;

/// Sharded in-memory rate-limit store.
///
/// Each identity maps to one shard; a shard's counters are updated under
/// its own mutex, so concurrent requests for different identities do not
/// contend on a global lock.
pub struct MemoryRateLimitStore {
    shards: Vec<Mutex<HashMap<String, WindowEntry>>>,
}

impl Default for MemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard_for(&self, key: &str) -> &Mutex<HashMap<String, WindowEntry>> {
        let hash = sha256(key.as_bytes());
        &self.shards[hash[0] as usize % SHARD_COUNT]
    }

    /// Core window logic, with an injectable clock for tests.
    fn check_at(&self, key: &str, config: &RateLimitConfig, now_ms: i64) -> RateLimitDecision {
        let mut shard = self.shard_for(key).lock().expect("rate-limit shard poisoned");

        let entry = shard
            .entry(key.to_string())
            .and_modify(|e| {
                if now_ms > e.window_start_ms + config.window_ms() {
                    // Window elapsed: start a fresh one
                    e.window_start_ms = now_ms;
                    e.count = 1;
                } else {
                    e.count += 1;
                }
            })
            .or_insert(WindowEntry {
                window_start_ms: now_ms,
                count: 1,
            });

        RateLimitDecision {
            allowed: entry.count <= config.max_requests,
            remaining: config.max_requests.saturating_sub(entry.count),
            reset_at_ms: entry.window_start_ms + config.window_ms(),
        }
    }

    /// Drop windows whose reset time is in the past.
    pub fn cleanup_expired(&self, config: &RateLimitConfig) -> usize {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut removed = 0;
        for shard in &self.shards {
            let mut shard = shard.lock().expect("rate-limit shard poisoned");
            let before = shard.len();
            shard.retain(|_, e| e.window_start_ms + config.window_ms() >= now_ms);
            removed += before - shard.len();
        }
        removed
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitDecision, Box<dyn std::error::Error + Send + Sync>> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let decision = self.check_at(key, config, now_ms);

        if !decision.allowed {
            tracing::warn!(key = %key, "Rate limit exceeded");
        }

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RateLimitConfig {
        RateLimitConfig::new(5, 600)
    }

    #[test]
    fn test_first_request_allowed() {
        let store = MemoryRateLimitStore::new();
        let decision = store.check_at("1.2.3.4:/auth/login", &config(), 1_000);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
    }

    #[test]
    fn test_sixth_request_denied() {
        let store = MemoryRateLimitStore::new();
        let key = "1.2.3.4:/auth/login";

        for _ in 0..5 {
            assert!(store.check_at(key, &config(), 1_000).allowed);
        }
        let sixth = store.check_at(key, &config(), 1_000);
        assert!(!sixth.allowed);
        assert_eq!(sixth.remaining, 0);
    }

    #[test]
    fn test_fresh_window_allows_after_denials() {
        let store = MemoryRateLimitStore::new();
        let key = "1.2.3.4:/auth/login";
        let cfg = config();

        for _ in 0..8 {
            store.check_at(key, &cfg, 1_000);
        }
        assert!(!store.check_at(key, &cfg, 1_000).allowed);

        // Just past window_start + window
        let later = 1_000 + cfg.window_ms() + 1;
        let decision = store.check_at(key, &cfg, later);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
    }

    #[test]
    fn test_denied_requests_still_count() {
        let store = MemoryRateLimitStore::new();
        let key = "1.2.3.4:/auth/login";
        let cfg = config();

        for _ in 0..6 {
            store.check_at(key, &cfg, 1_000);
        }
        // The denied 6th call still advanced the counter
        let seventh = store.check_at(key, &cfg, 1_000);
        assert!(!seventh.allowed);
    }

    #[test]
    fn test_identities_are_independent() {
        let store = MemoryRateLimitStore::new();
        let cfg = config();

        for _ in 0..6 {
            store.check_at("1.2.3.4:/auth/login", &cfg, 1_000);
        }
        // A different identity is unaffected
        assert!(store.check_at("5.6.7.8:/auth/login", &cfg, 1_000).allowed);
        assert!(store.check_at("1.2.3.4:/auth/registration", &cfg, 1_000).allowed);
    }

    #[test]
    fn test_cleanup_expired() {
        let store = MemoryRateLimitStore::new();
        let cfg = config();

        // An ancient window from far in the past
        store.check_at("old", &cfg, 0);
        assert_eq!(store.cleanup_expired(&cfg), 1);
    }
}
