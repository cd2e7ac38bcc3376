//! Fixed-window request counting per client key.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;

use crate::config::RateLimitConfig;

/// Key used when the caller cannot be identified.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: Instant,
}

/// Process-wide limiter. The whole check-and-increment runs under one lock so
/// concurrent requests for the same key can never push `count` past the max.
///
/// Entries are never evicted; one entry is kept per distinct key seen.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.window, config.max_requests)
    }

    /// Returns `true` if the request is allowed and records it.
    pub fn check_and_record(&self, key: &str) -> bool {
        self.check_and_record_at(key, Instant::now())
    }

    pub fn check_and_record_at(&self, key: &str, now: Instant) -> bool {
        // A poisoned map is still structurally valid
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        match entries.get_mut(key) {
            Some(entry) if now <= entry.window_reset_at => {
                if entry.count >= self.max_requests {
                    return false;
                }
                entry.count += 1;
                true
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    RateLimitEntry {
                        count: 1,
                        window_reset_at: now + self.window,
                    },
                );
                true
            }
        }
    }

    pub fn entry(&self, key: &str) -> Option<RateLimitEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).copied()
    }

    pub fn tracked_keys(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }
}

/// First address of `x-forwarded-for`, or [`UNKNOWN_CLIENT`].
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}
