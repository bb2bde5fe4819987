//! Advisory, process-local admission control keyed by an identifier (usually the topic).
//!
//! Not a distributed lock: separate processes keep separate counters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window counter per identifier.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_millis(max_requests: u32, window_ms: u64) -> Self {
        Self::new(max_requests, Duration::from_millis(window_ms))
    }

    /// Returns true and counts the call if `identifier` still has quota in its window.
    /// A denied check leaves the counter untouched.
    pub fn check(&self, identifier: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.lock();

        match entries.get_mut(identifier) {
            Some(entry) if now <= entry.reset_at => {
                if entry.count < self.max_requests {
                    entry.count += 1;
                    true
                } else {
                    warn!(identifier, count = entry.count, "rate limit reached");
                    false
                }
            }
            _ => {
                entries.insert(
                    identifier.to_string(),
                    Window {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                true
            }
        }
    }

    /// Calls left for `identifier` in its current window.
    pub fn remaining(&self, identifier: &str) -> u32 {
        let now = Instant::now();
        match self.lock().get(identifier) {
            Some(entry) if now <= entry.reset_at => self.max_requests.saturating_sub(entry.count),
            _ => self.max_requests,
        }
    }

    /// Drops every window whose reset time has passed. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.reset_at);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "rate limiter cleanup");
        }
        removed
    }

    pub fn tracked(&self) -> usize {
        self.lock().len()
    }

    /// Runs `cleanup` every `every` until the returned handle is aborted.
    pub fn spawn_cleanup(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                self.cleanup();
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Window>> {
        // The map holds plain counters, so a poisoned lock is still consistent.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
