//! Per-command rate limiting of wake-ups.
//!
//! Each tracked command keeps the time of its last non-suppressed wake
//! attempt. A new attempt is suppressed while fewer than `interval` ms have
//! elapsed since then. Suppressed attempts don't move the window.
//!
//! The table lives in this value only. Hosts that run one process per IMAP
//! session therefore get a per-process limiter: at most one wake per process
//! per window per command.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Source of the current time in milliseconds.
///
/// `None` means the clock could not be read.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> Option<u64>;
}

/// Wall clock; reads before the Unix epoch count as a failed read.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Option<u64> {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
        u64::try_from(elapsed.as_millis()).ok()
    }
}

#[derive(Debug, Default)]
pub struct RateLimiter {
    last_fired: Mutex<HashMap<String, u64>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a wake attempt for `command` should be dropped.
    ///
    /// - `interval_millis == 0` disables limiting and leaves state alone.
    /// - `now == None` fails open: never suppress when time is unknown.
    /// - A clock that moved backwards counts as "interval elapsed".
    pub fn should_suppress(&self, command: &str, interval_millis: u64, now: Option<u64>) -> bool {
        if interval_millis == 0 {
            return false;
        }

        let Some(now) = now else {
            warn!(command, "Clock read failed; not rate limiting wake-up");
            return false;
        };

        let key = command.to_ascii_uppercase();
        // A poisoned table only ever costs an extra wake-up, so keep going.
        let mut table = self
            .last_fired
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed_ok = match table.get(&key) {
            None => true,
            Some(&last) if now < last => true,
            Some(&last) => now - last > interval_millis,
        };

        if elapsed_ok {
            table.insert(key, now);
            false
        } else {
            true
        }
    }

    /// Last non-suppressed attempt recorded for `command`.
    pub fn last_fired(&self, command: &str) -> Option<u64> {
        self.last_fired
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&command.to_ascii_uppercase())
            .copied()
    }
}
