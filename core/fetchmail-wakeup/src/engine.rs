//! The wake policy engine: configuration, rate limiting, dispatch.

use crate::config::{self, WakeConfiguration};
use crate::dispatch::{Dispatcher, WakeOutcome};
use crate::rate_limit::{Clock, RateLimiter, SystemClock};
use crate::settings::SettingsLookup;
use std::sync::Arc;
use tracing::debug;

/// What happened to one intercepted command.
#[derive(Debug)]
pub enum WakeDecision {
    /// A wake-up for this command already fired within the interval.
    Suppressed,
    Dispatched(WakeOutcome),
}

impl WakeDecision {
    pub fn was_dispatched(&self) -> bool {
        matches!(self, WakeDecision::Dispatched(_))
    }
}

pub struct WakeEngine {
    limiter: RateLimiter,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
}

impl Default for WakeEngine {
    fn default() -> Self {
        Self::new(RateLimiter::new(), Dispatcher::default(), Arc::new(SystemClock))
    }
}

impl WakeEngine {
    pub fn new(limiter: RateLimiter, dispatcher: Dispatcher, clock: Arc<dyn Clock>) -> Self {
        Self {
            limiter,
            dispatcher,
            clock,
        }
    }

    /// Called synchronously before `command` runs.
    ///
    /// Never fails: every problem ends up logged inside the returned decision,
    /// and the caller goes on to run the real command either way.
    pub fn on_command_start(&self, command: &str, settings: &dyn SettingsLookup) -> WakeDecision {
        let config = config::resolve(command, settings);
        self.wake(command, &config)
    }

    /// Rate-limits and dispatches with an already resolved configuration.
    pub fn wake(&self, command: &str, config: &WakeConfiguration) -> WakeDecision {
        let now = self.clock.now_millis();
        if self
            .limiter
            .should_suppress(command, config.interval_millis, now)
        {
            debug!(
                command,
                interval_ms = config.interval_millis,
                "fetchmail wake-up rate limited"
            );
            return WakeDecision::Suppressed;
        }

        let outcome = self.dispatcher.dispatch(config);
        debug!(command, outcome = ?outcome, "fetchmail wake-up dispatched");
        WakeDecision::Dispatched(outcome)
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}
