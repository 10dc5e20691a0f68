//! # fetchmail-wakeup
//!
//! Wakes a daemonized fetchmail as soon as an IMAP client shows activity
//! (IDLE, STATUS, NOOP, NOTIFY) instead of waiting for its next poll.
//!
//! ## Flow
//!
//! ```text
//! client command → intercept (tracked?) → engine
//!     → config::resolve      (interval, helper, pid file)
//!     → RateLimiter          (suppress if fired < interval ago for this command)
//!     → Dispatcher           (run helper and wait, or SIGUSR1 the pid file's pid)
//! ```
//!
//! ## Design Principles
//!
//! - **Synchronous**: no async runtime. The helper path blocks the calling
//!   session until the helper exits.
//! - **Never fatal**: wake errors are logged and returned as outcomes; the
//!   intercepted command always runs.
//! - **No hidden globals**: the rate limiter belongs to a [`WakeEngine`] value.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fetchmail_wakeup::{EnvSettings, WakeEngine};
//!
//! let engine = WakeEngine::default();
//! engine.on_command_start("IDLE", &EnvSettings);
//! ```

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod intercept;
pub mod pid;
pub mod rate_limit;
pub mod settings;

pub use config::{resolve, tracked_commands, TrackedCommands, WakeConfiguration};
pub use dispatch::{Dispatcher, SystemBackend, WakeBackend, WakeOutcome};
pub use engine::{WakeDecision, WakeEngine};
pub use error::{ErrorKind, Result, WakeError};
pub use intercept::{CommandContext, CommandHandler, CommandTable, HookOutcome, WakeInterceptor};
pub use rate_limit::{Clock, RateLimiter, SystemClock};
pub use settings::{EnvSettings, Layered, SettingsFile, SettingsLookup};
