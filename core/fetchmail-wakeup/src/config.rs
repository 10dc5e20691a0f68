//! Resolution of the effective wake configuration for one command.
//!
//! Interval precedence, least to most specific:
//!
//! ```text
//! DEFAULT_INTERVAL_SECS → fetchmail_interval → fetchmail_interval_<command>
//! ```
//!
//! Intervals are configured in seconds and resolved to milliseconds. A value
//! that isn't a non-negative integer is logged and ignored, keeping whatever
//! the less specific layer produced. `0` disables rate limiting.

use crate::error::WakeError;
use crate::settings::SettingsLookup;
use std::path::PathBuf;
use tracing::warn;

pub const KEY_HELPER: &str = "fetchmail_helper";
pub const KEY_PIDFILE: &str = "fetchmail_pidfile";
pub const KEY_INTERVAL: &str = "fetchmail_interval";
pub const KEY_INTERVAL_PREFIX: &str = "fetchmail_interval_";
pub const KEY_COMMANDS: &str = "fetchmail_commands";

/// Seconds between two wake-ups when nothing is configured.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Longest command-name fragment used when building per-command keys.
pub const MAX_COMMAND_KEY_LEN: usize = 16;

/// Commands intercepted when `fetchmail_commands` is unset.
pub const DEFAULT_COMMANDS: &[&str] = &["IDLE", "STATUS", "NOOP", "NOTIFY"];

/// Effective settings for one wake attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeConfiguration {
    /// Minimum spacing between wake-ups for one command; 0 disables limiting.
    pub interval_millis: u64,
    /// External command line; wins over `pid_file` when present.
    pub helper_command: Option<String>,
    pub pid_file: Option<PathBuf>,
}

impl Default for WakeConfiguration {
    fn default() -> Self {
        Self {
            interval_millis: DEFAULT_INTERVAL_SECS * 1000,
            helper_command: None,
            pid_file: None,
        }
    }
}

/// Resolves the configuration that applies to `command` in this session.
pub fn resolve(command: &str, settings: &dyn SettingsLookup) -> WakeConfiguration {
    let mut interval_secs = DEFAULT_INTERVAL_SECS;
    if let Some(secs) = interval_setting(settings, KEY_INTERVAL) {
        interval_secs = secs;
    }
    if let Some(secs) = interval_setting(settings, &command_interval_key(command)) {
        interval_secs = secs;
    }

    WakeConfiguration {
        interval_millis: interval_secs.saturating_mul(1000),
        helper_command: non_blank(settings.get(KEY_HELPER)),
        pid_file: non_blank(settings.get(KEY_PIDFILE)).map(|path| expand_home(&path)),
    }
}

/// Builds the per-command interval key, e.g. `fetchmail_interval_idle`.
///
/// Only the key is truncated; the full command name is still used for rate
/// limiting and logging.
pub fn command_interval_key(command: &str) -> String {
    let fragment: String = command
        .chars()
        .take(MAX_COMMAND_KEY_LEN)
        .flat_map(char::to_lowercase)
        .collect();
    format!("{}{}", KEY_INTERVAL_PREFIX, fragment)
}

fn interval_setting(settings: &dyn SettingsLookup, key: &str) -> Option<u64> {
    let raw = settings.get(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(_) => {
            let err = WakeError::ConfigParse {
                key: key.to_string(),
                value: raw,
            };
            warn!(kind = ?err.kind(), "{}; ignoring", err);
            None
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// The set of command names that trigger a wake attempt.
///
/// Names are stored upper-cased and unique; lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedCommands {
    names: Vec<String>,
}

impl Default for TrackedCommands {
    fn default() -> Self {
        Self::from_names(DEFAULT_COMMANDS.iter().copied())
    }
}

impl TrackedCommands {
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.trim().to_ascii_uppercase();
            if !name.is_empty() && !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self { names: unique }
    }

    /// Parses a comma and/or whitespace separated list.
    pub fn parse(list: &str) -> Self {
        Self::from_names(list.split(|c: char| c == ',' || c.is_whitespace()))
    }

    /// Returns the tracked entry matching `command`, if any.
    pub fn matching(&self, command: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|name| name.eq_ignore_ascii_case(command))
            .map(String::as_str)
    }

    pub fn contains(&self, command: &str) -> bool {
        self.matching(command).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Resolves the tracked command set for a session.
pub fn tracked_commands(settings: &dyn SettingsLookup) -> TrackedCommands {
    match settings.get(KEY_COMMANDS) {
        Some(list) => {
            let parsed = TrackedCommands::parse(&list);
            if parsed.is_empty() {
                warn!(key = KEY_COMMANDS, value = %list, "empty command list; using defaults");
                TrackedCommands::default()
            } else {
                parsed
            }
        }
        None => TrackedCommands::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_settings() {
        let config = resolve("IDLE", &settings(&[]));
        assert_eq!(config, WakeConfiguration::default());
        assert_eq!(config.interval_millis, 60_000);
    }

    #[test]
    fn per_command_interval_overrides_global() {
        let s = settings(&[
            ("fetchmail_interval", "120"),
            ("fetchmail_interval_idle", "5"),
        ]);
        assert_eq!(resolve("IDLE", &s).interval_millis, 5_000);
        assert_eq!(resolve("STATUS", &s).interval_millis, 120_000);
    }

    #[test]
    fn zero_interval_is_accepted() {
        let s = settings(&[("fetchmail_interval", "0")]);
        assert_eq!(resolve("NOOP", &s).interval_millis, 0);
    }

    #[test]
    fn malformed_global_falls_back_to_default() {
        for bad in ["-5", "soon", "1.5", ""] {
            let s = settings(&[("fetchmail_interval", bad)]);
            assert_eq!(resolve("IDLE", &s).interval_millis, 60_000, "value {bad:?}");
        }
    }

    #[test]
    fn malformed_per_command_falls_back_to_global() {
        let s = settings(&[
            ("fetchmail_interval", "30"),
            ("fetchmail_interval_idle", "-1"),
        ]);
        assert_eq!(resolve("IDLE", &s).interval_millis, 30_000);
    }

    #[test]
    fn interval_tolerates_surrounding_whitespace() {
        let s = settings(&[("fetchmail_interval", " 15 \n")]);
        assert_eq!(resolve("IDLE", &s).interval_millis, 15_000);
    }

    #[test]
    fn huge_interval_saturates() {
        let s = settings(&[("fetchmail_interval", &u64::MAX.to_string())]);
        assert_eq!(resolve("IDLE", &s).interval_millis, u64::MAX);
    }

    #[test]
    fn command_key_is_lowercased_and_truncated() {
        assert_eq!(command_interval_key("IDLE"), "fetchmail_interval_idle");
        assert_eq!(
            command_interval_key("AVERYLONGCOMMANDNAMEINDEED"),
            "fetchmail_interval_averylongcommand"
        );
    }

    #[test]
    fn truncated_key_applies_to_long_command() {
        let s = settings(&[("fetchmail_interval_averylongcommand", "7")]);
        assert_eq!(
            resolve("AVERYLONGCOMMANDNAMEINDEED", &s).interval_millis,
            7_000
        );
    }

    #[test]
    fn helper_and_pidfile_are_trimmed_and_blank_is_none() {
        let s = settings(&[
            ("fetchmail_helper", "  /usr/bin/wake --now "),
            ("fetchmail_pidfile", "   "),
        ]);
        let config = resolve("IDLE", &s);
        assert_eq!(config.helper_command.as_deref(), Some("/usr/bin/wake --now"));
        assert_eq!(config.pid_file, None);
    }

    #[test]
    fn pidfile_expands_home() {
        let s = settings(&[("fetchmail_pidfile", "~/.fetchmail.pid")]);
        let config = resolve("IDLE", &s);
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.pid_file, Some(home.join(".fetchmail.pid")));
        }
    }

    #[test]
    fn tracked_commands_default_set() {
        let tracked = tracked_commands(&settings(&[]));
        let names: Vec<_> = tracked.iter().collect();
        assert_eq!(names, vec!["IDLE", "STATUS", "NOOP", "NOTIFY"]);
    }

    #[test]
    fn tracked_commands_parse_mixed_separators_and_dedup() {
        let tracked = tracked_commands(&settings(&[(
            "fetchmail_commands",
            "idle, Status  noop,IDLE",
        )]));
        let names: Vec<_> = tracked.iter().collect();
        assert_eq!(names, vec!["IDLE", "STATUS", "NOOP"]);
        assert_eq!(tracked.matching("Idle"), Some("IDLE"));
        assert!(!tracked.contains("NOTIFY"));
    }

    #[test]
    fn blank_command_list_uses_defaults() {
        let tracked = tracked_commands(&settings(&[("fetchmail_commands", " , ")]));
        assert_eq!(tracked, TrackedCommands::default());
    }
}
