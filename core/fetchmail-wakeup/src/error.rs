//! Error types for the wake path.
//!
//! None of these ever reach the intercepted IMAP command: the dispatcher turns
//! them into a [`WakeOutcome::Failed`](crate::dispatch::WakeOutcome) and logs
//! them. Only the standalone sender turns them into a process exit status.

use std::path::PathBuf;

/// Coarse classification used for logging and by callers that only care about
/// which class of problem occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed numeric setting; recovered by falling back.
    ConfigParse,
    /// Settings file, pid file or helper binary is missing or unreadable.
    ResourceUnavailable,
    /// Signal could not be delivered or the helper failed.
    DeliveryFailure,
    /// Neither a helper nor a pid file is configured.
    Misconfiguration,
}

#[derive(Debug, thiserror::Error)]
pub enum WakeError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("{key} must be a non-negative number, got {value:?}")]
    ConfigParse { key: String, value: String },

    #[error("Settings file malformed: {path}: {details}")]
    SettingsMalformed { path: PathBuf, details: String },

    #[error("Settings file unreadable: {path}: {source}")]
    SettingsUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("neither fetchmail_pidfile nor fetchmail_helper given")]
    NotConfigured,

    // ─────────────────────────────────────────────────────────────────────
    // Pid File Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("error opening {path}: {source}")]
    PidFileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading valid pid from {path}")]
    InvalidPid { path: PathBuf },

    // ─────────────────────────────────────────────────────────────────────
    // Delivery Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("refusing to signal pid {pid}")]
    RefusedPid { pid: i32 },

    #[error("unable to send signal SIGUSR1 to PID {pid}: {source}")]
    SignalFailed {
        pid: i32,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run helper {program}: {source}")]
    HelperUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("helper {program} exited unsuccessfully: {status}")]
    HelperExited { program: String, status: String },
}

impl WakeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WakeError::ConfigParse { .. } | WakeError::SettingsMalformed { .. } => {
                ErrorKind::ConfigParse
            }
            WakeError::NotConfigured => ErrorKind::Misconfiguration,
            WakeError::SettingsUnavailable { .. }
            | WakeError::PidFileUnavailable { .. }
            | WakeError::InvalidPid { .. }
            | WakeError::HelperUnavailable { .. } => ErrorKind::ResourceUnavailable,
            WakeError::RefusedPid { .. }
            | WakeError::SignalFailed { .. }
            | WakeError::HelperExited { .. } => ErrorKind::DeliveryFailure,
        }
    }
}

/// Convenience type alias for Results using WakeError.
pub type Result<T> = std::result::Result<T, WakeError>;
