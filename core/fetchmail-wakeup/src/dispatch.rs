//! Wake action: run the helper or signal the pid from the pid file.
//!
//! The helper path blocks the calling session until the helper exits. There is
//! no timeout, so the helper must be quick (send a signal and return); a hung
//! helper delays the intercepted IMAP command indefinitely.

use crate::config::WakeConfiguration;
use crate::error::{Result, WakeError};
use crate::pid;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one wake attempt that got past the rate limiter.
#[derive(Debug)]
pub enum WakeOutcome {
    /// The fetch agent's pid was sent `SIGUSR1`.
    Signaled { pid: i32 },
    /// The helper ran to completion with a success status.
    Helped,
    /// Neither a helper nor a pid file is configured.
    SkippedNoConfig,
    Failed(WakeError),
}

impl WakeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WakeOutcome::Signaled { .. } | WakeOutcome::Helped)
    }
}

/// Process-level operations behind a wake action.
pub trait WakeBackend: Send + Sync {
    /// Sends the wake signal to `pid`.
    fn signal(&self, pid: i32) -> Result<()>;

    /// Runs `program` with `args` and waits for it to exit successfully.
    fn run_helper(&self, program: &str, args: &[&str]) -> Result<()>;
}

/// Real signals and real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBackend;

impl WakeBackend for SystemBackend {
    fn signal(&self, pid: i32) -> Result<()> {
        pid::send_wake_signal(pid)
    }

    fn run_helper(&self, program: &str, args: &[&str]) -> Result<()> {
        let status = Command::new(program).args(args).status().map_err(|source| {
            WakeError::HelperUnavailable {
                program: program.to_string(),
                source,
            }
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(WakeError::HelperExited {
                program: program.to_string(),
                status: status.to_string(),
            })
        }
    }
}

pub struct Dispatcher {
    backend: Arc<dyn WakeBackend>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Arc::new(SystemBackend))
    }
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn WakeBackend>) -> Self {
        Self { backend }
    }

    /// Performs the configured wake action. Failures are logged and returned,
    /// never propagated.
    pub fn dispatch(&self, config: &WakeConfiguration) -> WakeOutcome {
        let outcome = if let Some(helper) = config.helper_command.as_deref() {
            self.run_helper(helper)
        } else if let Some(pid_file) = config.pid_file.as_deref() {
            self.signal_from_pid_file(pid_file)
        } else {
            warn!("{}", WakeError::NotConfigured);
            return WakeOutcome::SkippedNoConfig;
        };

        match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, kind = ?err.kind(), "fetchmail wake-up failed");
                WakeOutcome::Failed(err)
            }
        }
    }

    fn run_helper(&self, helper: &str) -> Result<WakeOutcome> {
        let mut words = helper.split_whitespace();
        let Some(program) = words.next() else {
            return Err(WakeError::NotConfigured);
        };
        let args: Vec<&str> = words.collect();

        self.backend.run_helper(program, &args)?;
        info!(helper = program, "fetchmail helper completed");
        Ok(WakeOutcome::Helped)
    }

    fn signal_from_pid_file(&self, pid_file: &Path) -> Result<WakeOutcome> {
        let pid = pid::read_pid(pid_file)?;
        self.backend.signal(pid)?;
        info!(pid, path = %pid_file.display(), "sent SIGUSR1 to fetchmail");
        Ok(WakeOutcome::Signaled { pid })
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::RecordingBackend;
    use super::*;
    use fs_err as fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn config(helper: Option<&str>, pid_file: Option<PathBuf>) -> WakeConfiguration {
        WakeConfiguration {
            interval_millis: 0,
            helper_command: helper.map(str::to_string),
            pid_file,
        }
    }

    fn recording() -> (Arc<RecordingBackend>, Dispatcher) {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = Dispatcher::new(backend.clone());
        (backend, dispatcher)
    }

    #[test]
    fn nothing_configured_is_skipped() {
        let (backend, dispatcher) = recording();
        let outcome = dispatcher.dispatch(&config(None, None));
        assert!(matches!(outcome, WakeOutcome::SkippedNoConfig));
        assert_eq!(backend.dispatch_count(), 0);
    }

    #[test]
    fn helper_is_split_on_whitespace() {
        let (backend, dispatcher) = recording();
        let outcome = dispatcher.dispatch(&config(Some("/usr/bin/wake  -u\tmail"), None));
        assert!(matches!(outcome, WakeOutcome::Helped));
        assert_eq!(
            backend.helpers.lock().unwrap()[0],
            vec!["/usr/bin/wake", "-u", "mail"]
        );
    }

    #[test]
    fn helper_wins_over_pid_file() {
        let temp = tempdir().unwrap();
        let pid_file = temp.path().join("x.pid");
        fs::write(&pid_file, "4242\n").unwrap();

        let (backend, dispatcher) = recording();
        let outcome = dispatcher.dispatch(&config(Some("/bin/true"), Some(pid_file)));
        assert!(matches!(outcome, WakeOutcome::Helped));
        assert_eq!(backend.signal_count(), 0);
        assert_eq!(backend.helper_count(), 1);
    }

    #[test]
    fn pid_with_trailing_garbage_is_signaled() {
        let temp = tempdir().unwrap();
        let pid_file = temp.path().join("fetchmail.pid");
        fs::write(&pid_file, "42 garbage\n").unwrap();

        let (backend, dispatcher) = recording();
        let outcome = dispatcher.dispatch(&config(None, Some(pid_file)));
        assert!(matches!(outcome, WakeOutcome::Signaled { pid: 42 }));
        assert_eq!(*backend.signals.lock().unwrap(), vec![42]);
    }

    #[test]
    fn invalid_pid_contents_fail_without_signal() {
        let temp = tempdir().unwrap();
        let (backend, dispatcher) = recording();
        for contents in ["0", "-7", "fetchmail"] {
            let pid_file = temp.path().join("fetchmail.pid");
            fs::write(&pid_file, contents).unwrap();
            let outcome = dispatcher.dispatch(&config(None, Some(pid_file)));
            assert!(
                matches!(outcome, WakeOutcome::Failed(WakeError::InvalidPid { .. })),
                "contents {contents:?}"
            );
        }
        assert_eq!(backend.signal_count(), 0);
    }

    #[test]
    fn missing_pid_file_fails() {
        let temp = tempdir().unwrap();
        let (backend, dispatcher) = recording();
        let outcome = dispatcher.dispatch(&config(None, Some(temp.path().join("none.pid"))));
        assert!(matches!(
            outcome,
            WakeOutcome::Failed(WakeError::PidFileUnavailable { .. })
        ));
        assert_eq!(backend.signal_count(), 0);
    }

    #[test]
    fn signal_failure_is_reported() {
        let temp = tempdir().unwrap();
        let pid_file = temp.path().join("fetchmail.pid");
        fs::write(&pid_file, "31337").unwrap();

        let backend = Arc::new(RecordingBackend {
            fail_signal: true,
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(backend);
        let outcome = dispatcher.dispatch(&config(None, Some(pid_file)));
        assert!(matches!(
            outcome,
            WakeOutcome::Failed(WakeError::SignalFailed { pid: 31337, .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn system_backend_runs_true() {
        let dispatcher = Dispatcher::default();
        let outcome = dispatcher.dispatch(&config(Some("/bin/true"), Some("/tmp/x.pid".into())));
        assert!(outcome.is_success());
    }

    #[cfg(unix)]
    #[test]
    fn system_backend_reports_non_zero_exit() {
        let outcome = Dispatcher::default().dispatch(&config(Some("/bin/false"), None));
        assert!(matches!(
            outcome,
            WakeOutcome::Failed(WakeError::HelperExited { .. })
        ));
    }

    #[test]
    fn system_backend_reports_missing_helper() {
        let outcome = Dispatcher::default()
            .dispatch(&config(Some("/nonexistent/fetchmail-wakeup-helper"), None));
        assert!(matches!(
            outcome,
            WakeOutcome::Failed(WakeError::HelperUnavailable { .. })
        ));
    }
}
