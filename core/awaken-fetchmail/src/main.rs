//! awaken-fetchmail: send SIGUSR1 to a fetchmail daemon to make it poll now.
//!
//! Reads the daemon's pid from its pid file (default
//! `/var/run/fetchmail/fetchmail.pid`, overridable through
//! `AWAKEN_FETCHMAIL_PIDFILE`) and signals it. Meant to be used as the
//! `fetchmail_helper` of the IMAP plugin, or from cron/shell hooks.
//!
//! Exit status is 0 only when the signal was delivered.

mod logging;

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use fetchmail_wakeup::pid;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DEFAULT_PIDFILE: &str = "/var/run/fetchmail/fetchmail.pid";
const PIDFILE_ENV: &str = "AWAKEN_FETCHMAIL_PIDFILE";
const PROGRAM: &str = "awaken-fetchmail";

#[derive(Parser, Debug)]
#[command(name = "awaken-fetchmail")]
#[command(about = "Wake a running fetchmail daemon by sending it SIGUSR1")]
struct Cli {
    /// Be quiet: suppress logging error messages
    #[arg(short, long)]
    quiet: bool,

    /// Be verbose: log informational messages
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn verbosity(&self) -> logging::Verbosity {
        if self.quiet {
            logging::Verbosity::Quiet
        } else if self.verbose {
            logging::Verbosity::Verbose
        } else {
            logging::Verbosity::Normal
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.kind() == ClapErrorKind::DisplayHelp => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            eprintln!("Usage:  {} [<options>]", PROGRAM);
            eprintln!("For help, type: {} -h", PROGRAM);
            return ExitCode::FAILURE;
        }
    };

    let _logging_guard = logging::init(cli.verbosity());

    let path = pidfile_path();
    match awaken(&path) {
        Ok(pid) => {
            tracing::info!(pid, "sending signal SIGUSR1 to PID {}", pid);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(path = %path.display(), "{}", err);
            ExitCode::FAILURE
        }
    }
}

fn pidfile_path() -> PathBuf {
    env::var_os(PIDFILE_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PIDFILE))
}

/// Reads the pid from `path` and signals it.
fn awaken(path: &Path) -> fetchmail_wakeup::Result<i32> {
    let pid = pid::read_pid(path)?;
    pid::send_wake_signal(pid)?;
    Ok(pid)
}
