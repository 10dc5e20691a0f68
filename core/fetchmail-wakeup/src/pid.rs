//! Pid file parsing and signal delivery.
//!
//! A pid file is plain text starting with a decimal process id, optionally
//! preceded by whitespace. Anything after the number is ignored, so
//! `"42 garbage\n"` yields 42. Ids `<= 1` are rejected: we never signal init.

use crate::error::{Result, WakeError};
use fs_err as fs;
use std::path::Path;

/// Parses the leading integer of `contents`.
pub fn parse_pid(contents: &str) -> Option<i32> {
    let trimmed = contents.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let value: i32 = rest[..digits_len].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Returns true if `pid` may be signaled.
pub fn is_signalable(pid: i32) -> bool {
    pid > 1
}

/// Reads a pid file and returns a signalable pid.
pub fn read_pid(path: &Path) -> Result<i32> {
    let bytes = fs::read(path).map_err(|source| WakeError::PidFileUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    // Only the leading number matters; undecodable trailing bytes don't.
    match parse_pid(&String::from_utf8_lossy(&bytes)) {
        Some(pid) if is_signalable(pid) => Ok(pid),
        _ => Err(WakeError::InvalidPid {
            path: path.to_path_buf(),
        }),
    }
}

/// Sends `SIGUSR1` to `pid`, which makes a daemonized fetchmail poll at once.
pub fn send_wake_signal(pid: i32) -> Result<()> {
    if !is_signalable(pid) {
        return Err(WakeError::RefusedPid { pid });
    }

    #[cfg(unix)]
    {
        // SAFETY: kill(2) has no memory-safety preconditions; pid > 1 was
        // checked above so this never targets init or a process group.
        #[allow(unsafe_code)]
        let rc = unsafe { libc::kill(pid, libc::SIGUSR1) };
        if rc == 0 {
            Ok(())
        } else {
            Err(WakeError::SignalFailed {
                pid,
                source: std::io::Error::last_os_error(),
            })
        }
    }
    #[cfg(not(unix))]
    {
        Err(WakeError::SignalFailed {
            pid,
            source: std::io::Error::from(std::io::ErrorKind::Unsupported),
        })
    }
}
