//! Player process control.
//!
//! [`ProcessControl`] is the seam between the supervisor and the operating
//! system: launching the player detached from the caller and killing a
//! process by id. [`SystemProcessControl`] is the real implementation; tests
//! substitute a recording fake.

use std::io;
use std::process::{Command, Stdio};

/// Outcome of a termination attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The process existed and was killed.
    Killed,
    /// No process with that id exists (already stopped).
    NotRunning,
}

/// Launches and kills player processes.
pub trait ProcessControl: Send + Sync {
    /// Launches `argv[0]` with the remaining arguments as a background
    /// process with all standard streams discarded, returning its id.
    ///
    /// The caller never waits on the child.
    fn spawn(&self, argv: &[String]) -> io::Result<u32>;

    /// Kills the process with the given id.
    ///
    /// A missing process is `Ok(Termination::NotRunning)`, not an error.
    fn terminate(&self, pid: u32) -> io::Result<Termination>;
}

/// Operating-system process control.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessControl;

impl ProcessControl for SystemProcessControl {
    fn spawn(&self, argv: &[String]) -> io::Result<u32> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command line"))?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach(&mut command);

        let mut child = command.spawn()?;
        let pid = child.id();
        reap(pid, move || child.wait());
        Ok(pid)
    }

    fn terminate(&self, pid: u32) -> io::Result<Termination> {
        if pid == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "refusing to signal pid 0",
            ));
        }

        #[cfg(unix)]
        return terminate_unix(pid);

        #[cfg(windows)]
        return terminate_windows(pid);

        #[cfg(not(any(unix, windows)))]
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "process termination is not supported on this platform",
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Platform Details
// ─────────────────────────────────────────────────────────────────────────────

/// Waits for the player on a background thread so that a killed or finished
/// player does not linger as a zombie while the host keeps running.
fn reap<W>(pid: u32, wait: W)
where
    W: FnOnce() -> io::Result<std::process::ExitStatus> + Send + 'static,
{
    let spawned = std::thread::Builder::new()
        .name(format!("reap-{pid}"))
        .spawn(move || match wait() {
            Ok(status) => log::debug!("[Process] Player pid {} exited: {}", pid, status),
            Err(e) => log::warn!("[Process] Failed to wait on player pid {}: {}", pid, e),
        });
    if let Err(e) = spawned {
        log::warn!("[Process] Could not start reaper for pid {}: {}", pid, e);
    }
}

/// Puts the child in its own process group so terminal signals aimed at the
/// caller do not reach the player.
#[cfg(unix)]
fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(windows)]
fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    use windows_sys::Win32::System::Threading::{CREATE_NEW_PROCESS_GROUP, DETACHED_PROCESS};
    command.creation_flags(CREATE_NEW_PROCESS_GROUP | DETACHED_PROCESS);
}

#[cfg(not(any(unix, windows)))]
fn detach(_command: &mut Command) {}

#[cfg(unix)]
fn terminate_unix(pid: u32) -> io::Result<Termination> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

    // SAFETY: kill(2) has no memory-safety preconditions; pid is positive so
    // only that single process is targeted.
    let result = unsafe { libc::kill(pid, libc::SIGKILL) };
    if result == 0 {
        return Ok(Termination::Killed);
    }

    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(Termination::NotRunning)
    } else {
        Err(err)
    }
}

#[cfg(windows)]
fn terminate_windows(pid: u32) -> io::Result<Termination> {
    use windows_sys::Win32::Foundation::{CloseHandle, ERROR_INVALID_PARAMETER};
    use windows_sys::Win32::System::Threading::{
        OpenProcess, TerminateProcess, PROCESS_TERMINATE,
    };

    // SAFETY: OpenProcess returns either a valid handle we own or null.
    let handle = unsafe { OpenProcess(PROCESS_TERMINATE, 0, pid) };
    if handle.is_null() {
        let err = io::Error::last_os_error();
        return if err.raw_os_error() == Some(ERROR_INVALID_PARAMETER as i32) {
            Ok(Termination::NotRunning)
        } else {
            Err(err)
        };
    }

    // SAFETY: handle is valid and closed exactly once below.
    let result = unsafe { TerminateProcess(handle, 1) };
    let err = io::Error::last_os_error();
    unsafe {
        CloseHandle(handle);
    }

    if result != 0 {
        Ok(Termination::Killed)
    } else {
        Err(err)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn spawn_rejects_empty_command_line() {
        let err = SystemProcessControl.spawn(&[]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn spawn_reports_missing_executable() {
        let argv = vec!["/nonexistent/ambient-player-test-binary".to_string()];
        assert!(SystemProcessControl.spawn(&argv).is_err());
    }

    #[test]
    fn terminate_refuses_pid_zero() {
        assert!(SystemProcessControl.terminate(0).is_err());
    }

    #[test]
    fn spawn_then_terminate_real_process() {
        let argv = vec!["sleep".to_string(), "30".to_string()];
        let pid = SystemProcessControl.spawn(&argv).unwrap();
        assert!(pid > 0);
        assert_eq!(
            SystemProcessControl.terminate(pid).unwrap(),
            Termination::Killed
        );
    }

    /// Process state letter from `/proc/<pid>/stat`, `None` once reaped.
    #[cfg(target_os = "linux")]
    fn proc_state(pid: u32) -> Option<char> {
        let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
        let (_, rest) = stat.rsplit_once(')')?;
        rest.trim_start().chars().next()
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn killed_player_is_reaped() {
        let argv = vec!["sleep".to_string(), "30".to_string()];
        let pid = SystemProcessControl.spawn(&argv).unwrap();
        assert_eq!(
            SystemProcessControl.terminate(pid).unwrap(),
            Termination::Killed
        );

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while proc_state(pid).is_some() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert_eq!(proc_state(pid), None);
    }

    #[test]
    fn terminate_missing_process_is_not_running() {
        // Above the largest pid_max any supported kernel allows.
        let pid = i32::MAX as u32;
        assert_eq!(
            SystemProcessControl.terminate(pid).unwrap(),
            Termination::NotRunning
        );
    }
}
