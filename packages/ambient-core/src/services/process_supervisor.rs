//! Player process lifecycle.
//!
//! The supervisor launches the player, records its id in the
//! [`SessionStore`], and kills the recorded process on request. Stopping is
//! best-effort: a stale, dead or unreadable previous session is logged and
//! never blocks starting a new one.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::process::{ProcessControl, Termination};
use crate::services::session_store::{SessionHandle, SessionStore};

/// Owns the player process lifecycle.
pub struct ProcessSupervisor {
    store: Arc<dyn SessionStore>,
    process: Arc<dyn ProcessControl>,
    /// Serializes read-modify-write access to the store.
    lock: Mutex<()>,
}

impl ProcessSupervisor {
    pub fn new(store: Arc<dyn SessionStore>, process: Arc<dyn ProcessControl>) -> Self {
        Self {
            store,
            process,
            lock: Mutex::new(()),
        }
    }

    /// Returns the persisted handle, if any.
    pub fn current(&self) -> Option<SessionHandle> {
        let _guard = self.lock.lock();
        self.load()
    }

    /// Kills the recorded process, if any.
    ///
    /// Returns the handle that was targeted. Never fails: termination errors
    /// are logged and swallowed. The record itself is left in place.
    pub fn stop(&self) -> Option<SessionHandle> {
        let _guard = self.lock.lock();
        let Some(handle) = self.load() else {
            log::debug!("[Supervisor] No pid recorded, player already stopped");
            return None;
        };
        self.kill(handle);
        Some(handle)
    }

    /// Kills and forgets `expected`, but only while it is still the recorded
    /// handle.
    ///
    /// Returns `false` without touching anything when a newer session (or no
    /// session) is recorded.
    pub fn stop_if_current(&self, expected: SessionHandle) -> bool {
        let _guard = self.lock.lock();
        if self.load() != Some(expected) {
            log::debug!(
                "[Supervisor] Session pid {} is no longer current, leaving it",
                expected.process_id
            );
            return false;
        }
        self.kill(expected);
        self.clear_locked();
        true
    }

    /// Launches the player and records it as the current session.
    ///
    /// The caller must have stopped the previous session first. A failure to
    /// persist the handle is logged; the running process is still returned.
    pub fn start(&self, argv: &[String]) -> io::Result<SessionHandle> {
        let _guard = self.lock.lock();
        let pid = self.process.spawn(argv)?;
        let handle = SessionHandle::new(pid);
        if let Err(e) = self.store.save(handle) {
            log::error!("[Supervisor] Failed to record player pid {}: {}", pid, e);
        }
        log::debug!("[Supervisor] Player started, pid: {}", pid);
        Ok(handle)
    }

    /// Empties the record without killing anything.
    pub fn clear_handle(&self) {
        let _guard = self.lock.lock();
        self.clear_locked();
    }

    fn load(&self) -> Option<SessionHandle> {
        match self.store.load() {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("[Supervisor] Failed to read recorded pid: {}", e);
                None
            }
        }
    }

    fn kill(&self, handle: SessionHandle) {
        let pid = handle.process_id;
        log::debug!("[Supervisor] Loaded pid: {}", pid);
        match self.process.terminate(pid) {
            Ok(Termination::Killed) => {
                log::debug!("[Supervisor] Player process with pid {} killed", pid)
            }
            Ok(Termination::NotRunning) => {
                log::debug!("[Supervisor] Process with pid {} does not exist", pid)
            }
            Err(e) => log::warn!("[Supervisor] Failed to kill pid {}: {}", pid, e),
        }
    }

    fn clear_locked(&self) {
        if let Err(e) = self.store.clear() {
            log::error!("[Supervisor] Failed to clear recorded pid: {}", e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::FakeProcessControl;
    use super::*;
    use crate::services::session_store::InMemorySessionStore;

    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn load(&self) -> io::Result<Option<SessionHandle>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
        fn save(&self, _handle: SessionHandle) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
        fn clear(&self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    fn supervisor() -> (Arc<InMemorySessionStore>, Arc<FakeProcessControl>, ProcessSupervisor) {
        let store = Arc::new(InMemorySessionStore::new());
        let process = Arc::new(FakeProcessControl::new());
        let supervisor = ProcessSupervisor::new(store.clone(), process.clone());
        (store, process, supervisor)
    }

    fn argv() -> Vec<String> {
        vec!["/usr/bin/mplayer".into(), "forest.mp3".into()]
    }

    #[test]
    fn stop_without_handle_is_noop() {
        let (_store, process, supervisor) = supervisor();
        assert_eq!(supervisor.stop(), None);
        assert!(process.killed.lock().is_empty());
    }

    #[test]
    fn start_records_handle() {
        let (store, process, supervisor) = supervisor();
        let handle = supervisor.start(&argv()).unwrap();
        assert_eq!(store.load().unwrap(), Some(handle));
        assert_eq!(process.spawn_count(), 1);
        assert_eq!(process.spawned.lock()[0], argv());
    }

    #[test]
    fn stop_kills_recorded_process_and_keeps_record() {
        let (store, process, supervisor) = supervisor();
        let handle = supervisor.start(&argv()).unwrap();
        assert_eq!(supervisor.stop(), Some(handle));
        assert!(!process.is_running(handle.process_id));
        assert_eq!(store.load().unwrap(), Some(handle));
    }

    #[test]
    fn stop_of_dead_process_is_success() {
        let (store, process, supervisor) = supervisor();
        store.save(SessionHandle::new(4242)).unwrap();
        assert_eq!(supervisor.stop(), Some(SessionHandle::new(4242)));
        assert_eq!(*process.killed.lock(), vec![4242]);
    }

    #[test]
    fn stop_swallows_termination_errors() {
        let store = Arc::new(InMemorySessionStore::new());
        let process = Arc::new(FakeProcessControl {
            fail_terminate: true,
            ..FakeProcessControl::new()
        });
        let supervisor = ProcessSupervisor::new(store.clone(), process);
        store.save(SessionHandle::new(7)).unwrap();
        assert_eq!(supervisor.stop(), Some(SessionHandle::new(7)));
    }

    #[test]
    fn broken_store_never_blocks_start() {
        let process = Arc::new(FakeProcessControl::new());
        let supervisor = ProcessSupervisor::new(Arc::new(BrokenStore), process.clone());
        assert_eq!(supervisor.stop(), None);
        let handle = supervisor.start(&argv()).unwrap();
        assert!(process.is_running(handle.process_id));
        supervisor.clear_handle();
    }

    #[test]
    fn start_propagates_spawn_failure() {
        let store = Arc::new(InMemorySessionStore::new());
        let process = Arc::new(FakeProcessControl {
            fail_spawn: true,
            ..FakeProcessControl::new()
        });
        let supervisor = ProcessSupervisor::new(store.clone(), process);
        assert!(supervisor.start(&argv()).is_err());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn clear_handle_does_not_kill() {
        let (store, process, supervisor) = supervisor();
        let handle = supervisor.start(&argv()).unwrap();
        supervisor.clear_handle();
        assert_eq!(store.load().unwrap(), None);
        assert!(process.is_running(handle.process_id));
    }

    #[test]
    fn stop_if_current_only_targets_matching_handle() {
        let (store, process, supervisor) = supervisor();
        let first = supervisor.start(&argv()).unwrap();
        supervisor.stop();
        let second = supervisor.start(&argv()).unwrap();

        assert!(!supervisor.stop_if_current(first));
        assert!(process.is_running(second.process_id));
        assert_eq!(store.load().unwrap(), Some(second));

        assert!(supervisor.stop_if_current(second));
        assert!(!process.is_running(second.process_id));
        assert_eq!(store.load().unwrap(), None);
    }
}
