//! Session handle storage.
//!
//! Holds the single record of the last-launched player process. There is no
//! history: saving overwrites, clearing empties.

use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;

/// Record of the last-launched player process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHandle {
    pub process_id: u32,
}

impl SessionHandle {
    pub fn new(process_id: u32) -> Self {
        Self { process_id }
    }
}

/// Persistence for the one [`SessionHandle`].
///
/// Implementations only store; all read-modify-write sequences are
/// serialized by the [`ProcessSupervisor`](super::ProcessSupervisor).
pub trait SessionStore: Send + Sync {
    /// Reads the persisted handle, `None` when empty.
    fn load(&self) -> io::Result<Option<SessionHandle>>;

    /// Replaces the persisted handle.
    fn save(&self, handle: SessionHandle) -> io::Result<()>;

    /// Empties the record.
    fn clear(&self) -> io::Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// PID file
// ─────────────────────────────────────────────────────────────────────────────

/// Stores the handle as a decimal process id in a text file.
///
/// A missing or empty file means "no handle". The file outlives the process,
/// which lets a later invocation stop a player started by an earlier one.
pub struct PidFileStore {
    path: PathBuf,
}

impl PidFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Uses atomic write (temp file + rename) to prevent corruption on crash.
    /// Creates the directory if it doesn't exist.
    fn write(&self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, contents)?;
        std::fs::rename(&temp_path, &self.path)
    }
}

impl SessionStore for PidFileStore {
    fn load(&self) -> io::Result<Option<SessionHandle>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let line = contents.lines().next().unwrap_or_default().trim();
        if line.is_empty() {
            return Ok(None);
        }
        match line.parse::<u32>() {
            Ok(pid) if pid > 0 => Ok(Some(SessionHandle::new(pid))),
            _ => {
                log::warn!(
                    "[SessionStore] Ignoring invalid pid {:?} in {:?}",
                    line,
                    self.path
                );
                Ok(None)
            }
        }
    }

    fn save(&self, handle: SessionHandle) -> io::Result<()> {
        self.write(&handle.process_id.to_string())
    }

    fn clear(&self) -> io::Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.write("")?;
        log::debug!("[SessionStore] pid file cleaned");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local store for tests and long-lived hosts.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    handle: Mutex<Option<SessionHandle>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> io::Result<Option<SessionHandle>> {
        Ok(*self.handle.lock())
    }

    fn save(&self, handle: SessionHandle) -> io::Result<()> {
        *self.handle.lock() = Some(handle);
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.handle.lock() = None;
        Ok(())
    }
}
