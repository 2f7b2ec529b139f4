//! Where background work runs.
//!
//! The only background work in this crate is the auto-stop timer. The host
//! owns the runtime; the controller is handed a [`TaskSpawner`] and never
//! creates threads or runtimes of its own.

use std::future::Future;

/// Spawns detached background tasks.
///
/// A spawned task keeps running after the spawner is dropped. There is no
/// join or cancel handle.
pub trait TaskSpawner: Send + Sync {
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Spawns onto a Tokio runtime through its handle.
#[derive(Clone, Debug)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

impl TokioSpawner {
    /// Spawns onto the runtime behind `handle`, which may be called from any
    /// thread.
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Spawns onto the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context.
    #[must_use]
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl TaskSpawner for TokioSpawner {
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(future);
    }
}
