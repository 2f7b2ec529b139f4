//! Delayed one-shot stop.
//!
//! A timer is armed per `on` request that asks for it. Timers are never
//! cancelled; whether a late timer may still stop anything is decided by the
//! stop action it carries (see [`BackgroundSoundController`](super::BackgroundSoundController)).

use std::fmt;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::player_constants::SECONDS_PER_MINUTE;
use crate::runtime::{TaskSpawner, TokioSpawner};

/// Handle to an armed auto-stop timer.
///
/// Dropping it does not cancel the timer. Hosts that would otherwise exit
/// before the delay elapses await [`AutoStopTimer::fired`].
pub struct AutoStopTimer {
    minutes: u32,
    done: oneshot::Receiver<()>,
}

impl AutoStopTimer {
    /// Configured delay in minutes.
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Waits until the stop action has run.
    ///
    /// Returns `false` if the timer task was dropped before firing (runtime
    /// shutdown).
    pub async fn fired(self) -> bool {
        self.done.await.is_ok()
    }
}

impl fmt::Debug for AutoStopTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoStopTimer")
            .field("minutes", &self.minutes)
            .finish_non_exhaustive()
    }
}

/// Arms auto-stop timers on a background runtime.
pub struct AutoStopScheduler<S: TaskSpawner = TokioSpawner> {
    spawner: S,
}

impl<S: TaskSpawner> AutoStopScheduler<S> {
    pub fn new(spawner: S) -> Self {
        Self { spawner }
    }

    /// Runs `stop` once, `minutes * 60` seconds from now, without blocking
    /// the caller.
    pub fn arm<F>(&self, minutes: u32, stop: F) -> AutoStopTimer
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = Duration::from_secs(u64::from(minutes) * SECONDS_PER_MINUTE);
        let (done_tx, done_rx) = oneshot::channel();

        tracing::info!(minutes, "waiting before stopping the ambient sound");
        self.spawner.spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::info!(minutes, "time is over, stopping the ambient sound");
            stop();
            let _ = done_tx.send(());
        });

        AutoStopTimer {
            minutes,
            done: done_rx,
        }
    }
}
