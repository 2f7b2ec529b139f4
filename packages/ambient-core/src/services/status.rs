//! "Now playing" status surface.
//!
//! The controller is the only writer of these memory keys; the host and
//! other components only read them.

use std::sync::Arc;

use serde::Serialize;

use crate::memory::MemoryStore;
use crate::player_constants::{NOW_PLAYING_KEY, VOLUME_KEY};

/// What the rest of the system is told is playing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "track", rename_all = "snake_case")]
pub enum PlaybackStatus {
    Idle,
    Playing(String),
}

/// Publishes [`PlaybackStatus`] into the shared memory.
pub struct StatusPublisher {
    memory: Arc<dyn MemoryStore>,
    idle_status: String,
}

impl StatusPublisher {
    pub fn new(memory: Arc<dyn MemoryStore>, idle_status: impl Into<String>) -> Self {
        Self {
            memory,
            idle_status: idle_status.into(),
        }
    }

    /// Publishes the idle sentinel.
    pub fn publish_idle(&self) {
        self.write(NOW_PLAYING_KEY, &self.idle_status);
        tracing::debug!(status = %self.idle_status, "published idle status");
    }

    /// Publishes the track name and volume of a session just started.
    pub fn publish_playing(&self, track_name: &str, volume_db: i32) {
        self.write(NOW_PLAYING_KEY, track_name);
        self.write(VOLUME_KEY, &volume_db.to_string());
        tracing::debug!(track = %track_name, volume_db, "published now-playing status");
    }

    /// Reads back the published status.
    ///
    /// Nothing published yet counts as idle.
    pub fn current(&self) -> PlaybackStatus {
        match self.memory.get(NOW_PLAYING_KEY) {
            Some(value) if value != self.idle_status => PlaybackStatus::Playing(value),
            _ => PlaybackStatus::Idle,
        }
    }

    /// The raw value stored under the now-playing key, sentinel included.
    pub fn current_label(&self) -> String {
        self.memory
            .get(NOW_PLAYING_KEY)
            .unwrap_or_else(|| self.idle_status.clone())
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.memory.save(key, value) {
            tracing::warn!(key, error = %e, "failed to publish status");
        }
    }
}
