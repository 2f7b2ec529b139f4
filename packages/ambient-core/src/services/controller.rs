//! Session state machine.
//!
//! Two states, `Off` and `On`, re-entered per request:
//!
//! - `* -> Off`: stop the recorded player, clear the record, publish idle.
//! - `* -> On`: stop the recorded player, resolve the selection, start the
//!   new player, publish its label, optionally arm an auto-stop timer.
//!
//! Transitions are serialized by one lock, so stop always completes before
//! start and two requests never interleave.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::Config;
use crate::error::{SoundError, SoundResult};
use crate::memory::MemoryStore;
use crate::process::ProcessControl;
use crate::runtime::TokioSpawner;
use crate::selection::SelectionResolver;
use crate::services::auto_stop::{AutoStopScheduler, AutoStopTimer};
use crate::services::process_supervisor::ProcessSupervisor;
use crate::services::session_store::{SessionHandle, SessionStore};
use crate::services::status::{PlaybackStatus, StatusPublisher};
use crate::sound_spec::{
    DesiredState, LinkProbe, PlaybackRequest, RawSoundRequest, SoundSpecValidator,
};

/// Message handed back to the host for rendering.
///
/// Both fields are absent when the request turned playback off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SoundMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_link: Option<String>,
}

/// Result of a handled request.
#[derive(Debug)]
pub struct PlaybackOutcome {
    pub message: SoundMessage,
    /// The player started by this request.
    pub session: Option<SessionHandle>,
    /// The auto-stop timer armed by this request.
    pub auto_stop: Option<AutoStopTimer>,
}

/// Runs background sound requests against the player.
pub struct BackgroundSoundController {
    validator: SoundSpecValidator,
    resolver: SelectionResolver,
    supervisor: Arc<ProcessSupervisor>,
    status: Arc<StatusPublisher>,
    scheduler: AutoStopScheduler,
    guard_auto_stop: bool,
    transition: Arc<Mutex<()>>,
}

impl BackgroundSoundController {
    /// Wires a controller from its collaborators.
    ///
    /// `config` is expected to have passed [`Config::validate`].
    pub fn new(
        config: &Config,
        store: Arc<dyn SessionStore>,
        process: Arc<dyn ProcessControl>,
        memory: Arc<dyn MemoryStore>,
        spawner: TokioSpawner,
    ) -> Self {
        Self {
            validator: SoundSpecValidator::new(config),
            resolver: SelectionResolver::new(),
            supervisor: Arc::new(ProcessSupervisor::new(store, process)),
            status: Arc::new(StatusPublisher::new(memory, config.idle_status.clone())),
            scheduler: AutoStopScheduler::new(spawner),
            guard_auto_stop: config.auto_stop.guard_session,
            transition: Arc::new(Mutex::new(())),
        }
    }

    /// Replaces the selection resolver (e.g. with a seeded one).
    #[must_use]
    pub fn with_resolver(mut self, resolver: SelectionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the link playability probe.
    #[must_use]
    pub fn with_probe(mut self, config: &Config, probe: Arc<dyn LinkProbe>) -> Self {
        self.validator = SoundSpecValidator::with_probe(config, probe);
        self
    }

    /// Validates and applies one request.
    ///
    /// Validation failures return before any process or status is touched.
    pub fn handle(&self, raw: &RawSoundRequest) -> SoundResult<PlaybackOutcome> {
        let request = self.validator.validate(raw)?;
        match request.desired_state {
            DesiredState::Off => {
                self.turn_off();
                Ok(PlaybackOutcome {
                    message: SoundMessage::default(),
                    session: None,
                    auto_stop: None,
                })
            }
            DesiredState::On => self.turn_on(&request),
        }
    }

    /// Currently published status.
    pub fn status(&self) -> PlaybackStatus {
        self.status.current()
    }

    /// Currently recorded player session.
    pub fn current_session(&self) -> Option<SessionHandle> {
        self.supervisor.current()
    }

    fn turn_off(&self) {
        let _guard = self.transition.lock();
        let stopped = self.supervisor.stop();
        self.supervisor.clear_handle();
        self.status.publish_idle();
        tracing::info!(
            pid = stopped.map(|h| h.process_id),
            "background sound turned off"
        );
    }

    fn turn_on(&self, request: &PlaybackRequest) -> SoundResult<PlaybackOutcome> {
        let guard = self.transition.lock();

        // Any earlier session goes first, whatever the outcome below.
        self.supervisor.stop();

        let resolved = self
            .resolver
            .resolve(request)
            .ok_or(SoundError::MissingTracks)?;

        let handle = match self.supervisor.start(&resolved.player_args) {
            Ok(handle) => handle,
            Err(e) => {
                self.supervisor.clear_handle();
                self.status.publish_idle();
                tracing::error!(player = %request.player_path, error = %e, "failed to launch player");
                return Err(SoundError::PlayerLaunch {
                    player: request.player_path.clone(),
                    reason: e.to_string(),
                });
            }
        };

        self.status
            .publish_playing(resolved.label(), request.volume_db);
        tracing::info!(
            track = %resolved.label(),
            pid = handle.process_id,
            mode = ?request.play_mode,
            "background sound started"
        );
        drop(guard);

        let auto_stop = request
            .auto_stop_minutes
            .map(|minutes| self.arm_auto_stop(minutes, handle));

        Ok(PlaybackOutcome {
            message: SoundMessage {
                sound_name: Some(resolved.now_playing.name.clone()),
                sound_link: Some(resolved.now_playing.link.clone()),
            },
            session: Some(handle),
            auto_stop,
        })
    }

    fn arm_auto_stop(&self, minutes: u32, handle: SessionHandle) -> AutoStopTimer {
        let supervisor = Arc::clone(&self.supervisor);
        let status = Arc::clone(&self.status);
        let transition = Arc::clone(&self.transition);
        let guarded = self.guard_auto_stop;

        self.scheduler.arm(minutes, move || {
            let _guard = transition.lock();
            if guarded {
                if supervisor.stop_if_current(handle) {
                    status.publish_idle();
                }
            } else {
                // Legacy behaviour: whatever is recorded now gets killed.
                supervisor.stop();
            }
        })
    }
}
