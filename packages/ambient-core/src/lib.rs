//! Ambient Core - background sound control for a voice assistant.
//!
//! This crate turns a "background sound" request (on/off, a list of named
//! audio links, play mode, loop, volume, optional auto-stop delay) into the
//! lifecycle of a single external audio player process.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`sound_spec`]: Raw request shapes and their validation
//! - [`selection`]: Play-mode policy and player command line construction
//! - [`services`]: Session state machine, process supervision, status, auto-stop
//! - [`process`]: Platform process spawning and termination
//! - [`memory`]: Shared key/value memory for the "now playing" status
//! - [`runtime`]: Task spawning abstraction for async runtime independence
//! - [`config`]: Player and volume configuration
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! The crate defines several traits to decouple core logic from the host:
//!
//! - [`TaskSpawner`](runtime::TaskSpawner): Spawning background tasks
//! - [`ProcessControl`](process::ProcessControl): Launching and killing the player
//! - [`SessionStore`](services::SessionStore): Persisting the running player id
//! - [`MemoryStore`](memory::MemoryStore): Publishing status to the host
//! - [`LinkProbe`](sound_spec::LinkProbe): Checking that a link is playable
//!
//! Each trait has a default implementation suitable for a standalone host.

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod memory;
pub mod player_constants;
pub mod process;
pub mod runtime;
pub mod selection;
pub mod services;
pub mod sound_spec;

// Re-export commonly used types at the crate root
pub use config::{AutoStopConfig, Config, ConfigError, VolumeConfig};
pub use error::{ErrorCode, SoundError, SoundResult};
pub use memory::{InMemoryStore, JsonFileMemory, MemoryStore};
pub use process::{ProcessControl, SystemProcessControl, Termination};
pub use runtime::{TaskSpawner, TokioSpawner};
pub use selection::{ResolvedPlayback, SelectionResolver};
pub use sound_spec::{
    AcceptAllProbe, ContentKind, DesiredState, LinkProbe, PlayMode, PlaybackRequest, RawKey,
    RawNumber, RawScalar, RawSoundRequest, RawTrack, SoundSpecValidator, TrackEntry,
};

// Re-export service types
pub use services::{
    AutoStopScheduler, AutoStopTimer, BackgroundSoundController, InMemorySessionStore,
    PidFileStore, PlaybackOutcome, PlaybackStatus, ProcessSupervisor, SessionHandle,
    SessionStore, SoundMessage, StatusPublisher,
};
