//! Application services layer.
//!
//! This module contains the session state machine and the pieces it
//! orchestrates between the validated request and the platform
//! (process control, memory).

pub mod auto_stop;
pub mod controller;
pub mod process_supervisor;
pub mod session_store;
pub mod status;

pub use auto_stop::{AutoStopScheduler, AutoStopTimer};
pub use controller::{BackgroundSoundController, PlaybackOutcome, SoundMessage};
pub use process_supervisor::ProcessSupervisor;
pub use session_store::{InMemorySessionStore, PidFileStore, SessionHandle, SessionStore};
pub use status::{PlaybackStatus, StatusPublisher};
