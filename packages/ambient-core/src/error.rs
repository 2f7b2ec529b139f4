//! Centralized error types for the Ambient Player core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured request-validation errors using `thiserror`
//! - Maps errors to machine-readable codes for the host's result message
//!
//! Only validation failures are surfaced to callers. Process supervision
//! failures stay inside [`ProcessSupervisor`](crate::services::ProcessSupervisor)
//! where they are logged and swallowed.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code for result messages.
    fn code(&self) -> &'static str;
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::EmptyPlayerPath => "config_empty_player_path",
            Self::InvertedVolumeRange { .. } => "config_inverted_volume_range",
            Self::DefaultVolumeOutOfRange { .. } => "config_default_volume_out_of_range",
            Self::InvalidPlaylistExtension(_) => "config_invalid_playlist_extension",
        }
    }
}

/// Request error.
///
/// Every variant except [`SoundError::PlayerLaunch`] is a validation failure
/// raised before any process is touched, so such a request never changes the
/// running session or the published status.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum SoundError {
    /// `state` was neither `"on"` nor `"off"`.
    #[error("State must be 'on' or 'off', got '{0}'")]
    InvalidState(String),

    /// State is `on` but no track was supplied.
    #[error("You have to specify at least one sound to play")]
    MissingTracks,

    /// A track entry has an empty name or link, or is not a single name/link pair.
    #[error("Track entry #{index} is invalid: {reason}")]
    InvalidTrackField { index: usize, reason: String },

    /// A link failed the playability probe.
    #[error("The link {0} is not a playable stream")]
    UnplayableLink(String),

    /// Playlist references and direct references were mixed in one request.
    #[error("{}", describe_mix(.playlists, .tracks))]
    MixedPlaylistAndTracks { playlists: usize, tracks: usize },

    /// Unknown play mode.
    #[error(
        "random_option must be \"random-select-one\", \"random-order-play\" or \"no-random\", got '{0}'"
    )]
    InvalidPlayMode(String),

    /// Unknown loop option.
    #[error("loop_option must be \"loop\" or \"no-loop\", got '{0}'")]
    InvalidLoopOption(String),

    /// Volume was not convertible to an integer.
    #[error("volume must be an integer number of dB, got '{0}'")]
    InvalidVolume(String),

    /// Auto-stop delay was not a positive integer.
    #[error("auto_stop_minutes must be an integer of at least 1 minute, got '{0}'")]
    InvalidAutoStop(String),

    /// The player executable could not be launched.
    ///
    /// The only failure raised after validation: the previous session has
    /// already been stopped and the status reset to idle.
    #[error("Failed to launch player {player}: {reason}")]
    PlayerLaunch { player: String, reason: String },
}

fn describe_mix(playlists: &usize, tracks: &usize) -> String {
    if *playlists == 1 {
        format!("One of the links is a playlist and is mixed with {tracks} classic sound(s)")
    } else {
        format!("{playlists} links are playlists and are mixed with {tracks} classic sound(s)")
    }
}

impl ErrorCode for SoundError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidState(_) => "invalid_state",
            Self::MissingTracks => "missing_tracks",
            Self::InvalidTrackField { .. } => "invalid_track_field",
            Self::UnplayableLink(_) => "unplayable_link",
            Self::MixedPlaylistAndTracks { .. } => "mixed_playlist_and_tracks",
            Self::InvalidPlayMode(_) => "invalid_play_mode",
            Self::InvalidLoopOption(_) => "invalid_loop_option",
            Self::InvalidVolume(_) => "invalid_volume",
            Self::InvalidAutoStop(_) => "invalid_auto_stop",
            Self::PlayerLaunch { .. } => "player_launch_failed",
        }
    }
}

/// Convenient Result alias for request handling.
pub type SoundResult<T> = Result<T, SoundError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_error_names_both_counts() {
        let err = SoundError::MixedPlaylistAndTracks {
            playlists: 2,
            tracks: 1,
        };
        assert_eq!(
            err.to_string(),
            "2 links are playlists and are mixed with 1 classic sound(s)"
        );
        assert_eq!(err.code(), "mixed_playlist_and_tracks");
    }

    #[test]
    fn mixed_error_single_playlist_wording() {
        let err = SoundError::MixedPlaylistAndTracks {
            playlists: 1,
            tracks: 3,
        };
        assert_eq!(
            err.to_string(),
            "One of the links is a playlist and is mixed with 3 classic sound(s)"
        );
    }

    #[test]
    fn sound_error_serializes_tagged() {
        let json = serde_json::to_value(SoundError::InvalidState("maybe".into())).unwrap();
        assert_eq!(json["type"], "InvalidState");
        assert_eq!(json["details"], "maybe");
    }
}
