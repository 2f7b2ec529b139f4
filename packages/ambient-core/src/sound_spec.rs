//! Request parsing and validation.
//!
//! [`RawSoundRequest`] is the loosely-typed shape the host hands over (it
//! accepts every historical request layout). [`SoundSpecValidator`] turns it
//! into a [`PlaybackRequest`] or rejects it as a whole; nothing is mutated on
//! failure.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{Config, VolumeConfig};
use crate::error::{SoundError, SoundResult};

// ─────────────────────────────────────────────────────────────────────────────
// Raw Request
// ─────────────────────────────────────────────────────────────────────────────

/// A track as written by the host: either `{name: link}` or `{name: .., link: ..}`.
///
/// Names and links may be any scalar; they are read as their text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTrack {
    Named { name: RawScalar, link: RawScalar },
    Mapping(BTreeMap<RawKey, RawScalar>),
}

impl RawTrack {
    /// `{name: .., link: ..}` from text.
    pub fn named(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self::Named {
            name: RawScalar::Text(name.into()),
            link: RawScalar::Text(link.into()),
        }
    }

    /// `{name: link}` from text.
    pub fn pair(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self::Mapping(BTreeMap::from([(
            RawKey::Text(name.into()),
            RawScalar::Text(link.into()),
        )]))
    }
}

/// A mapping key as YAML can write it (`42: rain.mp3` has an integer key).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawKey {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Any scalar value, kept for its text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for RawScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// An integer that may arrive as a number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawNumber {
    /// Returns the integer value, or `None` when the value is not an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Float(_) => None,
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl fmt::Display for RawNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Request as received from the host, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSoundRequest {
    /// `"on"` or `"off"`.
    pub state: Option<String>,
    /// Track list.
    pub sounds: Option<Vec<RawTrack>>,
    /// Legacy single-track name.
    pub sound_name: Option<String>,
    /// Legacy single-track link.
    pub sound_link: Option<String>,
    /// `"no-random"`, `"random-select-one"` or `"random-order-play"`.
    pub random_option: Option<String>,
    /// Legacy boolean random-select flag.
    pub random: Option<bool>,
    /// `"loop"` or `"no-loop"`.
    pub loop_option: Option<String>,
    /// Per-request player executable.
    pub mplayer_path: Option<String>,
    pub auto_stop_minutes: Option<RawNumber>,
    pub volume: Option<RawNumber>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Validated Request
// ─────────────────────────────────────────────────────────────────────────────

/// Requested session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredState {
    On,
    Off,
}

impl FromStr for DesiredState {
    type Err = SoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            other => Err(SoundError::InvalidState(other.to_string())),
        }
    }
}

/// How the tracks of a request are ordered or picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// Play in the given order.
    #[default]
    Sequential,
    /// Play one entry picked at random.
    RandomSelectOne,
    /// Play everything in an order chosen by the player.
    RandomOrder,
}

impl FromStr for PlayMode {
    type Err = SoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no-random" | "sequential" => Ok(Self::Sequential),
            "random-select-one" | "random_select_one" => Ok(Self::RandomSelectOne),
            "random-order-play" | "random_order" => Ok(Self::RandomOrder),
            other => Err(SoundError::InvalidPlayMode(other.to_string())),
        }
    }
}

fn parse_loop_option(s: &str) -> SoundResult<bool> {
    match s {
        "loop" => Ok(true),
        "no-loop" => Ok(false),
        other => Err(SoundError::InvalidLoopOption(other.to_string())),
    }
}

/// What every track of a request points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Playlist files, handed to the player one at a time.
    Playlists,
    /// Directly playable media.
    Tracks,
}

/// A named link to play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub name: String,
    pub link: String,
}

impl TrackEntry {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
        }
    }

    /// True when the link names a playlist file (exact, case-sensitive suffix).
    #[must_use]
    pub fn is_playlist(&self, extension: &str) -> bool {
        self.link.ends_with(extension)
    }
}

/// A fully validated playback request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackRequest {
    pub desired_state: DesiredState,
    /// Non-empty for `On`, empty for `Off`.
    pub tracks: Vec<TrackEntry>,
    /// Whether `tracks` are all playlists or all direct media.
    pub content: ContentKind,
    pub play_mode: PlayMode,
    pub looped: bool,
    /// Already clamped into the configured range.
    pub volume_db: i32,
    pub auto_stop_minutes: Option<u32>,
    pub player_path: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Link Probe
// ─────────────────────────────────────────────────────────────────────────────

/// Checks whether the player will be able to open a link.
pub trait LinkProbe: Send + Sync {
    fn is_playable(&self, link: &str) -> bool;
}

/// Accepts every link. The player offers no way to check a stream up front.
pub struct AcceptAllProbe;

impl LinkProbe for AcceptAllProbe {
    fn is_playable(&self, _link: &str) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validator
// ─────────────────────────────────────────────────────────────────────────────

/// Validates and normalizes raw requests against the active configuration.
pub struct SoundSpecValidator {
    volume: VolumeConfig,
    playlist_extension: String,
    player_path: String,
    probe: Arc<dyn LinkProbe>,
}

impl SoundSpecValidator {
    pub fn new(config: &Config) -> Self {
        Self::with_probe(config, Arc::new(AcceptAllProbe))
    }

    pub fn with_probe(config: &Config, probe: Arc<dyn LinkProbe>) -> Self {
        Self {
            volume: config.volume,
            playlist_extension: config.playlist_extension.clone(),
            player_path: config.player_path.clone(),
            probe,
        }
    }

    /// Validates `raw`, returning a normalized request or the first failure.
    pub fn validate(&self, raw: &RawSoundRequest) -> SoundResult<PlaybackRequest> {
        let state = raw.state.as_deref().unwrap_or_default();
        let desired_state: DesiredState = state.parse()?;

        let player_path = raw
            .mplayer_path
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| self.player_path.clone());

        if desired_state == DesiredState::Off {
            // The auto-stop delay is checked whatever the state.
            let auto_stop_minutes = self.auto_stop(raw)?;
            return Ok(PlaybackRequest {
                desired_state,
                tracks: Vec::new(),
                content: ContentKind::Tracks,
                play_mode: PlayMode::default(),
                looped: false,
                volume_db: self.volume.default_db,
                auto_stop_minutes,
                player_path,
            });
        }

        let tracks = self.collect_tracks(raw)?;
        let content = self.content_kind(&tracks)?;

        let play_mode = match (raw.random_option.as_deref(), raw.random) {
            (Some(option), _) => option.parse()?,
            (None, Some(true)) => PlayMode::RandomSelectOne,
            (None, _) => PlayMode::Sequential,
        };
        let looped = parse_loop_option(raw.loop_option.as_deref().unwrap_or("no-loop"))?;
        let volume_db = match &raw.volume {
            Some(volume) => self.clamp_volume(volume)?,
            None => self.volume.default_db,
        };
        let auto_stop_minutes = self.auto_stop(raw)?;

        Ok(PlaybackRequest {
            desired_state,
            tracks,
            content,
            play_mode,
            looped,
            volume_db,
            auto_stop_minutes,
            player_path,
        })
    }

    fn auto_stop(&self, raw: &RawSoundRequest) -> SoundResult<Option<u32>> {
        raw.auto_stop_minutes
            .as_ref()
            .map(parse_auto_stop)
            .transpose()
    }

    fn collect_tracks(&self, raw: &RawSoundRequest) -> SoundResult<Vec<TrackEntry>> {
        let raw_tracks: Vec<RawTrack> = match (&raw.sounds, &raw.sound_link) {
            (Some(sounds), _) => {
                if raw.sound_link.is_some() {
                    log::debug!("[Validator] Both sounds and sound_link given, using sounds");
                }
                sounds.clone()
            }
            (None, Some(link)) => vec![RawTrack::named(
                raw.sound_name.clone().unwrap_or_else(|| link.clone()),
                link.clone(),
            )],
            (None, None) => return Err(SoundError::MissingTracks),
        };
        if raw_tracks.is_empty() {
            return Err(SoundError::MissingTracks);
        }

        raw_tracks
            .into_iter()
            .enumerate()
            .map(|(index, raw_track)| {
                let track = normalize_track(index, raw_track)?;
                if !self.probe.is_playable(&track.link) {
                    return Err(SoundError::UnplayableLink(track.link));
                }
                Ok(track)
            })
            .collect()
    }

    fn content_kind(&self, tracks: &[TrackEntry]) -> SoundResult<ContentKind> {
        let playlists = tracks
            .iter()
            .filter(|t| t.is_playlist(&self.playlist_extension))
            .count();
        match playlists {
            0 => {
                log::debug!("[Validator] Got only direct tracks");
                Ok(ContentKind::Tracks)
            }
            n if n == tracks.len() => {
                log::debug!("[Validator] Got only playlists");
                Ok(ContentKind::Playlists)
            }
            n => Err(SoundError::MixedPlaylistAndTracks {
                playlists: n,
                tracks: tracks.len() - n,
            }),
        }
    }

    fn clamp_volume(&self, volume: &RawNumber) -> SoundResult<i32> {
        let requested = volume
            .as_integer()
            .ok_or_else(|| SoundError::InvalidVolume(volume.to_string()))?;
        let clamped =
            requested.clamp(i64::from(self.volume.min_db), i64::from(self.volume.max_db)) as i32;
        if i64::from(clamped) != requested {
            log::debug!(
                "[Validator] Volume {} outside [{}, {}], set to {}",
                requested,
                self.volume.min_db,
                self.volume.max_db,
                clamped
            );
        }
        Ok(clamped)
    }
}

fn normalize_track(index: usize, raw: RawTrack) -> SoundResult<TrackEntry> {
    let (name, link) = match raw {
        RawTrack::Named { name, link } => (name.to_string(), link.to_string()),
        RawTrack::Mapping(map) => {
            let keys = map.len();
            let mut pairs = map.into_iter();
            match (pairs.next(), pairs.next()) {
                (Some((name, link)), None) => (name.to_string(), link.to_string()),
                _ => {
                    return Err(SoundError::InvalidTrackField {
                        index,
                        reason: format!("expected a single name: link pair, got {keys} keys"),
                    })
                }
            }
        }
    };
    if name.is_empty() {
        return Err(SoundError::InvalidTrackField {
            index,
            reason: "name is empty".into(),
        });
    }
    if link.is_empty() {
        return Err(SoundError::InvalidTrackField {
            index,
            reason: "link is empty".into(),
        });
    }
    Ok(TrackEntry { name, link })
}

fn parse_auto_stop(raw: &RawNumber) -> SoundResult<u32> {
    raw.as_integer()
        .filter(|minutes| *minutes >= 1)
        .and_then(|minutes| u32::try_from(minutes).ok())
        .ok_or_else(|| SoundError::InvalidAutoStop(raw.to_string()))
}
