//! Selection resolver.
//!
//! Turns a validated request into the one player command line to run. The
//! player takes a single playlist file per invocation and cannot shuffle
//! inside it, so whenever playlists are requested the random modes degrade
//! to picking one playlist.
//!
//! | mode            | playlists                      | direct tracks               |
//! |-----------------|--------------------------------|-----------------------------|
//! | Sequential      | first playlist                 | every track, in order       |
//! | RandomSelectOne | one random playlist            | one random track            |
//! | RandomOrder     | one random playlist, shuffled  | every track, shuffled by player |

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::player_constants::{
    AUDIO_FILTER_FLAG, LOOP_FLAG, LOOP_FOREVER, LOOP_ONCE, PLAYLIST_FLAG, SHUFFLE_FLAG,
    SLAVE_MODE_FLAGS,
};
use crate::sound_spec::{ContentKind, PlayMode, PlaybackRequest, TrackEntry};

/// The player invocation chosen for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlayback {
    /// Full argv, executable first.
    pub player_args: Vec<String>,
    /// The last entry handed to the player; its name is the status label.
    pub now_playing: TrackEntry,
}

impl ResolvedPlayback {
    /// Status label for this playback.
    pub fn label(&self) -> &str {
        &self.now_playing.name
    }
}

/// Resolves requests into player invocations.
///
/// Holds the random source behind a mutex so one resolver can be shared;
/// seed it with [`SelectionResolver::with_seed`] for reproducible picks.
pub struct SelectionResolver {
    rng: Mutex<StdRng>,
}

impl SelectionResolver {
    /// Creates a resolver seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a resolver with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Resolves an `On` request.
    ///
    /// Returns `None` when the request carries no tracks (`Off` requests).
    pub fn resolve(&self, request: &PlaybackRequest) -> Option<ResolvedPlayback> {
        if request.tracks.is_empty() {
            return None;
        }

        let mut shuffle = false;
        let playlist = request.content == ContentKind::Playlists;
        let selected: Vec<&TrackEntry> = match (request.play_mode, request.content) {
            (PlayMode::Sequential, ContentKind::Playlists) => vec![&request.tracks[0]],
            (PlayMode::Sequential, ContentKind::Tracks) => request.tracks.iter().collect(),
            (PlayMode::RandomSelectOne, _) => vec![self.pick(&request.tracks)],
            (PlayMode::RandomOrder, ContentKind::Playlists) => {
                shuffle = true;
                vec![self.pick(&request.tracks)]
            }
            (PlayMode::RandomOrder, ContentKind::Tracks) => {
                shuffle = true;
                request.tracks.iter().collect()
            }
        };

        let mut args = Vec::with_capacity(9 + selected.len());
        args.push(request.player_path.clone());
        args.extend(SLAVE_MODE_FLAGS.iter().map(|f| f.to_string()));
        args.push(AUDIO_FILTER_FLAG.to_string());
        args.push(format!("volume={}", request.volume_db));
        args.push(LOOP_FLAG.to_string());
        args.push(if request.looped { LOOP_FOREVER } else { LOOP_ONCE }.to_string());
        if shuffle {
            args.push(SHUFFLE_FLAG.to_string());
        }
        if playlist {
            args.push(PLAYLIST_FLAG.to_string());
        }
        args.extend(selected.iter().map(|t| t.link.clone()));

        // `selected` is never empty: `tracks` was checked above.
        let now_playing = selected.last().map(|t| (*t).clone())?;

        tracing::debug!(?args, mode = ?request.play_mode, "resolved player command");
        Some(ResolvedPlayback {
            player_args: args,
            now_playing,
        })
    }

    fn pick<'a>(&self, tracks: &'a [TrackEntry]) -> &'a TrackEntry {
        let index = self.rng.lock().gen_range(0..tracks.len());
        &tracks[index]
    }
}

impl Default for SelectionResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound_spec::DesiredState;

    fn request(mode: PlayMode, tracks: &[(&str, &str)]) -> PlaybackRequest {
        let tracks: Vec<TrackEntry> = tracks
            .iter()
            .map(|(name, link)| TrackEntry::new(*name, *link))
            .collect();
        let content = if tracks.iter().all(|t| t.is_playlist(".txt")) {
            ContentKind::Playlists
        } else {
            ContentKind::Tracks
        };
        PlaybackRequest {
            desired_state: DesiredState::On,
            tracks,
            content,
            play_mode: mode,
            looped: false,
            volume_db: -17,
            auto_stop_minutes: None,
            player_path: "/usr/bin/mplayer".into(),
        }
    }

    const PLAYLISTS: [(&str, &str); 3] = [
        ("rain", "rain.txt"),
        ("forest", "forest.txt"),
        ("sea", "sea.txt"),
    ];
    const TRACKS: [(&str, &str); 3] = [
        ("rain", "rain.mp3"),
        ("forest", "forest.ogg"),
        ("sea", "http://sea.example/stream"),
    ];

    fn prefix(looped: bool) -> Vec<String> {
        [
            "/usr/bin/mplayer",
            "-slave",
            "-quiet",
            "-af",
            "volume=-17",
            "-loop",
            if looped { "0" } else { "1" },
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sequential
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn sequential_playlists_use_first_only() {
        let resolved = SelectionResolver::with_seed(1)
            .resolve(&request(PlayMode::Sequential, &PLAYLISTS))
            .unwrap();
        let mut expected = prefix(false);
        expected.extend(["-playlist".to_string(), "rain.txt".to_string()]);
        assert_eq!(resolved.player_args, expected);
        assert_eq!(resolved.label(), "rain");
    }

    #[test]
    fn sequential_tracks_pass_all_in_order() {
        let resolved = SelectionResolver::with_seed(1)
            .resolve(&request(PlayMode::Sequential, &TRACKS))
            .unwrap();
        let mut expected = prefix(false);
        expected.extend(TRACKS.iter().map(|(_, link)| link.to_string()));
        assert_eq!(resolved.player_args, expected);
        assert_eq!(resolved.label(), "sea");
        assert_eq!(resolved.now_playing.link, "http://sea.example/stream");
    }

    #[test]
    fn loop_maps_to_infinite() {
        let mut req = request(PlayMode::Sequential, &TRACKS[..1]);
        req.looped = true;
        let resolved = SelectionResolver::with_seed(1).resolve(&req).unwrap();
        assert_eq!(&resolved.player_args[5..7], ["-loop", "0"]);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Random modes
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn random_select_one_playlist_has_no_shuffle() {
        let resolved = SelectionResolver::with_seed(7)
            .resolve(&request(PlayMode::RandomSelectOne, &PLAYLISTS))
            .unwrap();
        let args = &resolved.player_args;
        assert_eq!(args.len(), 9);
        assert_eq!(args[7], "-playlist");
        assert!(!args.contains(&"-shuffle".to_string()));
        assert!(PLAYLISTS
            .iter()
            .any(|(name, link)| args[8] == *link && resolved.label() == *name));
    }

    #[test]
    fn random_select_one_track_picks_one() {
        let resolved = SelectionResolver::with_seed(3)
            .resolve(&request(PlayMode::RandomSelectOne, &TRACKS))
            .unwrap();
        assert_eq!(resolved.player_args.len(), 8);
        assert_eq!(resolved.player_args[7], resolved.now_playing.link);
        assert!(!resolved.player_args.contains(&"-playlist".to_string()));
    }

    #[test]
    fn random_order_playlist_picks_one_with_shuffle() {
        let resolved = SelectionResolver::with_seed(11)
            .resolve(&request(PlayMode::RandomOrder, &PLAYLISTS))
            .unwrap();
        let args = &resolved.player_args;
        assert_eq!(args.len(), 10);
        assert_eq!(&args[7..9], ["-shuffle", "-playlist"]);
        assert_eq!(args[9], resolved.now_playing.link);
    }

    #[test]
    fn random_order_tracks_keep_given_order() {
        let resolved = SelectionResolver::with_seed(5)
            .resolve(&request(PlayMode::RandomOrder, &TRACKS))
            .unwrap();
        let mut expected = prefix(false);
        expected.push("-shuffle".to_string());
        expected.extend(TRACKS.iter().map(|(_, link)| link.to_string()));
        assert_eq!(resolved.player_args, expected);
        assert_eq!(resolved.label(), "sea");
    }

    #[test]
    fn same_seed_same_pick() {
        let req = request(PlayMode::RandomSelectOne, &TRACKS);
        let a = SelectionResolver::with_seed(42).resolve(&req).unwrap();
        let b = SelectionResolver::with_seed(42).resolve(&req).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn random_pick_reaches_every_entry() {
        let resolver = SelectionResolver::with_seed(99);
        let req = request(PlayMode::RandomSelectOne, &PLAYLISTS);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(resolver.resolve(&req).unwrap().now_playing.name);
        }
        assert_eq!(seen.len(), PLAYLISTS.len());
    }

    #[test]
    fn empty_request_resolves_to_nothing() {
        let mut req = request(PlayMode::Sequential, &TRACKS);
        req.tracks.clear();
        assert!(SelectionResolver::with_seed(1).resolve(&req).is_none());
    }
}
