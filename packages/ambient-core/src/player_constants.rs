//! Fixed player and status-surface constants that should NOT be changed.
//!
//! These values are defined by the external media player's command line and
//! by the keys other components read from the shared memory.

// ─────────────────────────────────────────────────────────────────────────────
// Player Command Line
// ─────────────────────────────────────────────────────────────────────────────

/// Default location of the media player executable.
pub const DEFAULT_PLAYER_PATH: &str = "/usr/bin/mplayer";

/// Flags that put the player in quiet, non-interactive mode.
pub const SLAVE_MODE_FLAGS: [&str; 2] = ["-slave", "-quiet"];

/// Audio filter flag; followed by `volume=<dB>`.
pub const AUDIO_FILTER_FLAG: &str = "-af";

/// Loop flag; followed by an iteration count.
pub const LOOP_FLAG: &str = "-loop";

/// `-loop 0` plays forever.
pub const LOOP_FOREVER: &str = "0";

/// `-loop 1` plays the content once.
pub const LOOP_ONCE: &str = "1";

/// Lets the player shuffle the links it was given.
pub const SHUFFLE_FLAG: &str = "-shuffle";

/// Marks the following link as a playlist file.
///
/// The player reads a single playlist per invocation and cannot shuffle
/// inside it.
pub const PLAYLIST_FLAG: &str = "-playlist";

// ─────────────────────────────────────────────────────────────────────────────
// Volume (dB)
// ─────────────────────────────────────────────────────────────────────────────

/// Quietest accepted volume.
pub const VOLUME_MIN_DB: i32 = -40;

/// Loudest accepted volume.
pub const VOLUME_MAX_DB: i32 = -10;

/// Volume used when a request does not name one.
pub const VOLUME_DEFAULT_DB: i32 = -17;

// ─────────────────────────────────────────────────────────────────────────────
// Content
// ─────────────────────────────────────────────────────────────────────────────

/// Suffix identifying a playlist file (plain text, one media location per line).
pub const PLAYLIST_EXTENSION: &str = ".txt";

// ─────────────────────────────────────────────────────────────────────────────
// Status Surface
// ─────────────────────────────────────────────────────────────────────────────

/// Memory key holding the name of the track currently playing.
pub const NOW_PLAYING_KEY: &str = "current_playing_background_sound";

/// Memory key holding the volume of the session last started.
pub const VOLUME_KEY: &str = "background_sound_volume";

/// Status published when no session is running.
pub const IDLE_STATUS: &str = "No background sound currently playing";

/// Seconds per auto-stop minute.
pub const SECONDS_PER_MINUTE: u64 = 60;
