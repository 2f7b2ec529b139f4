//! Ambient CLI - command-line host for Ambient Player.
//!
//! Each invocation handles one background sound request and prints the
//! resulting message as JSON. The pid file and the status memory live on disk,
//! so a later invocation can stop the player an earlier one started. When the
//! request arms an auto-stop timer, the process stays alive until it fires.

mod config;

use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use ambient_core::player_constants::VOLUME_KEY;
use ambient_core::{
    BackgroundSoundController, ErrorCode, JsonFileMemory, MemoryStore, PidFileStore,
    RawNumber, RawSoundRequest, RawTrack, SessionStore, StatusPublisher, SystemProcessControl,
    TokioSpawner,
};
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tokio::signal;

use crate::config::CliConfig;

/// Exit status for a rejected request.
const EXIT_REJECTED: u8 = 2;

/// Ambient CLI - Start, stop and inspect background sounds.
#[derive(Parser, Debug)]
#[command(name = "ambient-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE", env = "AMBIENT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace). `RUST_LOG` refines it.
    #[arg(short, long, default_value = "info", env = "AMBIENT_LOG_LEVEL")]
    log_level: log::LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a background sound, replacing any sound already playing.
    On(OnArgs),
    /// Stop the background sound.
    Off,
    /// Handle a request read from a YAML or JSON file.
    Request {
        /// Request file; accepts every request shape the controller does.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the published status and the recorded player pid.
    Status,
}

#[derive(ClapArgs, Debug)]
struct OnArgs {
    /// A track as `name=link`. Repeat for several tracks.
    #[arg(short, long = "sound", value_name = "NAME=LINK", value_parser = parse_sound, required = true)]
    sounds: Vec<(String, String)>,

    /// no-random, random-select-one or random-order-play.
    #[arg(short, long)]
    random_option: Option<String>,

    /// loop or no-loop.
    #[arg(short = 'L', long)]
    loop_option: Option<String>,

    /// Volume in dB, clamped into the configured range.
    #[arg(short, long, allow_hyphen_values = true)]
    volume: Option<String>,

    /// Stop playback after this many minutes.
    #[arg(short, long)]
    auto_stop_minutes: Option<String>,

    /// Player executable for this request only.
    #[arg(short, long)]
    player_path: Option<String>,
}

impl OnArgs {
    fn into_request(self) -> RawSoundRequest {
        RawSoundRequest {
            state: Some("on".into()),
            sounds: Some(
                self.sounds
                    .into_iter()
                    .map(|(name, link)| RawTrack::named(name, link))
                    .collect(),
            ),
            random_option: self.random_option,
            loop_option: self.loop_option,
            mplayer_path: self.player_path,
            volume: self.volume.map(RawNumber::Text),
            auto_stop_minutes: self.auto_stop_minutes.map(RawNumber::Text),
            ..Default::default()
        }
    }
}

fn parse_sound(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, link)) if !name.is_empty() && !link.is_empty() => {
            Ok((name.to_string(), link.to_string()))
        }
        _ => Err(format!("expected NAME=LINK, got '{value}'")),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();

    log::debug!("Ambient CLI v{}", env!("CARGO_PKG_VERSION"));

    let config = CliConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Err(e) = config.core.validate() {
        print_error(&e)?;
        return Ok(ExitCode::from(EXIT_REJECTED));
    }
    log::debug!(
        "Configuration: player={}, pid_file={}, memory_file={}",
        config.core.player_path,
        config.pid_file.display(),
        config.memory_file.display()
    );

    let store = Arc::new(PidFileStore::new(&config.pid_file));
    let memory = Arc::new(JsonFileMemory::new(&config.memory_file));

    let request = match args.command {
        Command::On(on) => on.into_request(),
        Command::Off => RawSoundRequest {
            state: Some("off".into()),
            ..Default::default()
        },
        Command::Request { file } => read_request(&file)?,
        Command::Status => {
            print_status(&config, store.as_ref(), memory)?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let controller = BackgroundSoundController::new(
        &config.core,
        store,
        Arc::new(SystemProcessControl),
        memory,
        TokioSpawner::current(),
    );

    let outcome = match controller.handle(&request) {
        Ok(outcome) => outcome,
        Err(e) => {
            print_error(&e)?;
            return Ok(ExitCode::from(EXIT_REJECTED));
        }
    };

    println!("{}", serde_json::to_string(&outcome.message)?);

    if let Some(timer) = outcome.auto_stop {
        log::info!(
            "Waiting {} minute(s) for auto-stop; Ctrl+C leaves the sound playing",
            timer.minutes()
        );
        tokio::select! {
            fired = timer.fired() => {
                if !fired {
                    log::warn!("Auto-stop timer dropped before firing");
                }
            }
            _ = shutdown_signal() => {
                log::info!("Shutdown signal received, auto-stop abandoned");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read_request(path: &std::path::Path) -> Result<RawSoundRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse request file: {}", path.display()))
}

fn error_body<E: ErrorCode + fmt::Display>(error: &E) -> serde_json::Value {
    serde_json::json!({
        "error": error.code(),
        "message": error.to_string(),
    })
}

fn print_error<E: ErrorCode + fmt::Display>(error: &E) -> Result<()> {
    log::error!("Rejected: {}", error);
    println!("{}", serde_json::to_string(&error_body(error))?);
    Ok(())
}

fn print_status(
    config: &CliConfig,
    store: &dyn SessionStore,
    memory: Arc<JsonFileMemory>,
) -> Result<()> {
    let pid = store
        .load()
        .with_context(|| format!("Failed to read pid file: {}", config.pid_file.display()))?
        .map(|handle| handle.process_id);
    let volume = memory.get(VOLUME_KEY);
    let status = StatusPublisher::new(memory, config.core.idle_status.clone());

    let body = serde_json::json!({
        "status": status.current(),
        "label": status.current_label(),
        "volume_db": volume,
        "pid": pid,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sound_splits_on_first_equals() {
        assert_eq!(
            parse_sound("radio=http://host/stream?a=b"),
            Ok(("radio".to_string(), "http://host/stream?a=b".to_string()))
        );
        assert!(parse_sound("forest.mp3").is_err());
        assert!(parse_sound("=forest.mp3").is_err());
    }

    #[test]
    fn on_args_build_raw_request() {
        let args = Args::parse_from([
            "ambient-cli",
            "on",
            "--sound",
            "forest=forest.mp3",
            "--volume",
            "-5",
            "--loop-option",
            "loop",
        ]);
        let Command::On(on) = args.command else {
            panic!("expected on");
        };
        let request = on.into_request();
        assert_eq!(request.state.as_deref(), Some("on"));
        assert_eq!(request.volume, Some(RawNumber::Text("-5".into())));
        assert_eq!(request.loop_option.as_deref(), Some("loop"));
        assert_eq!(
            request.sounds,
Some(vec![RawTrack::named("forest", "forest.mp3")])
        );
    }

    #[test]
    fn config_errors_carry_their_code() {
        let body = error_body(&ambient_core::ConfigError::EmptyPlayerPath);
        assert_eq!(body["error"], "config_empty_player_path");
        assert_eq!(body["message"], "player_path must not be empty");
    }

    #[test]
    fn request_errors_carry_their_code() {
        let body = error_body(&ambient_core::SoundError::MissingTracks);
        assert_eq!(body["error"], "missing_tracks");
    }

    #[test]
    fn request_file_accepts_scalar_track_fields() {
        let raw: RawSoundRequest =
            serde_yaml::from_str("state: on\nsounds:\n  - 42: rain.mp3\n  - forest: 123\n").unwrap();
        let request = ambient_core::SoundSpecValidator::new(&ambient_core::Config::default())
            .validate(&raw)
            .unwrap();
        assert_eq!(
            request.tracks,
            vec![
                ambient_core::TrackEntry::new("42", "rain.mp3"),
                ambient_core::TrackEntry::new("forest", "123"),
            ]
        );
    }

    #[test]
    fn on_requires_a_sound() {
        assert!(Args::try_parse_from(["ambient-cli", "on"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
