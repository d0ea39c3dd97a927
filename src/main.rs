//! Token Racer entry point
//!
//! Loads settings, sets up file logging, picks the generation service and
//! runs one race in the terminal.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use env_logger::{Env, Target};

use token_racer::game::Game;
use token_racer::highscores::{HighScores, format_age, unix_now};
use token_racer::track::{HttpTrackService, OfflineService, TrackService};
use token_racer::{ConfigError, RacerError, Settings, SettingsSource};

/// Endless terminal racer on a road written by a language model
#[derive(Parser, Debug)]
#[command(name = "token-racer")]
#[command(version, about, long_about = None)]
struct Args {
    /// Settings file (JSON); defaults are used when it does not exist
    #[arg(short, long, value_name = "PATH", default_value = "token-racer.json")]
    config: PathBuf,

    /// RNG seed for a reproducible procedural road
    #[arg(long)]
    seed: Option<u64>,

    /// Never call the generation service; every chunk is procedural
    #[arg(long)]
    offline: bool,

    /// Model to request track lines from
    #[arg(long)]
    model: Option<String>,

    /// Write the effective settings to the config path and exit
    #[arg(long)]
    save_config: bool,
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("token-racer: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), RacerError> {
    let (mut settings, source) = Settings::load_or_default(&args.config)?;
    if let Some(seed) = args.seed {
        settings.seed = Some(seed);
    }
    if let Some(model) = args.model {
        settings.service.model = model;
    }
    settings.offline |= args.offline;

    init_logging(&settings.log_file)?;
    log::info!("Token Racer starting");
    match source {
        SettingsSource::File => log::info!("Loaded settings from {}", args.config.display()),
        SettingsSource::Defaults => {
            log::info!("No settings at {}, using defaults", args.config.display())
        }
    }

    if args.save_config {
        settings.save(&args.config)?;
        println!("Settings written to {}", args.config.display());
        return Ok(());
    }

    let service = select_service(&settings);
    let scores_path = settings.high_scores_file.clone();

    println!("Generating initial race track...");
    let game = Game::new(settings, service);
    let mut summary = game.play()?;

    let mut scores = HighScores::load(&scores_path);
    if summary.record(&mut scores).is_some() {
        if let Err(err) = scores.save(&scores_path) {
            log::error!("{err}");
            eprintln!("Could not save high scores: {err}");
        }
    }

    println!("{summary}");
    println!();
    println!("Best runs:");
    let now = unix_now();
    for (i, entry) in scores.entries.iter().take(5).enumerate() {
        println!(
            "  {:>2}. {:>6}  gear {:>2}  {:>6} tokens  {}",
            i + 1,
            entry.score,
            entry.gear,
            entry.tokens,
            format_age(entry.timestamp, now)
        );
    }
    println!();
    println!("Thanks for playing Token Racer!");
    Ok(())
}

/// Logs go to a file; the terminal belongs to the game screen
fn init_logging(path: &Path) -> Result<(), ConfigError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn select_service(settings: &Settings) -> Arc<dyn TrackService> {
    if settings.offline {
        log::info!("Offline mode, using the procedural road");
        return Arc::new(OfflineService::new("offline mode"));
    }
    match settings.service.api_key() {
        Some(key) => {
            let service = HttpTrackService::new(&settings.service, key);
            log::info!(
                "Generating road with {} via {}",
                settings.service.model,
                service.url()
            );
            Arc::new(service)
        }
        None => {
            let reason = format!("{} is not set", settings.service.api_key_env);
            log::warn!("{reason}, using the procedural road");
            println!("{reason}; racing on a procedural road.");
            Arc::new(OfflineService::new(reason))
        }
    }
}
