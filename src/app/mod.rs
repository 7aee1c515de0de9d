mod advance;
mod autoplay;
mod meta;
mod playback;
mod player;
mod simulate;
mod sources;
mod tui;
mod visibility;


use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::cli::{AuthGates, Cli, Command, StatusArg, Toggle};
use crate::config::Config;
use crate::db::Database;
use crate::paths::database_file_path;

pub(crate) use self::meta::{ProgressRecord, ShowMeta};
pub(crate) use self::sources::ProgressStore;

use self::advance::EpisodeAdvancer;
use self::autoplay::{AutoplayController, AutoplayTiming};
use self::meta::{PlaybackProgress, PlayerStatus, load_show_file};
use self::player::PlayerState;
use self::sources::{AutoplayAuthorization, Preferences};
use self::visibility::{VisibilityInputs, decide};

pub fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env();

    match cli.command {
        Command::Play {
            show,
            episode,
            speed,
            gates,
        } => {
            let mut db = open_db(&config)?;
            let meta = load_start_meta(&show, episode)?;
            tui::run_tui(&mut db, &config, meta, gates, speed)?;
        }
        Command::Simulate {
            show,
            episode,
            step_ms,
            controls,
            max_advances,
            gates,
        } => {
            let mut db = open_db(&config)?;
            let meta = load_start_meta(&show, episode)?;
            let options = simulate::SimulateOptions {
                step_ms,
                controls_showing: controls,
                max_advances,
            };
            let report = simulate::run_simulation(&mut db, &config, meta, gates, options)?;
            for line in report {
                println!("{line}");
            }
        }
        Command::Classify {
            time,
            duration,
            controls,
            status,
            hidden,
        } => run_classify(time, duration, controls, status, hidden),
        Command::Autoplay { state } => run_autoplay(&open_db(&config)?, state)?,
        Command::Progress => run_progress(&open_db(&config)?)?,
    }

    Ok(())
}

fn run_classify(time: f64, duration: f64, controls: bool, status: StatusArg, hidden: bool) {
    let decision = decide(&VisibilityInputs {
        progress: PlaybackProgress::new(time, duration),
        status: player_status(status),
        hidden,
        controls_showing: controls,
    });
    let autoplay_window = if autoplay::is_ending(time, duration) {
        "within final 1%"
    } else {
        "not yet"
    };
    println!("state:     {}", decision.state.label());
    println!("visible:   {}", decision.visible);
    println!("animation: {}", decision.animation.label());
    println!("placement: {}", decision.placement.label());
    println!("autoplay:  {autoplay_window}");
}

fn run_autoplay(db: &Database, state: Option<Toggle>) -> Result<()> {
    if let Some(state) = state {
        db.set_enable_autoplay(state == Toggle::On)?;
    }
    let enabled = db.enable_autoplay()?;
    println!("Autoplay is {}.", if enabled { "on" } else { "off" });
    Ok(())
}

fn run_progress(db: &Database) -> Result<()> {
    let items = db.list_progress()?;
    if items.is_empty() {
        println!("No stored progress yet. Run `nextep play <show.json>` first.");
        return Ok(());
    }

    println!(
        "{:<20} {:<32} {:<6} {:<16} {:<24}",
        "SHOW ID", "TITLE", "EP", "WATCHED", "UPDATED"
    );
    for item in items {
        println!(
            "{:<20} {:<32} {:<6} {:<16} {:<24}",
            truncate(&item.show_id, 20),
            truncate(&item.show_title, 32),
            item.episode,
            format!(
                "{} / {}",
                format_clock(item.watched),
                format_clock(item.duration)
            ),
            format_updated_display(&item.updated_at)
        );
    }
    Ok(())
}

fn open_db(config: &Config) -> Result<Database> {
    let db_path = database_file_path(config.db_path.clone())?;
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}

fn load_start_meta(path: &Path, episode: Option<u32>) -> Result<ShowMeta> {
    let mut meta = load_show_file(path)?;
    meta.select_episode(episode)?;
    Ok(meta)
}

fn player_status(status: StatusArg) -> PlayerStatus {
    match status {
        StatusArg::Idle => PlayerStatus::Idle,
        StatusArg::Loading => PlayerStatus::Loading,
        StatusArg::Playing => PlayerStatus::Playing,
        StatusArg::Paused => PlayerStatus::Paused,
        StatusArg::Errored => PlayerStatus::Errored,
    }
}

/// Wires a controller from configuration, the stored preference and CLI gates.
pub(crate) fn build_controller(
    db: &Database,
    config: &Config,
    gates: AuthGates,
) -> Result<AutoplayController> {
    let preferences = Preferences {
        enable_autoplay: db.enable_autoplay()?,
    };
    let authorization = AutoplayAuthorization {
        config_flag: config.allow_autoplay,
        extension_active: gates.extension,
        proxy_set: gates.proxy,
    };
    Ok(AutoplayController::new(
        Box::new(preferences),
        Box::new(authorization),
        AutoplayTiming {
            debounce: config.debounce,
            throttle: config.throttle,
        },
    ))
}

pub(crate) fn build_player(config: &Config) -> PlayerState {
    PlayerState::new(config.default_runtime)
}

pub(crate) fn build_advancer(on_change: Option<advance::MetaObserver>) -> EpisodeAdvancer {
    match on_change {
        Some(observer) => EpisodeAdvancer::with_observer(observer),
        None => EpisodeAdvancer::default(),
    }
}

pub(crate) fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

pub(crate) fn format_updated_display(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M %:z")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}
