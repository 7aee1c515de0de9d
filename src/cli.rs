use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "nextep",
    version,
    about = "Surface the next-episode prompt and autoplay episodes near the end of playback"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch a show in the terminal player.
    Play {
        show: PathBuf,
        #[arg(short, long)]
        episode: Option<u32>,
        /// Playback speed multiplier.
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        #[command(flatten)]
        gates: AuthGates,
    },
    /// Fast-forward through a show without a terminal UI.
    Simulate {
        show: PathBuf,
        #[arg(short, long)]
        episode: Option<u32>,
        #[arg(long, default_value_t = 250)]
        step_ms: u64,
        /// Keep the transport controls shown for the whole run.
        #[arg(long)]
        controls: bool,
        #[arg(long, default_value_t = 1)]
        max_advances: u32,
        #[command(flatten)]
        gates: AuthGates,
    },
    /// Classify a single playback position.
    Classify {
        time: f64,
        duration: f64,
        #[arg(long)]
        controls: bool,
        #[arg(long, value_enum, default_value_t = StatusArg::Playing)]
        status: StatusArg,
        #[arg(long)]
        hidden: bool,
    },
    /// Show or change the autoplay preference.
    Autoplay { state: Option<Toggle> },
    /// List stored watch progress.
    Progress,
}

#[derive(Debug, Clone, Copy, Default, Args)]
pub struct AuthGates {
    /// Treat the browser extension as active.
    #[arg(long)]
    pub extension: bool,
    /// Treat a proxy as configured for this viewer.
    #[arg(long)]
    pub proxy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Idle,
    Loading,
    Playing,
    Paused,
    Errored,
}
