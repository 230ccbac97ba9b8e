use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "reelcap")]
#[command(about = "Cut a transcribed video range into a vertical reel with burned-in captions.")]
pub struct Args {
    /// Path to config TOML (defaults to ./config.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a finished reel: clip, subtitle and burn in
    Create(CreateCmd),
    /// Only generate the .ass subtitle document for a range
    Subtitles(SubtitlesCmd),
    /// Print the effective default config as TOML and exit
    PrintDefaultConfig,
}

/// Transcript, range and title shared by every reel-producing command.
#[derive(Debug, Clone, ClapArgs)]
pub struct RangeArgs {
    /// Transcript file with `[MM:SS.mmm] Speaker N: text` lines
    pub transcript: PathBuf,

    /// Start timestamp (e.g. '14:21.843')
    pub start: String,

    /// End timestamp (e.g. '16:18.063')
    pub end: String,

    /// Title text for the overlay
    pub title: String,
}

#[derive(Debug, Parser)]
pub struct CreateCmd {
    /// Source video file
    pub video: PathBuf,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Custom output name (without extension)
    #[arg(long)]
    pub output: Option<String>,

    /// Write subtitles and log the ffmpeg jobs without running them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Parser)]
pub struct SubtitlesCmd {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Output .ass path (defaults to <processing_dir>/<name>.ass)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,

    /// Allow overwriting output file
    #[arg(long)]
    pub overwrite: bool,
}
