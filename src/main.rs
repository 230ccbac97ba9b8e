use anyhow::Result;
use clap::Parser;

use reelcap::{cli, config, pipeline};

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let cfg = config::Config::load(args.config.as_deref())?;
    config::init_tracing(&cfg.logging, args.log_level.as_deref())?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "reelcap starting");

    match args.command {
        cli::Command::Create(cmd) => pipeline::run_create(cmd, &cfg),
        cli::Command::Subtitles(cmd) => pipeline::run_subtitles(cmd, &cfg),
        cli::Command::PrintDefaultConfig => {
            let s = cfg.to_toml_pretty()?;
            print!("{s}");
            Ok(())
        }
    }
}
