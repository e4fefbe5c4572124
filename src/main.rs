use clap::Parser;
use log::LevelFilter;

mod cli;
mod commands;
mod config;

use cli::{Cli, Command};
use config::FileConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .init();

    let file_config = FileConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Augment(args) => commands::augment(args, file_config),
        Command::Label(args) => commands::label(args, file_config),
    }
}
