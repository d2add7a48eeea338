mod commands;
mod config;
mod logging;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, run, sections, CheckArgs, RunArgs, SectionsArgs};
use config::Config;
use std::path::Path;

/// Plinth CLI - execute layout request documents against a canvas
#[derive(Parser, Debug)]
#[command(name = "plinth")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter (overrides the config logLevel; PLINTH_LOG overrides both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and guardrail-check request documents without touching the canvas
    Check(CheckArgs),

    /// Execute request documents against the canvas snapshot
    Run(RunArgs),

    /// List catalog sections, optionally running them
    Sections(SectionsArgs),
}

async fn dispatch(cli: Cli, cwd: &Path) -> anyhow::Result<()> {
    let config = Config::load(cwd)?;
    logging::init_logging(cli.log_level.as_deref(), &config.log_level);

    match cli.command {
        Command::Check(args) => check(args, &config, cwd),
        Command::Run(args) => run(args, &config, cwd).await,
        Command::Sections(args) => sections(args, &config, cwd).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match std::env::current_dir() {
        Ok(cwd) => dispatch(cli, &cwd).await,
        Err(err) => Err(anyhow::anyhow!("Cannot get current directory: {}", err)),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
