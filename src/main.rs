use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crewsync::cli::args::{Cli, Commands, SubmitArgs};
use crewsync::cli::commands;
use crewsync::cli::Context;
use crewsync::config::{Config, Paths};
use crewsync::offline::DrainPolicy;

/// Environment variable holding a tracing filter.
const LOG_ENV: &str = "CREWSYNC_LOG";

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Completions { shell } = cli.command {
        print!("{}", commands::completions(shell)?);
        return Ok(());
    }

    let paths = Paths::new()?;
    let mut config = Config::load_from_path(&paths.config_file)?;
    config.general.color.apply();
    let format = cli.output.unwrap_or(config.general.default_output);

    if let Commands::Sync {
        continue_on_error: true,
    } = cli.command
    {
        config.queue.drain_policy = DrainPolicy::ContinuePastFailures;
    }

    let ctx = Context::open(&paths, config, cli.offline);

    let output = match cli.command {
        Commands::Submit(SubmitArgs { defer, command }) => {
            commands::submit(&ctx, command, defer, format).context("submission failed")?
        }
        Commands::Queue(args) => commands::queue(&ctx, args.command, format)?,
        Commands::Sync { .. } => commands::sync(&ctx, format)?,
        Commands::Watch { interval, count } => {
            let mut stdout = std::io::stdout();
            commands::watch(&ctx, interval, count, format, &mut stdout)?
        }
        Commands::Auth(args) => commands::auth(&ctx, args.command, format)?,
        Commands::Completions { .. } => String::new(),
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
