#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line host that plays Pocket Arcade games in a terminal.

mod catalog;
mod host;

use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand};
use pocket_arcade_core::GameConfig;
use pocket_arcade_engine::{Outcome, Session, Timing};
use pocket_arcade_input::{Debouncer, ScriptedInput};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    catalog::GameKind,
    host::{HostDevice, StdinButtons, StdoutDisplay},
};

/// Tiny grid games for a monochrome panel and four buttons.
#[derive(Debug, Parser)]
#[command(name = "pocket-arcade", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lists the bundled games with their stock configuration.
    List,
    /// Plays one game until it is won or lost.
    Play(PlayArgs),
}

#[derive(Debug, Args)]
struct PlayArgs {
    /// Game to play; defaults to the kind named in --config, else pursuit.
    #[arg(long, value_enum)]
    game: Option<GameKind>,
    /// TOML file replacing the stock configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for the board layout and spawns.
    #[arg(long)]
    seed: Option<u64>,
    /// Presses to replay instead of reading stdin, one key per poll
    /// (`wasd` or `hjkl`, `.` for an idle poll).
    #[arg(long)]
    script: Option<String>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Command::List => list(),
        Command::Play(args) => play(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command_failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn list() -> Result<()> {
    for kind in catalog::GAMES {
        let config = toml::to_string(&kind.default_config())
            .with_context(|| format!("failed to render the {} configuration", kind.title()))?;
        println!("# {}", kind.title());
        println!("{config}");
    }
    Ok(())
}

fn play(args: PlayArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            GameConfig::from_toml(&text)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => args.game.unwrap_or_default().default_config(),
    };
    if let Some(kind) = args.game {
        ensure!(
            GameKind::of(&config) == kind,
            "--game {kind:?} does not match the configured game"
        );
    }
    if args.seed.is_some() {
        config.set_seed(args.seed);
    }

    let timing = Timing::for_config(&config);
    let rules = catalog::build(config).context("configuration rejected")?;
    let session = Session::new(rules, timing);
    let mut display = StdoutDisplay::new();
    let mut device = HostDevice;

    let outcome: Outcome = match &args.script {
        Some(script) => {
            let mut input = ScriptedInput::parse(script).context("invalid --script")?;
            session.run(&mut input, &mut display, &mut device)?
        }
        None => {
            let buttons = StdinButtons::spawn().context("failed to start the stdin reader")?;
            let mut input = Debouncer::new(buttons);
            session.run(&mut input, &mut display, &mut device)?
        }
    };

    // Reached only when the device reset returns.
    info!(terminal = ?outcome.terminal, score = outcome.score, "session_returned");
    Ok(())
}
