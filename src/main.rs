//! Unfurl CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use unfurl::{resolve_playbook, Play};

/// Unfurl - resolve Ansible-style playbooks into a flattened task list
#[derive(Parser, Debug)]
#[command(name = "unfurl")]
#[command(version)]
#[command(about = "Resolve Ansible-style playbooks into a flattened task list", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a playbook and print its plays and tasks
    Resolve(ResolveArgs),
}

#[derive(clap::Args, Debug)]
struct ResolveArgs {
    /// Path to the playbook file to resolve
    playbook: PathBuf,

    /// Path to the base directory containing roles
    #[arg(short = 'r', long = "roles-path", env = "UNFURL_ROLES_PATH")]
    roles_path: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Resolve(args) => resolve(args, cli.verbose),
    }
}

fn resolve(args: &ResolveArgs, verbosity: u8) -> Result<()> {
    let data = std::fs::read(&args.playbook)
        .map_err(|e| anyhow!("failed to read playbook '{}': {e}", args.playbook.display()))?;

    let plays = resolve_playbook(&data, &args.playbook, &args.roles_path)?;

    for play in &plays {
        print_play(play, verbosity)?;
    }

    Ok(())
}

fn print_play(play: &Play, verbosity: u8) -> Result<()> {
    println!(
        "{} {} (hosts: {})",
        "▶ Play:".cyan().bold(),
        play.name,
        play.hosts
    );

    for task in &play.tasks {
        println!("  {} {}", "▸ Task:".green(), task.name);
        println!("    Module: {}", task.module);
        println!("    Args: {}", serde_json::to_string(&task.args)?);
        if !task.vars.is_empty() {
            println!("    Vars: {}", serde_json::to_string(&task.vars)?);
        }
        if !task.loop_.is_empty() {
            println!("    Loop: {}", task.loop_);
        }
        if verbosity >= 1 {
            println!("    Source: {}", task.source.display());
        }
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(verbosity >= 3)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();
}
