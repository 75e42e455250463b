//! ccmd CLI
//!
//! Installs, removes and synchronizes command packages for a project.

mod cli;
mod commands;
mod context;
mod error;
mod interactive;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use context::ProjectContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        // No command provided - show help hint
        println!("{} command package manager", "ccmd".green().bold());
        println!();
        println!("Run {} for available commands.", "ccmd --help".cyan());
        return Ok(());
    };

    let ctx = ProjectContext::open(&cli.project)?;
    execute_command(&ctx, command)
}

/// Log to stderr. `RUST_LOG` selects the filter, defaulting to `warn`;
/// `--verbose` forces `debug`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("{}: failed to set up logging: {e}", "warning".yellow());
    }
    tracing::debug!("Verbose mode enabled");
}

fn execute_command(ctx: &ProjectContext, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Install {
            repo,
            version,
            name,
            force,
        } => commands::run_install(
            ctx,
            repo.as_deref(),
            version.as_deref(),
            name.as_deref(),
            force,
        ),
        Commands::Remove { name, force, save } => commands::run_remove(ctx, &name, force, save),
        Commands::Sync { dry_run, force } => commands::run_sync(ctx, dry_run, force),
        Commands::Check => commands::run_check(ctx),
    }
}
