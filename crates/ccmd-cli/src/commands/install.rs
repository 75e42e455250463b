//! Install command implementation

use colored::Colorize;

use ccmd_core::InstallRequest;

use super::{downgrade_partial, print_warnings};
use crate::context::ProjectContext;
use crate::error::{CliError, Result};

/// Run the install command
///
/// With a repository, installs that one package. Without one, installs
/// everything ccmd.yaml declares that is not installed yet.
pub fn run_install(
    ctx: &ProjectContext,
    repo: Option<&str>,
    version: Option<&str>,
    name: Option<&str>,
    force: bool,
) -> Result<()> {
    let Some(repo) = repo else {
        if version.is_some() || name.is_some() {
            return Err(CliError::user(
                "--version and --name need a repository to install",
            ));
        }
        return install_declared(ctx, force);
    };

    println!("{} Installing {}...", "=>".blue().bold(), repo.cyan());

    let mut request = InstallRequest::new(repo).force(force);
    if let Some(version) = version {
        request = request.with_version(version);
    }
    if let Some(name) = name {
        request = request.with_name(name);
    }

    let outcome = ctx.installer.install(&ctx.lock, &ctx.config, &request)?;

    println!(
        "{} Installed {} {} from {}",
        "OK".green().bold(),
        outcome.name.cyan(),
        outcome.version,
        outcome.source.dimmed()
    );
    print_warnings(&outcome.warnings);
    Ok(())
}

fn install_declared(ctx: &ProjectContext, force: bool) -> Result<()> {
    ctx.require_manifest()?;
    println!(
        "{} Installing commands from {}...",
        "=>".blue().bold(),
        "ccmd.yaml".cyan()
    );

    let report = match ctx
        .installer
        .install_from_config(&ctx.lock, &ctx.config, force)
    {
        Ok(report) => report,
        Err(e) => return downgrade_partial(e),
    };

    if report.succeeded.is_empty() {
        println!(
            "{} All declared commands are installed.",
            "OK".green().bold()
        );
    } else {
        println!("{} Installed:", "OK".green().bold());
        for name in &report.succeeded {
            println!("   {} {}", "+".green(), name);
        }
    }
    print_warnings(&report.warnings);
    Ok(())
}
