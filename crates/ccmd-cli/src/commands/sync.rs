//! Sync command implementation

use colored::Colorize;

use ccmd_core::{Reconciler, SyncOptions};

use super::downgrade_partial;
use crate::context::ProjectContext;
use crate::error::Result;
use crate::interactive::TerminalPrompt;

/// Run the sync command
///
/// Installs declared commands that are missing and removes installed ones
/// that are no longer declared.
pub fn run_sync(ctx: &ProjectContext, dry_run: bool, force: bool) -> Result<()> {
    ctx.require_manifest()?;
    println!("{} Synchronizing commands...", "=>".blue().bold());

    let reconciler = Reconciler::new(&ctx.installer, &ctx.lock, &ctx.config);
    let report = match reconciler.sync(SyncOptions { dry_run, force }, &TerminalPrompt) {
        Ok(report) => report,
        Err(e) => return downgrade_partial(e),
    };

    if report.dry_run {
        if !report.has_changes() && report.failed.is_empty() {
            println!("{} Already synchronized. No changes needed.", "OK".green().bold());
            return Ok(());
        }
        println!("{} Dry run, nothing changed:", "DRY RUN".cyan().bold());
        for name in &report.to_install {
            println!("   {} Would install {}", "+".green(), name);
        }
        for name in &report.to_remove {
            println!("   {} Would remove {}", "-".red(), name);
        }
        for item in &report.failed {
            println!("   {} {}: {}", "!".red(), item.name.cyan(), item.error);
        }
        return Ok(());
    }

    if !report.has_changes() && report.skipped.is_empty() {
        println!("{} Already synchronized. No changes needed.", "OK".green().bold());
        return Ok(());
    }

    println!("{} Synchronization complete:", "OK".green().bold());
    for name in &report.installed {
        println!("   {} Installed {}", "+".green(), name);
    }
    for name in &report.removed {
        println!("   {} Removed {}", "-".red(), name);
    }
    for name in &report.skipped {
        println!("   {} Kept {} (removal declined)", "~".yellow(), name);
    }
    Ok(())
}
