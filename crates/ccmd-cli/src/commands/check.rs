//! Check command implementation

use colored::Colorize;

use ccmd_core::{CheckStatus, DriftItem, Reconciler};

use crate::context::ProjectContext;
use crate::error::Result;

/// Run the check command
///
/// Reports installed commands with missing halves, invalid content or an
/// edited entry document, and declared commands that are not installed.
pub fn run_check(ctx: &ProjectContext) -> Result<()> {
    println!("{} Checking installed commands...", "=>".blue().bold());

    let report = Reconciler::new(&ctx.installer, &ctx.lock, &ctx.config).check()?;

    match report.status {
        CheckStatus::Healthy => {
            println!("{} All commands are healthy.", "OK".green().bold());
        }
        CheckStatus::Missing => {
            println!("{} Some commands are missing:", "MISSING".yellow().bold());
            print_items(&report.missing, "-");
            println!();
            println!("Run {} to repair.", "ccmd sync".cyan());
        }
        CheckStatus::Drifted => {
            println!("{} Some commands have drifted:", "DRIFTED".red().bold());
            print_items(&report.drifted, "!");
            if !report.missing.is_empty() {
                println!();
                println!("{} Also missing:", "MISSING".yellow().bold());
                print_items(&report.missing, "-");
            }
            println!();
            println!("Run {} to reinstall.", "ccmd install --force <repo>".cyan());
        }
    }

    for message in &report.messages {
        println!("   {} {}", "note:".dimmed(), message);
    }
    Ok(())
}

fn print_items(items: &[DriftItem], marker: &str) {
    for item in items {
        println!(
            "   {} {} ({}): {}",
            marker.yellow(),
            item.name.cyan(),
            item.file.dimmed(),
            item.description
        );
    }
}
