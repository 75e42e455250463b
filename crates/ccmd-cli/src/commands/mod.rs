//! Command implementations for ccmd-cli

pub mod check;
pub mod install;
pub mod remove;
pub mod sync;

pub use check::run_check;
pub use install::run_install;
pub use remove::run_remove;
pub use sync::run_sync;

use colored::Colorize;

use crate::error::Result;

/// Print a partial batch failure as a warning and carry on; anything else
/// is returned as the command's error.
fn downgrade_partial(err: ccmd_core::Error) -> Result<()> {
    match err {
        ccmd_core::Error::PartialFailure(failure) => {
            println!(
                "{} {} of {} item(s) failed:",
                "WARNING".yellow().bold(),
                failure.failed.len(),
                failure.failed.len() + failure.succeeded.len()
            );
            for name in &failure.succeeded {
                println!("   {} {}", "+".green(), name);
            }
            for item in &failure.failed {
                println!("   {} {}: {}", "!".red(), item.name.cyan(), item.error);
            }
            Ok(())
        }
        other => Err(other.into()),
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("   {} {}", "warning:".yellow(), warning);
    }
}
