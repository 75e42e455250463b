//! Remove command implementation

use colored::Colorize;

use super::print_warnings;
use crate::context::ProjectContext;
use crate::error::{CliError, Result};
use crate::interactive::confirm;

/// Run the remove command
///
/// Asks for confirmation unless `force` is set. With `save`, the
/// declaration is dropped from ccmd.yaml as well.
pub fn run_remove(ctx: &ProjectContext, name: &str, force: bool, save: bool) -> Result<()> {
    // Unknown names fall through to the installer's NotFound without a prompt.
    if !force
        && ctx.lock.has_command(name)?
        && !confirm(&format!("Remove command '{name}'?"))?
    {
        return Err(CliError::user(format!(
            "Removal of '{name}' cancelled (use --force to skip confirmation)"
        )));
    }

    let outcome = ctx.installer.remove(&ctx.lock, &ctx.config, name, save)?;

    println!("{} Removed {}", "OK".green().bold(), outcome.name.cyan());
    print_warnings(&outcome.warnings);
    Ok(())
}
