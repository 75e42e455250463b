//! Interactive confirmations
//!
//! Uses dialoguer on a terminal. Without one every question is answered
//! "no", so scripted runs never remove anything they were not told to.

use std::io::IsTerminal;

use ccmd_core::{LockEntry, RemovalPrompt};
use dialoguer::Confirm;

use crate::error::Result;

/// Ask a yes/no question, defaulting to "no".
pub fn confirm(prompt: &str) -> Result<bool> {
    if !std::io::stdin().is_terminal() || !std::io::stderr().is_terminal() {
        tracing::debug!(prompt, "Not a terminal, declining");
        return Ok(false);
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// Confirms sync removals on the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl RemovalPrompt for TerminalPrompt {
    fn confirm_removal(&self, entry: &LockEntry) -> bool {
        let question = format!(
            "Remove '{}' ({}), which is no longer declared?",
            entry.name, entry.source
        );
        confirm(&question).unwrap_or_else(|e| {
            tracing::warn!(name = %entry.name, error = %e, "Prompt failed, keeping command");
            false
        })
    }
}
