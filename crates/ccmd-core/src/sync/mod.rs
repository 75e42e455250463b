//! Reconciliation of declared commands against installed ones
//!
//! The [`Reconciler`] diffs the project manifest against the lock store by
//! derived command name, installs what is missing, removes what is extra and
//! reports per-item failures without aborting the batch. [`Reconciler::check`]
//! inspects installed packages for missing halves and content drift.

mod check;
mod engine;
mod plan;

pub use check::{CheckReport, CheckStatus, DriftItem};
pub use engine::{AssumeNo, AssumeYes, Reconciler, RemovalPrompt, SyncOptions, SyncReport};
pub use plan::{PlannedInstall, SyncPlan, compute_plan};
