//! Reconciler: converges installed commands to declared ones

use ccmd_fs::checksum::compute_file_checksum;

use super::check::{CheckReport, DriftItem};
use super::plan::{SyncPlan, compute_plan};
use crate::Result;
use crate::batch::{ItemFailure, aggregate};
use crate::config::ConfigStore;
use crate::installer::Installer;
use crate::layout::DEFAULT_ENTRY;
use crate::lock::{LockEntry, LockStore};
use crate::structure::{StructureIssue, StructureReport, check_structure};

/// Asks whether an extra (undeclared) command may be removed.
pub trait RemovalPrompt {
    fn confirm_removal(&self, entry: &LockEntry) -> bool;
}

/// Confirms every removal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl RemovalPrompt for AssumeYes {
    fn confirm_removal(&self, _entry: &LockEntry) -> bool {
        true
    }
}

/// Declines every removal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeNo;

impl RemovalPrompt for AssumeNo {
    fn confirm_removal(&self, _entry: &LockEntry) -> bool {
        false
    }
}

/// Options for [`Reconciler::sync`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Report the plan without changing anything
    pub dry_run: bool,
    /// Overwrite stray package directories and remove without asking
    pub force: bool,
}

/// Outcome of a sync that did not fail outright
#[derive(Debug, Default)]
pub struct SyncReport {
    pub dry_run: bool,
    /// Names the plan wanted to install
    pub to_install: Vec<String>,
    /// Names the plan wanted to remove
    pub to_remove: Vec<String>,
    pub installed: Vec<String>,
    pub removed: Vec<String>,
    /// Removals the prompt declined
    pub skipped: Vec<String>,
    /// Declarations that could not be acted on (dry run only; otherwise
    /// failures are returned as an error)
    pub failed: Vec<ItemFailure>,
}

impl SyncReport {
    /// Whether the sync changed (or, in a dry run, would change) anything.
    pub fn has_changes(&self) -> bool {
        if self.dry_run {
            !self.to_install.is_empty() || !self.to_remove.is_empty()
        } else {
            !self.installed.is_empty() || !self.removed.is_empty()
        }
    }
}

/// Keeps the lock store and install root consistent with the project
/// manifest.
///
/// Both stores must already be loaded.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    installer: &'a Installer,
    lock: &'a LockStore,
    config: &'a ConfigStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(installer: &'a Installer, lock: &'a LockStore, config: &'a ConfigStore) -> Self {
        Self {
            installer,
            lock,
            config,
        }
    }

    /// Diff declared against installed commands.
    pub fn plan(&self) -> Result<SyncPlan> {
        let declared = self.config.commands()?;
        let installed = self.lock.names()?;
        Ok(compute_plan(self.installer.resolver(), &declared, &installed))
    }

    /// Install missing and remove extra commands.
    ///
    /// Removals are confirmed through `prompt` unless `options.force` is
    /// set; declined removals are reported as skipped. The lock store is
    /// saved once, at the end, if anything changed.
    ///
    /// # Errors
    ///
    /// Per-item failures (including unusable declarations) are collected;
    /// the result is [`crate::Error::PartialFailure`] when some items
    /// succeeded and [`crate::Error::BatchFailed`] when none did.
    pub fn sync(&self, options: SyncOptions, prompt: &dyn RemovalPrompt) -> Result<SyncReport> {
        let plan = self.plan()?;
        let mut report = SyncReport {
            dry_run: options.dry_run,
            to_install: plan.to_install.iter().map(|p| p.name.clone()).collect(),
            to_remove: plan.to_remove.clone(),
            ..SyncReport::default()
        };

        if options.dry_run {
            tracing::debug!(
                install = report.to_install.len(),
                remove = report.to_remove.len(),
                "Dry run, nothing changed"
            );
            report.failed = plan.errors;
            return Ok(report);
        }

        let mut failed = plan.errors;

        for planned in &plan.to_install {
            let result = self
                .installer
                .resolver()
                .resolve(&planned.repo, planned.version.as_deref(), None)
                .and_then(|spec| self.installer.install_spec(self.lock, &spec, options.force));
            match result {
                Ok(outcome) => {
                    tracing::info!(name = %outcome.name, version = %outcome.version, "Installed command");
                    report.installed.push(outcome.name);
                }
                Err(e) => {
                    tracing::warn!(name = %planned.name, error = %e, "Install failed");
                    failed.push(ItemFailure::new(&planned.name, e));
                }
            }
        }

        for name in &plan.to_remove {
            if !options.force {
                let confirmed = match self.lock.get_command(name)? {
                    Some(entry) => prompt.confirm_removal(&entry),
                    None => false,
                };
                if !confirmed {
                    tracing::warn!(%name, "Removal declined, keeping command");
                    report.skipped.push(name.clone());
                    continue;
                }
            }
            match self.installer.remove_installed(self.lock, name) {
                Ok(()) => {
                    tracing::info!(%name, "Removed command");
                    report.removed.push(name.clone());
                }
                Err(e) => {
                    tracing::warn!(%name, error = %e, "Removal failed");
                    failed.push(ItemFailure::new(name, e));
                }
            }
        }

        if report.has_changes() {
            self.lock.save()?;
        }

        let succeeded = report
            .installed
            .iter()
            .chain(&report.removed)
            .cloned()
            .collect();
        aggregate(succeeded, failed)?;
        Ok(report)
    }

    /// Inspect every installed command for missing halves, invalid content
    /// and entry-document drift, and every declared command for absence.
    pub fn check(&self) -> Result<CheckReport> {
        let fs = self.installer.fs();
        let layout = self.installer.layout();
        let mut report = CheckReport::healthy();

        for entry in self.lock.list_commands()? {
            let structure = check_structure(fs, layout, &entry.name);
            report = report.merge(structure_report(&structure));

            if structure.is_valid()
                && let Some(expected) = entry.checksum()
            {
                let relative = entry
                    .metadata
                    .get("entry")
                    .map_or(DEFAULT_ENTRY, String::as_str);
                let path = layout.package_dir(&entry.name).join(relative);
                let problem = match compute_file_checksum(fs, &path) {
                    Ok(actual) if actual == expected => None,
                    Ok(_) => Some("entry document changed since install".to_string()),
                    Err(e) => Some(e.to_string()),
                };
                if let Some(description) = problem {
                    report = report.merge(CheckReport::with_drifted(vec![DriftItem::new(
                        &entry.name,
                        path.display().to_string(),
                        description,
                    )]));
                }
            }
        }

        if self.config.is_loaded() {
            let plan = self.plan()?;
            let missing: Vec<DriftItem> = plan
                .to_install
                .iter()
                .map(|p| DriftItem::new(&p.name, &p.repo, "declared but not installed"))
                .collect();
            if !missing.is_empty() {
                report = report.merge(CheckReport::with_missing(missing));
            }
            report
                .messages
                .extend(plan.to_remove.iter().map(|name| format!("{name} is installed but not declared")));
            report
                .messages
                .extend(plan.errors.iter().map(|f| format!("{}: {}", f.name, f.error)));
        }

        Ok(report)
    }
}

fn structure_report(structure: &StructureReport) -> CheckReport {
    let mut missing = Vec::new();
    let mut drifted = Vec::new();
    for issue in &structure.issues {
        match issue {
            StructureIssue::MissingDirectory(path) | StructureIssue::MissingCompanion(path) => {
                missing.push(DriftItem::new(
                    &structure.name,
                    path.display().to_string(),
                    issue.to_string(),
                ));
            }
            StructureIssue::InvalidPackage(err) => {
                drifted.push(DriftItem::new(
                    &structure.name,
                    err.path.display().to_string(),
                    err.detail.clone(),
                ));
            }
        }
    }

    let mut report = CheckReport::healthy();
    if !missing.is_empty() {
        report = report.merge(CheckReport::with_missing(missing));
    }
    if !drifted.is_empty() {
        report = report.merge(CheckReport::with_drifted(drifted));
    }
    report
}
