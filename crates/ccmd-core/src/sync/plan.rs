//! Declared-versus-installed diff

use std::collections::BTreeSet;

use crate::Error;
use crate::batch::ItemFailure;
use crate::config::CommandSpec;
use crate::spec::SpecResolver;

/// A declared command that is not installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedInstall {
    pub name: String,
    /// Repository as declared
    pub repo: String,
    pub version: Option<String>,
}

/// What a sync would do.
#[derive(Debug, Default)]
pub struct SyncPlan {
    pub to_install: Vec<PlannedInstall>,
    /// Installed commands with no declaration
    pub to_remove: Vec<String>,
    /// Declared and installed
    pub in_sync: Vec<String>,
    /// Declarations that cannot be acted on
    pub errors: Vec<ItemFailure>,
}

impl SyncPlan {
    /// Whether there is nothing to do and nothing wrong.
    pub fn is_empty(&self) -> bool {
        self.to_install.is_empty() && self.to_remove.is_empty() && self.errors.is_empty()
    }
}

/// Diff `declared` against the `installed` command names.
///
/// `to_install` is declared minus installed and `to_remove` installed minus
/// declared, both by derived command name. A declaration whose repository
/// does not parse, or whose name repeats an earlier one, becomes an error
/// item; the first declaration of a name still counts.
pub fn compute_plan(
    resolver: &SpecResolver,
    declared: &[CommandSpec],
    installed: &[String],
) -> SyncPlan {
    let installed_set: BTreeSet<&str> = installed.iter().map(String::as_str).collect();
    let mut declared_names = BTreeSet::new();
    let mut plan = SyncPlan::default();

    for command in declared {
        let name = match resolver.parse(&command.repo) {
            Ok(spec) => spec.command_name(),
            Err(e) => {
                plan.errors.push(ItemFailure::new(&command.repo, e));
                continue;
            }
        };
        if !declared_names.insert(name.clone()) {
            let err = Error::invalid_input(format!(
                "'{}' derives the name '{name}', which is already declared",
                command.repo
            ));
            plan.errors.push(ItemFailure::new(name, err));
            continue;
        }

        if installed_set.contains(name.as_str()) {
            plan.in_sync.push(name);
        } else {
            plan.to_install.push(PlannedInstall {
                name,
                repo: command.repo.clone(),
                version: command.version.clone(),
            });
        }
    }

    plan.to_remove = installed
        .iter()
        .filter(|name| !declared_names.contains(name.as_str()))
        .cloned()
        .collect();
    plan
}
