//! Check types for installed-state validation

use serde::{Deserialize, Serialize};

/// Overall result of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    /// Every installed package is whole and unchanged
    Healthy,
    /// Some packages (or halves of them) are absent
    Missing,
    /// Some packages differ from what was installed
    Drifted,
}

/// A package that is missing or has drifted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftItem {
    /// Command name
    pub name: String,
    /// The file or directory affected
    pub file: String,
    /// Human-readable description of the problem
    pub description: String,
}

impl DriftItem {
    pub fn new(
        name: impl Into<String>,
        file: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            description: description.into(),
        }
    }
}

/// Report from [`Reconciler::check`](super::Reconciler::check)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub status: CheckStatus,
    pub drifted: Vec<DriftItem>,
    pub missing: Vec<DriftItem>,
    /// Notes that do not affect the status
    pub messages: Vec<String>,
}

impl CheckReport {
    pub fn healthy() -> Self {
        Self {
            status: CheckStatus::Healthy,
            drifted: Vec::new(),
            missing: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn with_missing(missing: Vec<DriftItem>) -> Self {
        Self {
            status: CheckStatus::Missing,
            missing,
            ..Self::healthy()
        }
    }

    pub fn with_drifted(drifted: Vec<DriftItem>) -> Self {
        Self {
            status: CheckStatus::Drifted,
            drifted,
            ..Self::healthy()
        }
    }

    /// Combine two reports; the status is the worse of the two
    /// (Drifted > Missing > Healthy).
    pub fn merge(mut self, other: CheckReport) -> Self {
        self.drifted.extend(other.drifted);
        self.missing.extend(other.missing);
        self.messages.extend(other.messages);

        self.status = match (self.status, other.status) {
            (CheckStatus::Drifted, _) | (_, CheckStatus::Drifted) => CheckStatus::Drifted,
            (CheckStatus::Missing, _) | (_, CheckStatus::Missing) => CheckStatus::Missing,
            (CheckStatus::Healthy, CheckStatus::Healthy) => CheckStatus::Healthy,
        };
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == CheckStatus::Healthy
    }
}
