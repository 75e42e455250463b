//! Aggregation of per-item results for batch operations

use std::fmt;

use crate::{Error, Result};

/// One failed item of a batch.
#[derive(Debug)]
pub struct ItemFailure {
    /// Command name, or the declared repository when no name could be derived
    pub name: String,
    pub error: Error,
}

impl ItemFailure {
    pub fn new(name: impl Into<String>, error: Error) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

/// Payload of [`Error::PartialFailure`] and [`Error::BatchFailed`].
#[derive(Debug, Default)]
pub struct BatchFailure {
    pub succeeded: Vec<String>,
    pub failed: Vec<ItemFailure>,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} item(s) failed",
            self.failed.len(),
            self.failed.len() + self.succeeded.len()
        )?;
        for failure in &self.failed {
            write!(f, "; {}: {}", failure.name, failure.error)?;
        }
        Ok(())
    }
}

/// Outcome of a batch that did not fail outright.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    /// Items that needed no work
    pub skipped: Vec<String>,
    pub failed: Vec<ItemFailure>,
    pub warnings: Vec<String>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the batch aggregation rule.
    ///
    /// No failures is `Ok`. Failures with at least one success is
    /// [`Error::PartialFailure`]; failures with no success is
    /// [`Error::BatchFailed`].
    pub fn into_result(mut self) -> Result<Self> {
        let failed = std::mem::take(&mut self.failed);
        aggregate(self.succeeded.clone(), failed)?;
        Ok(self)
    }
}

/// Turn collected successes and failures into the batch result.
pub fn aggregate(succeeded: Vec<String>, failed: Vec<ItemFailure>) -> Result<()> {
    if failed.is_empty() {
        return Ok(());
    }
    let failure = BatchFailure { succeeded, failed };
    if failure.succeeded.is_empty() {
        Err(Error::BatchFailed(failure))
    } else {
        Err(Error::PartialFailure(failure))
    }
}

/// Run a side step whose failure must not change the primary result.
///
/// On error the failure is logged and its message appended to `warnings`.
pub fn best_effort<T>(step: &str, result: Result<T>, warnings: &mut Vec<String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(step, error = %e, "Best-effort step failed");
            warnings.push(format!("{step}: {e}"));
            None
        }
    }
}
