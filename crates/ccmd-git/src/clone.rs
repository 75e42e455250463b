//! Git-backed fetcher

use std::path::Path;

use git2::Repository;
use git2::build::{CheckoutBuilder, RepoBuilder};

use crate::fetcher::{FetchOutcome, FetchRequest, Fetcher};
use crate::{Error, Result};

/// Fetches packages by cloning them with `git2`.
///
/// A requested ref is resolved as given (tag, commit or local ref), then as a
/// remote-tracking branch (`origin/<ref>`), and checked out as a detached
/// HEAD.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitFetcher;

impl GitFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl Fetcher for GitFetcher {
    fn fetch(&self, request: &FetchRequest<'_>, dest: &Path) -> Result<FetchOutcome> {
        let url = request.url;

        // Create parent directories
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ccmd_fs::Error::io(parent, e))?;
        }

        tracing::debug!(url, dest = %dest.display(), "Cloning repository");
        let repo = RepoBuilder::new()
            .clone(url, dest)
            .map_err(|source| Error::Clone {
                url: url.to_string(),
                source,
            })?;

        if let Some(reference) = request.reference {
            checkout_reference(&repo, url, reference)?;
        }

        let commit = repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
            .map(|commit| commit.id().to_string());

        Ok(FetchOutcome { commit })
    }
}

/// Check out `reference` as a detached HEAD.
fn checkout_reference(repo: &Repository, url: &str, reference: &str) -> Result<()> {
    let candidates = [reference.to_string(), format!("origin/{reference}")];
    let object = candidates
        .iter()
        .find_map(|candidate| repo.revparse_single(candidate).ok())
        .ok_or_else(|| Error::ReferenceNotFound {
            url: url.to_string(),
            reference: reference.to_string(),
        })?;

    let checkout_err = |source: git2::Error| Error::Checkout {
        url: url.to_string(),
        reference: reference.to_string(),
        source,
    };

    let commit = object.peel_to_commit().map_err(checkout_err)?;
    repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))
        .map_err(checkout_err)?;
    repo.set_head_detached(commit.id()).map_err(checkout_err)?;

    tracing::debug!(reference, commit = %commit.id(), "Checked out reference");
    Ok(())
}
