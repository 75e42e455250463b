//! The fetch capability trait

use std::path::Path;

use crate::Result;

/// What to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest<'a> {
    /// Absolute, fetchable repository URL.
    pub url: &'a str,
    /// Tag, branch or commit to check out. `None` means the default branch.
    pub reference: Option<&'a str>,
}

impl<'a> FetchRequest<'a> {
    pub fn new(url: &'a str, reference: Option<&'a str>) -> Self {
        Self { url, reference }
    }
}

/// What a successful fetch produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Commit id checked out into the destination, when known.
    pub commit: Option<String>,
}

/// Puts the tree of a repository into a destination directory.
///
/// `dest` must not exist yet; its parent does. On error the implementation
/// may leave partial content behind; callers fetch into a staging area they
/// discard on failure.
pub trait Fetcher: std::fmt::Debug + Send + Sync {
    fn fetch(&self, request: &FetchRequest<'_>, dest: &Path) -> Result<FetchOutcome>;
}
