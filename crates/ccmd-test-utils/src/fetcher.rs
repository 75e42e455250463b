//! In-memory fetch capability.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use ccmd_fs::FileSystem;
use ccmd_fs::checksum::compute_checksum;
use ccmd_git::{Error, FetchOutcome, FetchRequest, Fetcher, Result};

use crate::package::PackageFixture;

#[derive(Debug, Default)]
struct Published {
    /// Fixture served when no ref (or an unknown ref) is requested.
    default: Option<PackageFixture>,
    by_ref: HashMap<String, PackageFixture>,
}

/// A [`Fetcher`] that writes published [`PackageFixture`]s into a filesystem.
///
/// Every fetch also writes a `.git/HEAD` marker so callers that strip VCS
/// metadata can be checked. The reported commit is a deterministic hash of
/// URL and ref.
#[derive(Debug)]
pub struct FakeFetcher {
    fs: Arc<dyn FileSystem>,
    published: Mutex<HashMap<String, Published>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeFetcher {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            published: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Serve `fixture` for `url` regardless of the requested ref.
    pub fn publish(&self, url: &str, fixture: PackageFixture) {
        let mut published = self.published.lock().unwrap_or_else(PoisonError::into_inner);
        published.entry(url.to_string()).or_default().default = Some(fixture);
    }

    /// Serve `fixture` for `url` only when `reference` is requested.
    pub fn publish_ref(&self, url: &str, reference: &str, fixture: PackageFixture) {
        let mut published = self.published.lock().unwrap_or_else(PoisonError::into_inner);
        published
            .entry(url.to_string())
            .or_default()
            .by_ref
            .insert(reference.to_string(), fixture);
    }

    /// Every `(url, ref)` fetched so far, in order.
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The commit id reported for a fetch of `url` at `reference`.
    pub fn commit_for(url: &str, reference: Option<&str>) -> String {
        let digest = compute_checksum(format!("{url}@{}", reference.unwrap_or("HEAD")).as_bytes());
        digest.trim_start_matches("sha256:")[..40].to_string()
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, request: &FetchRequest<'_>, dest: &Path) -> Result<FetchOutcome> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((
                request.url.to_string(),
                request.reference.map(str::to_string),
            ));

        let fixture = {
            let published = self.published.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = published.get(request.url).ok_or_else(|| Error::Fetch {
                url: request.url.to_string(),
                message: "repository not found".to_string(),
            })?;
            let by_ref = request.reference.and_then(|r| entry.by_ref.get(r));
            match (by_ref, &entry.default) {
                (Some(fixture), _) => fixture.clone(),
                (None, Some(fixture)) => fixture.clone(),
                (None, None) => {
                    return Err(Error::ReferenceNotFound {
                        url: request.url.to_string(),
                        reference: request.reference.unwrap_or("HEAD").to_string(),
                    });
                }
            }
        };

        let io_err = |e: std::io::Error| ccmd_fs::Error::io(dest, e);
        fixture.write_to(self.fs.as_ref(), dest).map_err(io_err)?;
        self.fs
            .create_dir_all(&dest.join(".git"))
            .map_err(io_err)?;
        self.fs
            .write(&dest.join(".git/HEAD"), b"ref: refs/heads/main\n")
            .map_err(io_err)?;

        Ok(FetchOutcome {
            commit: Some(Self::commit_for(request.url, request.reference)),
        })
    }
}
