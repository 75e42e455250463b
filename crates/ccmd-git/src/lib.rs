//! Repository fetch capability for ccmd
//!
//! The installer treats fetching as an opaque capability: given a URL, an
//! optional ref and a target directory, put the repository's tree there.
//! [`GitFetcher`] implements it with `git2`.

pub mod clone;
pub mod error;
pub mod fetcher;

pub use clone::GitFetcher;
pub use error::{Error, Result};
pub use fetcher::{FetchOutcome, FetchRequest, Fetcher};
