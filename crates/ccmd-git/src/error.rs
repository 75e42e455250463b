//! Error types for ccmd-git

/// Result type for ccmd-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching a repository
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to clone {url}: {source}")]
    Clone {
        url: String,
        #[source]
        source: git2::Error,
    },

    #[error("Reference '{reference}' not found in {url}")]
    ReferenceNotFound { url: String, reference: String },

    #[error("Failed to check out '{reference}' from {url}: {source}")]
    Checkout {
        url: String,
        reference: String,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Filesystem error: {0}")]
    Fs(#[from] ccmd_fs::Error),
}
