//! SHA-256 checksum utilities
//!
//! Provides a single canonical checksum format (`sha256:<hex>`) used in lock
//! entries to detect drift in installed entry documents.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::{Error, FileSystem, Result};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of raw bytes.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn compute_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents.
pub fn compute_file_checksum(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let content = fs.read(path).map_err(|e| Error::io(path, e))?;
    Ok(compute_checksum(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryFs;

    #[test]
    fn checksum_has_prefix_and_known_value() {
        let checksum = compute_checksum(b"hello world");
        assert_eq!(
            checksum,
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn different_content_different_checksum() {
        assert_ne!(compute_checksum(b"aaa"), compute_checksum(b"bbb"));
    }

    #[test]
    fn file_checksum_matches_content_checksum() {
        let fs = MemoryFs::new();
        fs.write(Path::new("/test.txt"), b"hello world").unwrap();

        let file_cs = compute_file_checksum(&fs, Path::new("/test.txt")).unwrap();
        assert_eq!(file_cs, compute_checksum(b"hello world"));
    }
}
