//! GitFetcher tests against local bare repositories.

use ccmd_git::{Error, FetchRequest, Fetcher, GitFetcher};
use ccmd_test_utils::PackageFixture;
use ccmd_test_utils::git::PackageRepo;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn published_repo(root: &std::path::Path) -> PackageRepo {
    let repo = PackageRepo::create(root, "acme", "tool");
    repo.commit(&PackageFixture::new("tool", "1.0.0"), Some("v1.0.0"));
    repo.commit(
        &PackageFixture::new("tool", "2.0.0").with_body("# tool\n\nSecond release.\n"),
        Some("v2.0.0"),
    );
    repo.publish();
    repo
}

#[test]
fn test_fetch_default_branch_gets_latest_commit() {
    let root = TempDir::new().unwrap();
    let repo = published_repo(root.path());
    let dest = root.path().join("staging/tool");

    let outcome = GitFetcher::new()
        .fetch(&FetchRequest::new(&repo.url(), None), &dest)
        .unwrap();

    let manifest = fs::read_to_string(dest.join("ccmd.yaml")).unwrap();
    assert!(manifest.contains("version: \"2.0.0\""));
    let commit = outcome.commit.expect("commit should be reported");
    assert_eq!(commit.len(), 40);
}

#[test]
fn test_fetch_tag_checks_out_that_release() {
    let root = TempDir::new().unwrap();
    let repo = published_repo(root.path());
    let dest = root.path().join("staging/tool");

    let outcome = GitFetcher::new()
        .fetch(&FetchRequest::new(&repo.url(), Some("v1.0.0")), &dest)
        .unwrap();

    let manifest = fs::read_to_string(dest.join("ccmd.yaml")).unwrap();
    assert!(manifest.contains("version: \"1.0.0\""));

    let latest = GitFetcher::new()
        .fetch(
            &FetchRequest::new(&repo.url(), None),
            &root.path().join("staging/latest"),
        )
        .unwrap();
    assert_ne!(outcome.commit, latest.commit);
}

#[test]
fn test_fetch_unknown_reference_fails() {
    let root = TempDir::new().unwrap();
    let repo = published_repo(root.path());

    let err = GitFetcher::new()
        .fetch(
            &FetchRequest::new(&repo.url(), Some("v9.9.9")),
            &root.path().join("staging/tool"),
        )
        .unwrap_err();

    assert!(
        matches!(err, Error::ReferenceNotFound { ref reference, .. } if reference == "v9.9.9"),
        "expected ReferenceNotFound, got: {err:?}"
    );
}

#[test]
fn test_fetch_missing_repository_fails_with_clone_error() {
    let root = TempDir::new().unwrap();
    let url = format!("file://{}", root.path().join("nope/missing.git").display());

    let err = GitFetcher::new()
        .fetch(
            &FetchRequest::new(&url, None),
            &root.path().join("staging/missing"),
        )
        .unwrap_err();

    assert!(matches!(err, Error::Clone { .. }), "got: {err:?}");
}
