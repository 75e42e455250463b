//! Shared test utilities for the ccmd workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`package`]: [`PackageFixture`](package::PackageFixture) describing a command package
//! - [`fetcher`]: [`FakeFetcher`](fetcher::FakeFetcher), an in-memory fetch capability
//! - [`git`]: real git repositories publishing package fixtures
//! - [`project`]: [`TestProject`](project::TestProject) temporary project directory

pub mod fetcher;
pub mod git;
pub mod package;
pub mod project;

pub use fetcher::FakeFetcher;
pub use package::PackageFixture;
pub use project::TestProject;
