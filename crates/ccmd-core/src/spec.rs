//! Repository specification parsing and normalization.
//!
//! A spec is what a user types after `ccmd install`: `owner/repo`,
//! `host/owner/repo`, a full URL, an scp-like SSH address or an absolute
//! local path, optionally followed by `@<ref>`.

use std::path::Path;

use crate::{Error, Result};

/// Forge used for bare `owner/repo` shorthand.
pub const DEFAULT_HOST: &str = "github.com";

const PASS_THROUGH_SCHEMES: [&str; 4] = ["http://", "https://", "ssh://", "git://"];
const FILE_SCHEME: &str = "file://";

/// A parsed repository specification. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySpec {
    /// The input exactly as given.
    pub raw: String,
    /// Absolute, fetchable URL.
    pub url: String,
    /// Tag, branch or commit to fetch.
    pub version: Option<String>,
    /// Command name override.
    pub name: Option<String>,
}

impl RepositorySpec {
    /// Install name: the override, else the last segment of the repository path.
    pub fn command_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        extract_repo_path(&self.url)
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// Key under which the project manifest declares this repository.
    pub fn config_key(&self) -> String {
        config_key_for_url(&self.url)
    }
}

/// Parses and normalizes repository specs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecResolver {
    default_host: String,
}

impl Default for SpecResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecResolver {
    pub fn new() -> Self {
        Self {
            default_host: DEFAULT_HOST.to_string(),
        }
    }

    pub fn with_default_host(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            default_host: host.trim().trim_matches('/').to_string(),
        }
    }

    pub fn default_host(&self) -> &str {
        &self.default_host
    }

    /// Parse `input` into a spec with a normalized URL and optional ref.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for empty input, an empty repository portion,
    /// a repository without an `owner/repo` path, or a malformed ref.
    pub fn parse(&self, input: &str) -> Result<RepositorySpec> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_input("repository spec must not be empty"));
        }

        let (repo, version) = split_version(trimmed);
        let repo = repo.trim();
        if repo.is_empty() {
            return Err(Error::invalid_input(format!(
                "repository is empty in spec '{input}'"
            )));
        }
        if let Some(version) = &version {
            check_ref(version)?;
        }

        let url = self.normalize(repo);
        let path = extract_repo_path(&url);
        let has_path = if url.starts_with(FILE_SCHEME) {
            !path.is_empty()
        } else {
            path.contains('/')
        };
        if !has_path {
            return Err(Error::invalid_input(format!(
                "'{repo}' does not name a repository (expected owner/repo)"
            )));
        }

        tracing::debug!(input, %url, ?version, "Parsed repository spec");
        Ok(RepositorySpec {
            raw: input.to_string(),
            url,
            version,
            name: None,
        })
    }

    /// Parse `input` and apply explicit overrides.
    ///
    /// A version override wins over an `@ref` suffix in `input`. Empty
    /// overrides count as absent.
    pub fn resolve(
        &self,
        input: &str,
        version_override: Option<&str>,
        name_override: Option<&str>,
    ) -> Result<RepositorySpec> {
        let mut spec = self.parse(input)?;
        if let Some(version) = non_empty(version_override) {
            check_ref(version)?;
            spec.version = Some(version.to_string());
        }
        if let Some(name) = non_empty(name_override) {
            spec.name = Some(name.to_string());
        }
        Ok(spec)
    }

    /// Turn a repository portion (no `@ref`) into an absolute fetch URL.
    ///
    /// Pure and idempotent: `normalize(normalize(x)) == normalize(x)`.
    pub fn normalize(&self, repo: &str) -> String {
        let repo = repo.trim().trim_end_matches('/');

        if repo.starts_with(FILE_SCHEME) {
            return repo.to_string();
        }
        if is_local_path(repo) {
            return format!("{FILE_SCHEME}{repo}");
        }
        if repo.starts_with("git@") || PASS_THROUGH_SCHEMES.iter().any(|s| repo.starts_with(s))
        {
            return with_git_suffix(repo);
        }

        let first = repo.split('/').next().unwrap_or_default();
        if looks_like_host(first) {
            format!("https://{}", with_git_suffix(repo))
        } else {
            format!("https://{}/{}", self.default_host, with_git_suffix(repo))
        }
    }

    /// Normalized declaration key for `repo`, e.g. `github.com/acme/tool`.
    pub fn config_key(&self, repo: &str) -> Result<String> {
        Ok(self.parse(repo)?.config_key())
    }
}

/// Split an optional `@ref` suffix off `input`.
///
/// The last unescaped `@` inside the repository path starts the ref, so refs
/// may contain `/` (`acme/tool@release/1.0`). An `@` in the authority part
/// (`git@host:`, `https://me@host/`) never does. `\@` stands for a literal
/// `@` in the repository portion.
pub fn split_version(input: &str) -> (String, Option<String>) {
    let path_start = repo_path_start(input);
    let mut split_at = None;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '@' if i >= path_start => split_at = Some(i),
            _ => {}
        }
    }

    let (repo, version) = match split_at {
        Some(i) => {
            let version = &input[i + 1..];
            (&input[..i], (!version.is_empty()).then(|| version.to_string()))
        }
        None => (input, None),
    };
    (repo.replace("\\@", "@"), version)
}

/// Byte offset where the repository path begins, past any authority.
fn repo_path_start(input: &str) -> usize {
    if let Some((scheme, rest)) = input.split_once("://") {
        let authority_start = scheme.len() + 3;
        return rest
            .find('/')
            .map_or(input.len(), |slash| authority_start + slash);
    }
    // scp-like: user@host:owner/repo
    if let Some((authority, _)) = input.split_once(':')
        && !authority.contains('/')
        && authority.contains('@')
    {
        return authority.len() + 1;
    }
    0
}

/// The `owner/repo` path of a normalized URL, without host or `.git`.
///
/// Returns an empty string when `url` cannot be parsed; callers decide
/// whether that matters.
pub fn extract_repo_path(url: &str) -> String {
    match split_url(url) {
        Some((_, path)) => clean_path(path),
        None => String::new(),
    }
}

fn config_key_for_url(url: &str) -> String {
    if let Some(path) = url.strip_prefix(FILE_SCHEME) {
        return path.to_string();
    }
    // Only forge URLs collapse to host/path; SSH and git:// keep their transport.
    let is_web = url.starts_with("https://") || url.starts_with("http://");
    match split_url(url) {
        Some((host, path)) if is_web && !host.is_empty() => {
            format!("{host}/{}", clean_path(path))
        }
        _ => url.to_string(),
    }
}

/// Split a URL into `(host, path)`.
fn split_url(url: &str) -> Option<(&str, &str)> {
    if let Some(rest) = url.strip_prefix(FILE_SCHEME) {
        return Some(("", rest));
    }
    if let Some((_, rest)) = url.split_once("://") {
        let (authority, path) = rest.split_once('/')?;
        let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
        return Some((host, path));
    }
    // scp-like: user@host:owner/repo
    if let Some((authority, path)) = url.split_once(':')
        && !authority.contains('/')
        && let Some((_, host)) = authority.rsplit_once('@')
    {
        return Some((host, path));
    }
    None
}

fn clean_path(path: &str) -> String {
    let path = path.trim_matches('/');
    path.strip_suffix(".git")
        .unwrap_or(path)
        .trim_end_matches('/')
        .to_string()
}

fn with_git_suffix(repo: &str) -> String {
    if repo.ends_with(".git") {
        repo.to_string()
    } else {
        format!("{repo}.git")
    }
}

fn looks_like_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

fn is_local_path(repo: &str) -> bool {
    repo.starts_with('/') || Path::new(repo).is_absolute()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn check_ref(reference: &str) -> Result<()> {
    if reference.starts_with('-') || reference.chars().any(char::is_whitespace) {
        return Err(Error::invalid_input(format!(
            "'{reference}' is not a valid version or ref"
        )));
    }
    Ok(())
}
