//! GitHub storage implementation.
//!
//! Reads raw files from `raw.githubusercontent.com` and lists content paths
//! through the git trees API. Both use one blocking [`ureq::Agent`] with a
//! global timeout.

use std::time::Duration;

use serde::Deserialize;
use ureq::Agent;

use crate::storage::{
    ContentSource, ErrorStatus, PathLister, StorageError, StorageErrorKind, is_content_path,
    version_root,
};

/// Backend identifier for error messages.
const BACKEND: &str = "Github";

/// Body the raw endpoint may return with a successful status for a missing file.
const NOT_FOUND_BODY: &str = "404: Not Found";

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Connection settings for [`GithubStorage`].
#[derive(Clone, Debug)]
pub struct GithubConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Personal access token sent as a bearer credential.
    pub token: Option<String>,
    /// Value of the `X-GitHub-Api-Version` header.
    pub api_version: String,
    pub user_agent: String,
    /// Base URL for raw file reads.
    pub raw_base: String,
    /// Base URL for the REST API.
    pub api_base: String,
    /// Docs directory inside the repository.
    pub docs_dir: String,
    pub timeout: Duration,
}

impl GithubConfig {
    /// Settings for a repository with public GitHub endpoints.
    #[must_use]
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: "main".to_owned(),
            token: None,
            api_version: "2022-11-28".to_owned(),
            user_agent: "docsite".to_owned(),
            raw_base: "https://raw.githubusercontent.com".to_owned(),
            api_base: "https://api.github.com".to_owned(),
            docs_dir: "docs".to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT),
        }
    }
}

/// Entry of a git tree listing.
#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Git trees API response.
#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

/// Content source and path lister backed by a GitHub repository.
pub struct GithubStorage {
    agent: Agent,
    config: GithubConfig,
}

impl GithubStorage {
    /// Create storage for the given repository settings.
    #[must_use]
    pub fn new(config: GithubConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent, config }
    }

    /// Repository settings.
    #[must_use]
    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    fn raw_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.config.raw_base.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            self.config.branch,
            path.trim_start_matches('/')
        )
    }

    fn tree_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.config.api_base.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            self.config.branch
        )
    }

    /// Issue a GET with the GitHub headers, returning status and body.
    fn get(&self, url: &str, path: &str) -> Result<(u16, String), StorageError> {
        let mut request = self
            .agent
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", &self.config.api_version)
            .header("User-Agent", &self.config.user_agent);
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        let response = request.call().map_err(|e| transport_error(e, path))?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| transport_error(e, path))?;

        Ok((status, body))
    }
}

impl ContentSource for GithubStorage {
    fn read(&self, path: &str) -> Result<Option<String>, StorageError> {
        let url = self.raw_url(path);
        tracing::debug!(%url, "Fetching raw content");

        let (status, body) = self.get(&url, path)?;
        interpret_raw(status, body, path)
    }
}

impl PathLister for GithubStorage {
    fn list(&self, version: &str) -> Result<Vec<String>, StorageError> {
        let url = self.tree_url();
        tracing::debug!(%url, version, "Fetching git tree");

        let (status, body) = self.get(&url, &self.config.docs_dir)?;
        if !(200..300).contains(&status) {
            return Err(status_error(status, &self.config.docs_dir));
        }

        let root = version_root(&self.config.docs_dir, version);
        filter_tree(&body, &root)
    }
}

/// Interpret a raw-file response.
///
/// A 404 status or a successful response whose body is the literal
/// `404: Not Found` is absence.
fn interpret_raw(status: u16, body: String, path: &str) -> Result<Option<String>, StorageError> {
    match status {
        404 => Ok(None),
        200..=299 if body.trim_end() == NOT_FOUND_BODY => Ok(None),
        200..=299 => Ok(Some(body)),
        _ => Err(status_error(status, path)),
    }
}

/// Map a failing HTTP status to a storage error.
fn status_error(status: u16, path: &str) -> StorageError {
    let (kind, retry) = match status {
        401 | 403 => (StorageErrorKind::PermissionDenied, ErrorStatus::Permanent),
        404 => (StorageErrorKind::NotFound, ErrorStatus::Permanent),
        408 => (StorageErrorKind::Timeout, ErrorStatus::Temporary),
        429 => (StorageErrorKind::RateLimited, ErrorStatus::Persistent),
        500..=599 => (StorageErrorKind::Unavailable, ErrorStatus::Persistent),
        _ => (StorageErrorKind::Other, ErrorStatus::Permanent),
    };

    StorageError::new(kind)
        .with_status(retry)
        .with_backend(BACKEND)
        .with_path(path)
        .with_message(format!("HTTP {status}"))
}

/// Map a transport-level failure to a storage error.
fn transport_error(err: ureq::Error, path: &str) -> StorageError {
    let (kind, retry) = match &err {
        ureq::Error::Timeout(_) => (StorageErrorKind::Timeout, ErrorStatus::Temporary),
        ureq::Error::ConnectionFailed | ureq::Error::HostNotFound | ureq::Error::Io(_) => {
            (StorageErrorKind::Unavailable, ErrorStatus::Temporary)
        }
        _ => (StorageErrorKind::Other, ErrorStatus::Permanent),
    };

    StorageError::new(kind)
        .with_status(retry)
        .with_backend(BACKEND)
        .with_path(path)
        .with_source(err)
}

/// Keep content blobs below `root`, preserving listing order.
fn filter_tree(body: &str, root: &str) -> Result<Vec<String>, StorageError> {
    let response: TreeResponse = serde_json::from_str(body).map_err(|e| {
        StorageError::new(StorageErrorKind::Other)
            .with_backend(BACKEND)
            .with_source(e)
    })?;

    if response.truncated {
        tracing::warn!(root, "Git tree listing truncated, some pages may be missing");
    }

    Ok(response
        .tree
        .into_iter()
        .filter(|entry| entry.kind == "blob")
        .filter(|entry| entry.path.starts_with(root) && is_content_path(&entry.path))
        .map(|entry| entry.path)
        .collect())
}
