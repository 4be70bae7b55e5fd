//! Configuration sources: turning a location string into document text.
//!
//! [`ResourceResolver::resolve`] dispatches on [`path::classify`]:
//!
//! | Location                               | Handling                              |
//! |----------------------------------------|---------------------------------------|
//! | existing local file                    | read, must be a `.toml` file          |
//! | `https://github.com/o/r/blob/b/x.toml` | rewritten to raw.githubusercontent    |
//! | GitHub shorthand / `git://`            | resolved by [`git::GitPathResolver`]  |
//! | other `https://` URL                   | fetched directly                      |
//! | any other scheme                       | rejected as non-secure                |

pub mod git;
pub mod http;
pub mod path;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub use git::{GitCli, GitPathResolver, GitReference, GitRemote};
pub use http::{HttpResponse, Method, Transport, UreqTransport};
pub use path::PathType;

use crate::sys::Deadline;
use crate::{Error, Result};

/// Failures while retrieving document text.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("server returned non-success status {0}")]
    Status(u16),

    #[error("URL does not point to a .toml file: {0}")]
    NotToml(String),

    #[error("cannot use non-secure protocol '{0}', use https")]
    InsecureProtocol(String),

    #[error("cannot resolve network location: {0}")]
    Unresolvable(String),

    #[error(transparent)]
    Local(#[from] LocalReadError),
}

/// Failures while reading a local document.
#[derive(Debug, Error)]
pub enum LocalReadError {
    #[error("cannot access {}: {source}", .path.display())]
    Stat { path: PathBuf, source: io::Error },

    #[error("{} is a directory, expected a .toml file", .0.display())]
    IsDirectory(PathBuf),

    #[error("{} is not a .toml file", .0.display())]
    WrongExtension(PathBuf),

    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
}

/// Failures while turning a repository reference into a file.
#[derive(Debug, Error)]
pub enum GitResolutionError {
    #[error("malformed repository reference: {0}")]
    Malformed(String),

    #[error("repository {0} does not exist or is not accessible")]
    Unreachable(String),

    #[error("no config file found in {owner}/{repo} on branch {branch}")]
    NoConfigFile {
        owner: String,
        repo: String,
        branch: String,
    },

    #[error("repository path does not point to a .toml file: {0}")]
    NotToml(String),
}

impl From<LocalReadError> for Error {
    fn from(err: LocalReadError) -> Self {
        Error::Fetch(FetchError::Local(err))
    }
}

/// Read a local `.toml` document.
pub fn read_local_toml(path: &Path) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|source| LocalReadError::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.is_dir() {
        return Err(LocalReadError::IsDirectory(path.to_path_buf()).into());
    }
    if path.extension().is_none_or(|ext| ext != "toml") {
        return Err(LocalReadError::WrongExtension(path.to_path_buf()).into());
    }
    fs::read_to_string(path).map_err(|source| {
        LocalReadError::Read {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Resolves locations to document text.
pub struct ResourceResolver {
    transport: Box<dyn Transport>,
    git: Box<dyn GitRemote>,
    deadline: Deadline,
}

impl ResourceResolver {
    pub fn new(transport: Box<dyn Transport>, git: Box<dyn GitRemote>, deadline: Deadline) -> Self {
        Self {
            transport,
            git,
            deadline,
        }
    }

    /// Resolver using ureq for HTTPS and the `git` binary for ref listings.
    pub fn system(deadline: Deadline) -> Self {
        Self::new(
            Box::new(UreqTransport::new()),
            Box::new(GitCli::new(deadline.clone())),
            deadline,
        )
    }

    pub fn resolve(&self, location: &str) -> Result<String> {
        self.deadline.check()?;
        let path_type = path::classify(location);
        debug!(%location, %path_type, "Classified location");

        match path_type {
            PathType::Local => read_local_toml(Path::new(location)),
            PathType::Network => self.resolve_network(location),
            PathType::NonExistentLocal => Err(Error::Classification(format!(
                "{} does not exist",
                location
            ))),
            PathType::Unknown => Err(Error::Classification(
                "location must not be empty".to_string(),
            )),
        }
    }

    fn resolve_network(&self, location: &str) -> Result<String> {
        if let Some(raw_url) = path::github_blob_to_raw(location) {
            debug!(%raw_url, "Rewrote GitHub blob URL");
            return http::fetch_toml(self.transport.as_ref(), &raw_url, &self.deadline);
        }
        if path::is_git_repo_path(location) {
            return self.fetch_from_git(location);
        }
        match path::scheme(location).as_deref() {
            Some("https") => http::fetch_toml(self.transport.as_ref(), location, &self.deadline),
            Some("git") => self.fetch_from_git(location),
            Some(other) => Err(FetchError::InsecureProtocol(other.to_string()).into()),
            None => Err(FetchError::Unresolvable(location.to_string()).into()),
        }
    }

    fn fetch_from_git(&self, location: &str) -> Result<String> {
        let reference = GitPathResolver::new(self.git.as_ref(), self.transport.as_ref(), &self.deadline)
            .resolve(location)?;
        info!(locator = %reference.locator(), "Resolved repository config file");
        http::fetch_toml(self.transport.as_ref(), &reference.raw_url(), &self.deadline)
    }
}
