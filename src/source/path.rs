//! Location classification.
//!
//! A location string is one of:
//! - a local filesystem path
//! - a URL with a scheme (`https://...`, `git://...`)
//! - a GitHub shorthand (`owner/repo`, `github.com/owner/repo`,
//!   `owner/repo/branch/path/file.toml`)
//!
//! Classification looks only at the string, except for a single existence
//! check when the location is not network-shaped.

use std::fmt;
use std::fs;

use url::Url;

/// Base URL for raw file content hosted on GitHub.
pub const RAW_CONTENT_BASE: &str = "https://raw.githubusercontent.com";

const LOCAL_PREFIXES: [&str; 3] = ["./", "/", "../"];
const GITHUB_PREFIXES: [&str; 3] = ["github.com/", "www.github.com/", "https://github.com/"];

/// What kind of location a string names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathType {
    Local,
    Network,
    NonExistentLocal,
    Unknown,
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathType::Local => write!(f, "local"),
            PathType::Network => write!(f, "network"),
            PathType::NonExistentLocal => write!(f, "non-existent"),
            PathType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classify a location. Network shapes win over local existence.
pub fn classify(location: &str) -> PathType {
    if location.is_empty() {
        return PathType::Unknown;
    }
    if is_network_path(location) {
        return PathType::Network;
    }
    if fs::metadata(location).is_ok() {
        PathType::Local
    } else {
        PathType::NonExistentLocal
    }
}

/// URL scheme of `location`, if it parses as an absolute URL.
pub fn scheme(location: &str) -> Option<String> {
    Url::parse(location)
        .ok()
        .map(|url| url.scheme().to_string())
        .filter(|scheme| !scheme.is_empty())
}

pub fn is_network_path(location: &str) -> bool {
    scheme(location).is_some() || is_git_repo_path(location)
}

/// True when `location` has the shape of a GitHub repository reference.
///
/// Accepted shapes:
/// - anything starting with `github.com/`, `www.github.com/` or `https://github.com/`
/// - `owner/repo` where `repo` has no `.` (so `dir/file.toml` stays local)
/// - `owner/repo/<branch>/<path...>` with non-empty owner and repo
pub fn is_git_repo_path(location: &str) -> bool {
    if LOCAL_PREFIXES.iter().any(|p| location.starts_with(p)) {
        return false;
    }
    if GITHUB_PREFIXES.iter().any(|p| location.starts_with(p)) {
        return true;
    }

    let parts: Vec<&str> = location.split('/').collect();
    match parts.as_slice() {
        [owner, repo] => !owner.is_empty() && !repo.is_empty() && !repo.contains('.'),
        [owner, repo, _, _, ..] => !owner.is_empty() && !repo.is_empty(),
        _ => false,
    }
}

/// Rewrite a GitHub blob URL into its raw-content URL.
///
/// `https://github.com/o/r/blob/b/path/x.toml` becomes
/// `https://raw.githubusercontent.com/o/r/b/path/x.toml`. Returns `None`
/// for anything that is not an HTTPS github.com blob URL of a `.toml` file.
pub fn github_blob_to_raw(location: &str) -> Option<String> {
    if !location.ends_with(".toml") {
        return None;
    }
    let url = Url::parse(location).ok()?;
    if url.scheme() != "https" || url.host_str() != Some("github.com") {
        return None;
    }
    let path = url.path();
    let parts: Vec<&str> = path.strip_prefix('/').unwrap_or(path).split('/').collect();
    if parts.len() < 5 || parts[2] != "blob" {
        return None;
    }
    Some(format!(
        "{}/{}/{}/{}/{}",
        RAW_CONTENT_BASE,
        parts[0],
        parts[1],
        parts[3],
        parts[4..].join("/")
    ))
}
