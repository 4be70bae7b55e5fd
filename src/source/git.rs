//! Resolution of GitHub repository references to a concrete config file.
//!
//! ## Accepted forms
//!
//! After stripping `git://`, `https://`, `github.com/` and `www.github.com/`
//! (each at most once, in that order):
//!
//! - `owner/repo`: the branch is discovered, then a fixed list of candidate
//!   files is probed on raw.githubusercontent.com
//! - `owner/repo/blob/<branch>/<path>.toml`: used as-is
//! - `owner/repo/<branch>/<path...>`: used verbatim
//!
//! ## Branch discovery
//!
//! 1. `git ls-remote` for `main`, `master`, `develop`, `dev` (first hit wins)
//! 2. the `default_branch` reported by the GitHub API
//! 3. `main`, after confirming the repository answers `git ls-remote` at all

use std::process::Command;

use serde::Deserialize;
use tracing::{debug, info};

use super::http::{self, Method, Transport};
use super::path::RAW_CONTENT_BASE;
use crate::sys::{self, Deadline, ExecutionError};
use crate::{Error, GitResolutionError, Result};

/// Branches tried, in order, when discovering a repository's branch.
pub const CANDIDATE_BRANCHES: [&str; 4] = ["main", "master", "develop", "dev"];

/// Directories probed for a config file, in order.
pub const CANDIDATE_DIRS: [&str; 4] = ["", "fjrd/", ".fjrd/", "config/"];

/// File names probed in each candidate directory, in order.
pub const CANDIDATE_FILES: [&str; 3] = ["fjrd.config.toml", "fjrd.toml", "config.toml"];

/// Branch used when neither git nor the API name one.
pub const FALLBACK_BRANCH: &str = "main";

const STRIP_PREFIXES: [&str; 4] = ["git://", "https://", "github.com/", "www.github.com/"];
const GITHUB_BASE: &str = "https://github.com";
const GITHUB_API_BASE: &str = "https://api.github.com";

/// Access to remote ref listings.
pub trait GitRemote {
    /// Output of `git ls-remote --exit-code <repo_url> [pattern]`.
    ///
    /// Fails when the repository is unreachable or nothing matches `pattern`.
    fn ls_remote(&self, repo_url: &str, pattern: Option<&str>) -> Result<String>;
}

/// [`GitRemote`] backed by the `git` binary.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    deadline: Deadline,
}

impl GitCli {
    pub fn new(deadline: Deadline) -> Self {
        Self { deadline }
    }
}

impl GitRemote for GitCli {
    fn ls_remote(&self, repo_url: &str, pattern: Option<&str>) -> Result<String> {
        let mut command = Command::new("git");
        command
            .args(["ls-remote", "--exit-code", repo_url])
            .env("GIT_TERMINAL_PROMPT", "0");
        if let Some(pattern) = pattern {
            command.arg(pattern);
        }

        let output = sys::run_program(&mut command, &self.deadline)?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(ExecutionError::from_output(&command, &output).into())
        }
    }
}

/// A repository file on a specific branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitReference {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub file_path: String,
}

impl GitReference {
    /// Canonical `owner/repo/branch/path` locator.
    pub fn locator(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.owner, self.repo, self.branch, self.file_path
        )
    }

    pub fn raw_url(&self) -> String {
        format!("{}/{}", RAW_CONTENT_BASE, self.locator())
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryInfo {
    default_branch: String,
}

/// Strip the known URL and host prefixes from a repository reference.
pub fn strip_known_prefixes(path: &str) -> &str {
    STRIP_PREFIXES
        .iter()
        .fold(path, |rest, prefix| rest.strip_prefix(prefix).unwrap_or(rest))
}

/// Turns repository references into [`GitReference`]s.
pub struct GitPathResolver<'a> {
    git: &'a dyn GitRemote,
    transport: &'a dyn Transport,
    deadline: &'a Deadline,
}

impl<'a> GitPathResolver<'a> {
    pub fn new(git: &'a dyn GitRemote, transport: &'a dyn Transport, deadline: &'a Deadline) -> Self {
        Self {
            git,
            transport,
            deadline,
        }
    }

    pub fn resolve(&self, path: &str) -> Result<GitReference> {
        let stripped = strip_known_prefixes(path).trim_end_matches('/');
        let parts: Vec<&str> = stripped.split('/').collect();
        if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(GitResolutionError::Malformed(path.to_string()).into());
        }
        let (owner, repo) = (parts[0], parts[1]);

        match parts.len() {
            2 => self.discover(owner, repo),
            n if n >= 5 && parts[2] == "blob" => {
                let file_path = parts[4..].join("/");
                if !file_path.ends_with(".toml") {
                    return Err(GitResolutionError::NotToml(path.to_string()).into());
                }
                Ok(GitReference {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    branch: parts[3].to_string(),
                    file_path,
                })
            }
            n if n >= 4 => Ok(GitReference {
                owner: owner.to_string(),
                repo: repo.to_string(),
                branch: parts[2].to_string(),
                file_path: parts[3..].join("/"),
            }),
            _ => Err(GitResolutionError::Malformed(path.to_string()).into()),
        }
    }

    fn discover(&self, owner: &str, repo: &str) -> Result<GitReference> {
        let branch = match self.discover_branch(owner, repo)? {
            Some(branch) => branch,
            None => {
                self.verify_reachable(owner, repo)?;
                debug!(%owner, %repo, "No branch discovered, using fallback");
                FALLBACK_BRANCH.to_string()
            }
        };
        info!(%owner, %repo, %branch, "Probing repository for a config file");

        for dir in CANDIDATE_DIRS {
            for file in CANDIDATE_FILES {
                let reference = GitReference {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    branch: branch.clone(),
                    file_path: format!("{}{}", dir, file),
                };
                if http::probe(self.transport, &reference.raw_url(), self.deadline)? {
                    debug!(locator = %reference.locator(), "Found config file");
                    return Ok(reference);
                }
            }
        }

        Err(GitResolutionError::NoConfigFile {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch,
        }
        .into())
    }

    fn discover_branch(&self, owner: &str, repo: &str) -> Result<Option<String>> {
        let repo_url = format!("{}/{}/{}", GITHUB_BASE, owner, repo);
        for branch in CANDIDATE_BRANCHES {
            self.deadline.check()?;
            match self
                .git
                .ls_remote(&repo_url, Some(&format!("refs/heads/{}", branch)))
            {
                Ok(listing) if !listing.trim().is_empty() => return Ok(Some(branch.to_string())),
                Ok(_) => {}
                Err(err) if err.is_interruption() => return Err(err),
                Err(err) => debug!(%branch, error = %err, "Branch not found"),
            }
        }
        self.api_default_branch(owner, repo)
    }

    fn api_default_branch(&self, owner: &str, repo: &str) -> Result<Option<String>> {
        self.deadline.check()?;
        let url = format!("{}/repos/{}/{}", GITHUB_API_BASE, owner, repo);
        let response = match self
            .transport
            .send(Method::Get, &url, self.deadline.cap(http::FETCH_TIMEOUT))
        {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                debug!(%url, status = response.status, "Repository API lookup failed");
                return Ok(None);
            }
            Err(err) => {
                debug!(%url, error = %err, "Repository API lookup failed");
                return Ok(None);
            }
        };
        Ok(serde_json::from_str::<RepositoryInfo>(&response.body)
            .ok()
            .map(|info| info.default_branch)
            .filter(|branch| !branch.is_empty()))
    }

    fn verify_reachable(&self, owner: &str, repo: &str) -> Result<()> {
        let repo_url = format!("{}/{}/{}", GITHUB_BASE, owner, repo);
        match self.git.ls_remote(&repo_url, None) {
            Ok(_) => Ok(()),
            Err(err) if err.is_interruption() => Err(err),
            Err(Error::Execution(err)) => {
                debug!(error = %err, "Repository is not reachable");
                Err(GitResolutionError::Unreachable(format!("{}/{}", owner, repo)).into())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeGit, FakeTransport};

    const REPO_URL: &str = "https://github.com/acme/dots";
    const RAW: &str = "https://raw.githubusercontent.com/acme/dots";

    fn resolve(git: &FakeGit, transport: &FakeTransport, path: &str) -> Result<GitReference> {
        let deadline = Deadline::none();
        GitPathResolver::new(git, transport, &deadline).resolve(path)
    }

    // ==================== Prefix Tests ====================

    #[test]
    fn test_strip_known_prefixes() {
        assert_eq!(strip_known_prefixes("acme/dots"), "acme/dots");
        assert_eq!(strip_known_prefixes("github.com/acme/dots"), "acme/dots");
        assert_eq!(strip_known_prefixes("https://github.com/acme/dots"), "acme/dots");
        assert_eq!(strip_known_prefixes("https://www.github.com/acme/dots"), "acme/dots");
        assert_eq!(strip_known_prefixes("git://github.com/acme/dots"), "acme/dots");
    }

    // ==================== Discovery Tests ====================

    #[test]
    fn test_bare_repo_probes_in_order() {
        let git = FakeGit::new().repo(REPO_URL, &["main"]);
        let transport = FakeTransport::new().respond(
            &format!("{}/main/fjrd/fjrd.toml", RAW),
            200,
            "version = 1\n",
        );

        let reference = resolve(&git, &transport, "acme/dots").unwrap();
        assert_eq!(reference.locator(), "acme/dots/main/fjrd/fjrd.toml");

        // Root candidates (3) then fjrd/fjrd.config.toml, then the hit.
        let probes: Vec<String> = transport.requests().into_iter().map(|(_, url)| url).collect();
        assert_eq!(
            probes,
            vec![
                format!("{}/main/fjrd.config.toml", RAW),
                format!("{}/main/fjrd.toml", RAW),
                format!("{}/main/config.toml", RAW),
                format!("{}/main/fjrd/fjrd.config.toml", RAW),
                format!("{}/main/fjrd/fjrd.toml", RAW),
            ]
        );
    }

    #[test]
    fn test_branch_discovery_prefers_candidate_order() {
        let git = FakeGit::new().repo(REPO_URL, &["dev", "master"]);
        let transport =
            FakeTransport::new().respond(&format!("{}/master/fjrd.toml", RAW), 200, "");
        let reference = resolve(&git, &transport, "github.com/acme/dots").unwrap();
        assert_eq!(reference.branch, "master");
    }

    #[test]
    fn test_branch_falls_back_to_api_default_branch() {
        let git = FakeGit::new().repo(REPO_URL, &["trunk"]);
        let transport = FakeTransport::new()
            .respond(
                "https://api.github.com/repos/acme/dots",
                200,
                r#"{"name":"dots","default_branch":"trunk"}"#,
            )
            .respond(&format!("{}/trunk/config/config.toml", RAW), 200, "");
        let reference = resolve(&git, &transport, "acme/dots").unwrap();
        assert_eq!(reference.locator(), "acme/dots/trunk/config/config.toml");
    }

    #[test]
    fn test_branch_falls_back_to_main_when_reachable() {
        // Reachable repository whose only branch is none of the candidates,
        // with the API unavailable.
        let git = FakeGit::new().repo(REPO_URL, &["trunk"]);
        let transport = FakeTransport::new().respond(&format!("{}/main/fjrd.toml", RAW), 200, "");
        let reference = resolve(&git, &transport, "acme/dots").unwrap();
        assert_eq!(reference.branch, "main");
        assert!(git.calls().contains(&REPO_URL.to_string()));
    }

    #[test]
    fn test_unreachable_repository() {
        let git = FakeGit::new();
        let transport = FakeTransport::new();
        let err = resolve(&git, &transport, "acme/missing").unwrap_err();
        assert!(matches!(
            err,
            Error::GitResolution(GitResolutionError::Unreachable(ref r)) if r == "acme/missing"
        ));
    }

    #[test]
    fn test_no_config_file_after_all_probes() {
        let git = FakeGit::new().repo(REPO_URL, &["main"]);
        let transport = FakeTransport::new();
        let err = resolve(&git, &transport, "acme/dots").unwrap_err();
        assert!(matches!(
            err,
            Error::GitResolution(GitResolutionError::NoConfigFile { ref branch, .. }) if branch == "main"
        ));
        let heads = transport
            .requests()
            .iter()
            .filter(|(method, _)| *method == Method::Head)
            .count();
        assert_eq!(heads, CANDIDATE_DIRS.len() * CANDIDATE_FILES.len());
    }

    // ==================== Explicit Path Tests ====================

    #[test]
    fn test_blob_form() {
        let git = FakeGit::new();
        let transport = FakeTransport::new();
        let reference =
            resolve(&git, &transport, "github.com/acme/dots/blob/main/mac/fjrd.toml").unwrap();
        assert_eq!(reference.locator(), "acme/dots/main/mac/fjrd.toml");
        assert!(git.calls().is_empty());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_blob_form_requires_toml() {
        let git = FakeGit::new();
        let transport = FakeTransport::new();
        let err = resolve(&git, &transport, "acme/dots/blob/main/README.md").unwrap_err();
        assert!(matches!(
            err,
            Error::GitResolution(GitResolutionError::NotToml(_))
        ));
    }

    #[test]
    fn test_explicit_path_is_verbatim() {
        let git = FakeGit::new();
        let transport = FakeTransport::new();
        let reference = resolve(&git, &transport, "acme/dots/feature/x/y/fjrd.toml").unwrap();
        assert_eq!(reference.locator(), "acme/dots/feature/x/y/fjrd.toml");
        assert_eq!(
            reference.raw_url(),
            "https://raw.githubusercontent.com/acme/dots/feature/x/y/fjrd.toml"
        );
    }

    #[test]
    fn test_malformed_shapes() {
        let git = FakeGit::new();
        let transport = FakeTransport::new();
        for path in ["acme", "acme/dots/main", "/dots", "github.com/"] {
            let err = resolve(&git, &transport, path).unwrap_err();
            assert!(
                matches!(err, Error::GitResolution(GitResolutionError::Malformed(_))),
                "{}: {:?}",
                path,
                err
            );
        }
    }
}
