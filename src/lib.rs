//! fjrd - converge macOS preference settings to a declared TOML document.
//!
//! This library provides the core functionality for the `fjrd` CLI tool:
//! resolving a configuration location (local path, HTTPS URL or GitHub
//! shorthand) into document text, and turning the declared options into typed
//! `defaults write` / `defaults delete` operations executed domain by domain.

pub mod apply;
pub mod approval;
pub mod cli;
pub mod commands;
pub mod config;
pub mod defaults;
pub mod domains;
pub mod logging;
pub mod registry;
pub mod source;
pub mod sys;

pub use apply::{DomainFailure, DomainFailures};
pub use defaults::ValidationError;
pub use source::{FetchError, GitResolutionError, LocalReadError};
pub use sys::ExecutionError;

/// Test doubles for the transport, git and preference-store seams.
#[cfg(test)]
pub(crate) mod test_utils {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    use crate::defaults::{PreferenceStore, StoreCall, ValueKind};
    use crate::source::{FetchError, GitRemote, HttpResponse, Method, Transport};
    use crate::{Error, ExecutionError, Result};

    fn failure(program: &str, args: &[&str], detail: &str) -> Error {
        Error::Execution(ExecutionError {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            detail: detail.to_string(),
        })
    }

    /// Preference store that records every call and fails on demand.
    #[derive(Default)]
    pub struct ScriptedStore {
        calls: RefCell<Vec<StoreCall>>,
        failing_writes: HashSet<(String, String)>,
        failing_signals: HashSet<String>,
        running: HashSet<String>,
        fail_deletes: bool,
    }

    impl ScriptedStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_write(mut self, domain: &str, key: &str) -> Self {
            self.failing_writes
                .insert((domain.to_string(), key.to_string()));
            self
        }

        pub fn fail_signal(mut self, process: &str) -> Self {
            self.failing_signals.insert(process.to_string());
            self
        }

        pub fn fail_deletes(mut self) -> Self {
            self.fail_deletes = true;
            self
        }

        pub fn running(mut self, process: &str) -> Self {
            self.running.insert(process.to_string());
            self
        }

        pub fn calls(&self) -> Vec<StoreCall> {
            self.calls.borrow().clone()
        }
    }

    impl PreferenceStore for ScriptedStore {
        fn write(&self, domain: &str, key: &str, kind: ValueKind, value: &str) -> Result<()> {
            if self
                .failing_writes
                .contains(&(domain.to_string(), key.to_string()))
            {
                return Err(failure(
                    "defaults",
                    &["write", domain, key, kind.flag(), value],
                    "exit status: 1",
                ));
            }
            self.calls.borrow_mut().push(StoreCall::Write {
                domain: domain.to_string(),
                key: key.to_string(),
                kind,
                value: value.to_string(),
            });
            Ok(())
        }

        fn delete(&self, domain: &str, key: &str) -> Result<()> {
            self.calls.borrow_mut().push(StoreCall::Delete {
                domain: domain.to_string(),
                key: key.to_string(),
            });
            if self.fail_deletes {
                return Err(failure(
                    "defaults",
                    &["delete", domain, key],
                    "Domain (com.example) not found.",
                ));
            }
            Ok(())
        }

        fn is_running(&self, process: &str) -> Result<bool> {
            Ok(self.running.contains(process))
        }

        fn signal(&self, process: &str) -> Result<()> {
            if self.failing_signals.contains(process) {
                return Err(failure("killall", &[process], "No matching processes"));
            }
            self.calls.borrow_mut().push(StoreCall::Signal {
                process: process.to_string(),
            });
            Ok(())
        }
    }

    /// Transport serving canned responses by URL. Unknown URLs answer 404.
    #[derive(Default)]
    pub struct FakeTransport {
        responses: HashMap<String, HttpResponse>,
        requests: RefCell<Vec<(Method, String)>>,
        offline: bool,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn offline() -> Self {
            Self {
                offline: true,
                ..Self::default()
            }
        }

        pub fn respond(mut self, url: &str, status: u16, body: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                HttpResponse {
                    status,
                    location: None,
                    body: body.to_string(),
                },
            );
            self
        }

        pub fn redirect(mut self, from: &str, to: &str) -> Self {
            self.responses.insert(
                from.to_string(),
                HttpResponse {
                    status: 302,
                    location: Some(to.to_string()),
                    body: String::new(),
                },
            );
            self
        }

        pub fn requests(&self) -> Vec<(Method, String)> {
            self.requests.borrow().clone()
        }
    }

    impl Transport for FakeTransport {
        fn send(
            &self,
            method: Method,
            url: &str,
            _timeout: std::time::Duration,
        ) -> std::result::Result<HttpResponse, FetchError> {
            self.requests.borrow_mut().push((method, url.to_string()));
            if self.offline {
                return Err(FetchError::Transport("network is unreachable".to_string()));
            }
            let mut response = self.responses.get(url).cloned().unwrap_or(HttpResponse {
                status: 404,
                location: None,
                body: String::new(),
            });
            if method == Method::Head {
                response.body.clear();
            }
            Ok(response)
        }
    }

    /// Git remote that knows a fixed set of repositories and their branches.
    #[derive(Default)]
    pub struct FakeGit {
        repos: HashMap<String, Vec<String>>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeGit {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn repo(mut self, url: &str, branches: &[&str]) -> Self {
            self.repos.insert(
                url.to_string(),
                branches.iter().map(|b| b.to_string()).collect(),
            );
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl GitRemote for FakeGit {
        fn ls_remote(&self, repo_url: &str, pattern: Option<&str>) -> Result<String> {
            self.calls
                .borrow_mut()
                .push(format!("{} {}", repo_url, pattern.unwrap_or("")).trim_end().to_string());
            let Some(branches) = self.repos.get(repo_url) else {
                return Err(failure(
                    "git",
                    &["ls-remote", "--exit-code", repo_url],
                    "repository not found",
                ));
            };
            let listing: String = branches
                .iter()
                .map(|b| format!("refs/heads/{}", b))
                .filter(|r| pattern.is_none_or(|p| p == r))
                .map(|r| format!("0123456789abcdef\t{}\n", r))
                .collect();
            if listing.is_empty() {
                return Err(failure("git", &["ls-remote", "--exit-code", repo_url], "exit status: 2"));
            }
            Ok(listing)
        }
    }
}

/// Library-level error type for fjrd operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot classify location: {0}")]
    Classification(String),

    #[error("Failed to fetch configuration: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to resolve git repository: {0}")]
    GitResolution(#[from] GitResolutionError),

    #[error("Invalid document: {0}")]
    Parse(String),

    #[error("Invalid settings: {0}")]
    Config(String),

    #[error("Malformed TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("{domain} batch stopped at command {position} of {total}: {source}")]
    Batch {
        domain: String,
        position: usize,
        total: usize,
        source: Box<Error>,
    },

    #[error(transparent)]
    Domains(#[from] DomainFailures),

    #[error("Operation timed out")]
    DeadlineExceeded,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for errors raised by the overall deadline or a Ctrl-C.
    pub fn is_interruption(&self) -> bool {
        matches!(self, Error::DeadlineExceeded | Error::Cancelled)
    }
}

/// Result type alias for fjrd operations.
pub type Result<T> = std::result::Result<T, Error>;
