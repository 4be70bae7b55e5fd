//! The preference store seam.
//!
//! [`DefaultsCli`] talks to the real store through `defaults`, and to running
//! applications through `pgrep` and `killall`. [`DryRunStore`] records what
//! would happen instead.

use std::cell::RefCell;
use std::process::Command;

use serde::Serialize;
use tracing::info;

use super::value::ValueKind;
use crate::sys::{self, Deadline, ExecutionError};
use crate::Result;

/// Operations fjrd needs from the platform.
pub trait PreferenceStore {
    /// `defaults write <domain> <key> <flag> <value>`
    fn write(&self, domain: &str, key: &str, kind: ValueKind, value: &str) -> Result<()>;

    /// `defaults delete <domain> <key>`
    fn delete(&self, domain: &str, key: &str) -> Result<()>;

    /// Whether a process with exactly this name is running.
    fn is_running(&self, process: &str) -> Result<bool>;

    /// Terminate `process` so launchd restarts it with the new preferences.
    fn signal(&self, process: &str) -> Result<()>;
}

/// Store backed by the macOS command-line tools.
#[derive(Debug, Clone, Default)]
pub struct DefaultsCli {
    deadline: Deadline,
}

impl DefaultsCli {
    pub fn new(deadline: Deadline) -> Self {
        Self { deadline }
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        let mut command = Command::new(program);
        command.args(args);
        let output = sys::run_program(&mut command, &self.deadline)?;
        if output.success() {
            Ok(())
        } else {
            Err(ExecutionError::from_output(&command, &output).into())
        }
    }
}

impl PreferenceStore for DefaultsCli {
    fn write(&self, domain: &str, key: &str, kind: ValueKind, value: &str) -> Result<()> {
        self.run("defaults", &["write", domain, key, kind.flag(), value])
    }

    fn delete(&self, domain: &str, key: &str) -> Result<()> {
        self.run("defaults", &["delete", domain, key])
    }

    fn is_running(&self, process: &str) -> Result<bool> {
        let mut command = Command::new("pgrep");
        command.args(["-x", process]);
        let output = sys::run_program(&mut command, &self.deadline)?;
        Ok(output.success())
    }

    fn signal(&self, process: &str) -> Result<()> {
        self.run("killall", &[process])
    }
}

/// A store call, as recorded by [`DryRunStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "lowercase")]
pub enum StoreCall {
    Write {
        domain: String,
        key: String,
        #[serde(rename = "type")]
        kind: ValueKind,
        value: String,
    },
    Delete {
        domain: String,
        key: String,
    },
    Signal {
        process: String,
    },
}

/// Store that logs and records calls without touching the system.
///
/// Every process is reported as running, so conditional restarts show up.
#[derive(Debug, Default)]
pub struct DryRunStore {
    calls: RefCell<Vec<StoreCall>>,
}

impl DryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }
}

impl PreferenceStore for DryRunStore {
    fn write(&self, domain: &str, key: &str, kind: ValueKind, value: &str) -> Result<()> {
        info!(%domain, %key, %kind, %value, "Dry run: would write preference");
        self.calls.borrow_mut().push(StoreCall::Write {
            domain: domain.to_string(),
            key: key.to_string(),
            kind,
            value: value.to_string(),
        });
        Ok(())
    }

    fn delete(&self, domain: &str, key: &str) -> Result<()> {
        info!(%domain, %key, "Dry run: would delete preference");
        self.calls.borrow_mut().push(StoreCall::Delete {
            domain: domain.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }

    fn is_running(&self, _process: &str) -> Result<bool> {
        Ok(true)
    }

    fn signal(&self, process: &str) -> Result<()> {
        info!(%process, "Dry run: would restart process");
        self.calls.borrow_mut().push(StoreCall::Signal {
            process: process.to_string(),
        });
        Ok(())
    }
}

/// A process to restart after a domain's batch succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Restart {
    pub process: &'static str,
    /// Skip the restart when the process is not running.
    pub only_if_running: bool,
}

impl Restart {
    pub const fn always(process: &'static str) -> Self {
        Self {
            process,
            only_if_running: false,
        }
    }

    pub const fn if_running(process: &'static str) -> Self {
        Self {
            process,
            only_if_running: true,
        }
    }

    /// Restart the process. Returns whether a signal was sent.
    pub fn execute(&self, store: &dyn PreferenceStore) -> Result<bool> {
        if self.only_if_running && !store.is_running(self.process)? {
            info!(process = self.process, "Not running, skipping restart");
            return Ok(false);
        }
        info!(process = self.process, "Restarting");
        store.signal(self.process)?;
        Ok(true)
    }
}
