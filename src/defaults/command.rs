//! Commands against the preference store and ordered batches of them.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::store::PreferenceStore;
use super::value::{TypedValue, ValueKind};
use super::ValidationError;
use crate::sys::Deadline;
use crate::{Error, Result};

/// Set (or reset) one key in one preference domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub domain: String,
    pub key: String,
    pub value: TypedValue,
}

/// What a command does to the store, fully rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum StoreOp {
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
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreOp::Write {
                domain,
                key,
                kind,
                value,
            } => write!(
                f,
                "defaults write {} {} {} {}",
                shell_quote(domain),
                shell_quote(key),
                kind.flag(),
                shell_quote(value)
            ),
            StoreOp::Delete { domain, key } => {
                write!(f, "defaults delete {} {}", shell_quote(domain), shell_quote(key))
            }
        }
    }
}

/// Quote `arg` for display when a shell would split or expand it.
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@%+,~".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

impl Command {
    pub fn new(domain: impl Into<String>, key: impl Into<String>, value: TypedValue) -> Self {
        Self {
            domain: domain.into(),
            key: key.into(),
            value,
        }
    }

    /// `domain.key`, used to name the command in errors.
    pub fn qualified_key(&self) -> String {
        format!("{}.{}", self.domain, self.key)
    }

    /// Render the store operation, validating the value first.
    ///
    /// A reset always plans a delete, whatever its kind.
    pub fn operation(&self) -> std::result::Result<StoreOp, ValidationError> {
        let Some(value) = self.value.render() else {
            return Ok(StoreOp::Delete {
                domain: self.domain.clone(),
                key: self.key.clone(),
            });
        };
        self.value
            .validate()
            .map_err(|e| e.for_field(self.qualified_key()))?;
        Ok(StoreOp::Write {
            domain: self.domain.clone(),
            key: self.key.clone(),
            kind: self.value.kind(),
            value,
        })
    }

    /// Apply this command to `store`.
    ///
    /// Failed deletes are logged and ignored: the key being absent already
    /// means the system default applies.
    pub fn execute(&self, store: &dyn PreferenceStore) -> Result<()> {
        match self.operation()? {
            StoreOp::Write {
                domain,
                key,
                kind,
                value,
            } => {
                debug!(%domain, %key, %kind, %value, "Writing preference");
                store.write(&domain, &key, kind, &value)
            }
            StoreOp::Delete { domain, key } => {
                debug!(%domain, %key, "Deleting preference");
                match store.delete(&domain, &key) {
                    Ok(()) => Ok(()),
                    Err(err) if err.is_interruption() => Err(err),
                    Err(err) => {
                        debug!(%domain, %key, error = %err, "Reset failed, key probably not set");
                        Ok(())
                    }
                }
            }
        }
    }
}

/// Commands for one settings domain, executed in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    domain: String,
    commands: Vec<Command>,
}

impl Batch {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            commands: Vec::new(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Planned operations in execution order.
    pub fn operations(&self) -> std::result::Result<Vec<StoreOp>, ValidationError> {
        self.commands.iter().map(Command::operation).collect()
    }

    /// Execute every command in order, stopping at the first failure.
    ///
    /// Commands applied before a failure stay applied. The error reports
    /// the 1-based position of the failing command.
    pub fn execute(&self, store: &dyn PreferenceStore, deadline: &Deadline) -> Result<usize> {
        let total = self.commands.len();
        for (index, command) in self.commands.iter().enumerate() {
            deadline.check()?;
            command.execute(store).map_err(|source| {
                if source.is_interruption() {
                    return source;
                }
                Error::Batch {
                    domain: self.domain.clone(),
                    position: index + 1,
                    total,
                    source: Box::new(source),
                }
            })?;
        }
        Ok(total)
    }
}
