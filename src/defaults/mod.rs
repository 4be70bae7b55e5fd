//! The macOS preference store and the typed commands that change it.
//!
//! - [`value`]: typed values and their `defaults` rendering
//! - [`command`]: commands, batches and the store operations they plan
//! - [`store`]: the [`PreferenceStore`] seam, backed by `defaults`, `pgrep`
//!   and `killall`
//! - [`raw`]: free-form `defaultsRaw` entries from the document

pub mod command;
pub mod raw;
pub mod store;
pub mod value;

use std::fmt;

pub use command::{Batch, Command, StoreOp};
pub use raw::{RAW_DOMAIN, RawDefaults, RawDefaultsEntry};
pub use store::{DefaultsCli, DryRunStore, PreferenceStore, Restart, StoreCall};
pub use value::{TypedValue, ValueKind};

/// A value that cannot be written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation error for field {field} (value: {value}): {reason}")]
pub struct ValidationError {
    pub field: String,
    pub value: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, value: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Error about a value whose field is not known yet.
    pub fn value(value: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::new("value", value, reason)
    }

    /// Attribute this error to `field`.
    pub fn for_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}
