//! Configuration for fjrd.
//!
//! Two distinct inputs live here:
//!
//! ## The configuration document
//!
//! The TOML document named on the command line (local path, HTTPS URL or
//! GitHub shorthand). It declares the desired state of the machine:
//! typed domain sections under `[macos.*]` and raw entries under
//! `[macos.defaultsRaw]`. See [`schema`].
//!
//! ## Run settings
//!
//! How fjrd itself behaves: overall timeout, log level and format, and
//! whether raw entries are approved without asking. Resolved from CLI flags,
//! environment variables and an optional `settings.toml`. See [`settings`].

pub mod schema;
pub mod settings;

pub use schema::{Document, MacosSection, SUPPORTED_VERSION};
pub use settings::{
    DEFAULT_TIMEOUT_SECS, LOG_FORMAT_ENV, LOG_LEVEL_ENV, Resolved, RunSettings, SETTINGS_ENV,
    SettingsFile, SettingsOverrides, TIMEOUT_ENV, ValueSource, resolve_settings,
};
