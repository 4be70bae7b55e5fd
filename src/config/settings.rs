//! Run settings with precedence resolution.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (`--timeout`, `--log-level`, `--log-format`, `--yes`)
//! 2. Environment variables (`FJRD_TIMEOUT`, `FJRD_LOG_LEVEL`, `FJRD_LOG_FORMAT`)
//! 3. Settings file (`$FJRD_SETTINGS`, else `~/.config/fjrd/settings.toml`)
//! 4. Built-in defaults
//!
//! The settings file is optional. It configures the tool itself, not the
//! machine; the machine's desired state lives in the configuration document.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::logging::{LogFormat, LogLevel};
use crate::{Error, Result};

/// Environment variable naming the settings file.
pub const SETTINGS_ENV: &str = "FJRD_SETTINGS";
pub const TIMEOUT_ENV: &str = "FJRD_TIMEOUT";
pub const LOG_LEVEL_ENV: &str = "FJRD_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "FJRD_LOG_FORMAT";

/// Overall deadline for a run when nothing else is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from the settings file
    File(PathBuf),
    /// Built-in default value
    Default,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::File(path) => write!(f, "file:{}", path.display()),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Contents of `settings.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SettingsFile {
    pub timeout_secs: Option<u64>,
    pub log_level: Option<LogLevel>,
    pub log_format: Option<LogFormat>,
    pub assume_yes: Option<bool>,
}

impl SettingsFile {
    /// `$FJRD_SETTINGS`, else `<config dir>/fjrd/settings.toml`.
    pub fn default_path(env: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        env(SETTINGS_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("fjrd").join("settings.toml")))
    }

    /// Load the file at `path`. A missing file yields empty settings.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub timeout_secs: Option<u64>,
    pub log_level: Option<LogLevel>,
    pub log_format: Option<LogFormat>,
    pub assume_yes: bool,
}

impl SettingsOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_log_level(mut self, level: Option<LogLevel>) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_log_format(mut self, format: Option<LogFormat>) -> Self {
        self.log_format = format;
        self
    }

    pub fn with_assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }
}

/// Fully resolved run settings with source tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub timeout: Resolved<Duration>,
    pub log_level: Resolved<LogLevel>,
    pub log_format: Resolved<LogFormat>,
    pub assume_yes: Resolved<bool>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            timeout: Resolved::new(
                Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                ValueSource::Default,
            ),
            log_level: Resolved::new(LogLevel::default(), ValueSource::Default),
            log_format: Resolved::new(LogFormat::default(), ValueSource::Default),
            assume_yes: Resolved::new(false, ValueSource::Default),
        }
    }
}

/// Pick the first of CLI, environment, file and default.
fn pick<T, F>(
    cli: Option<T>,
    env: &impl Fn(&str) -> Option<String>,
    env_name: &str,
    parse: F,
    file: Option<T>,
    file_path: Option<&Path>,
    default: T,
) -> Result<Resolved<T>>
where
    F: Fn(&str) -> Result<T>,
{
    if let Some(value) = cli {
        return Ok(Resolved::new(value, ValueSource::CliFlag));
    }
    if let Some(raw) = env(env_name).filter(|v| !v.trim().is_empty()) {
        let value = parse(&raw).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}={}: {}", env_name, raw, msg)),
            other => other,
        })?;
        return Ok(Resolved::new(value, ValueSource::EnvVar(env_name.to_string())));
    }
    if let Some(value) = file {
        let source = file_path
            .map(|p| ValueSource::File(p.to_path_buf()))
            .unwrap_or(ValueSource::Default);
        return Ok(Resolved::new(value, source));
    }
    Ok(Resolved::new(default, ValueSource::Default))
}

fn parse_timeout(raw: &str) -> Result<u64> {
    u64::from_str(raw.trim()).map_err(|e| Error::Config(e.to_string()))
}

/// Resolve run settings.
///
/// `env` looks up environment variables; pass `|k| std::env::var(k).ok()`
/// in production.
pub fn resolve_settings(
    overrides: &SettingsOverrides,
    file: &SettingsFile,
    file_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<RunSettings> {
    let timeout_secs = pick(
        overrides.timeout_secs,
        &env,
        TIMEOUT_ENV,
        parse_timeout,
        file.timeout_secs,
        file_path,
        DEFAULT_TIMEOUT_SECS,
    )?;
    if timeout_secs.value == 0 {
        return Err(Error::Config(format!(
            "timeout must be at least 1 second (from {})",
            timeout_secs.source
        )));
    }

    let log_level = pick(
        overrides.log_level,
        &env,
        LOG_LEVEL_ENV,
        LogLevel::from_str,
        file.log_level,
        file_path,
        LogLevel::default(),
    )?;
    let log_format = pick(
        overrides.log_format,
        &env,
        LOG_FORMAT_ENV,
        LogFormat::from_str,
        file.log_format,
        file_path,
        LogFormat::default(),
    )?;

    let assume_yes = if overrides.assume_yes {
        Resolved::new(true, ValueSource::CliFlag)
    } else {
        match (file.assume_yes, file_path) {
            (Some(yes), Some(path)) => Resolved::new(yes, ValueSource::File(path.to_path_buf())),
            _ => Resolved::new(false, ValueSource::Default),
        }
    };

    Ok(RunSettings {
        timeout: Resolved::new(Duration::from_secs(timeout_secs.value), timeout_secs.source),
        log_level,
        log_format,
        assume_yes,
    })
}
