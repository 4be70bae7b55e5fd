//! Common test utilities for fjrd integration tests.
//!
//! Provides `TestEnv` for isolated test environments that never read the
//! user's `~/.config/fjrd/settings.toml`.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A test environment with an isolated working directory.
///
/// `fjrd()` runs the binary inside `work_dir` with `FJRD_SETTINGS` pointing
/// at a settings file that does not exist unless a test writes it, and with
/// the run-setting environment variables cleared.
pub struct TestEnv {
    pub work_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            work_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the fjrd binary, isolated from the user's settings.
    pub fn fjrd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_fjrd"));
        cmd.current_dir(self.work_dir.path());
        cmd.env("FJRD_SETTINGS", self.settings_path());
        cmd.env_remove("FJRD_TIMEOUT");
        cmd.env_remove("FJRD_LOG_LEVEL");
        cmd.env_remove("FJRD_LOG_FORMAT");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn path(&self) -> &Path {
        self.work_dir.path()
    }

    pub fn settings_path(&self) -> PathBuf {
        self.work_dir.path().join("settings.toml")
    }

    /// Write the fjrd settings file.
    pub fn write_settings(&self, content: &str) {
        fs::write(self.settings_path(), content).unwrap();
    }

    /// Write a document under the work dir and return its absolute path.
    pub fn write_document(&self, name: &str, content: &str) -> String {
        let path = self.work_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// A document exercising a typed domain and a raw entry.
pub const DOCK_AND_RAW: &str = r#"version = 1

[macos.dock]
autohide = true
orientation = "Left"

[macos.defaultsRaw."com.apple.finder.ShowPathbar"]
value = true
type = "bool"
"#;
