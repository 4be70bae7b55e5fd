//! The configuration document.
//!
//! ```toml
//! version = 1
//!
//! [macos.dock]
//! autohide = true
//! orientation = "left"
//!
//! [macos.missionControl]
//! group-windows-by-app = true
//!
//! [macos.defaultsRaw."com.apple.dock.tilesize"]
//! value = 36
//! type = "int"
//! ```
//!
//! Every section is optional. Unknown sections and options are rejected.

use serde::Deserialize;

use crate::defaults::RawDefaults;
use crate::domains::{
    DesktopOptions, DockOptions, FinderOptions, KeyboardOptions, MenubarOptions,
    MissionControlOptions, MouseOptions, SafariOptions, ScreenshotOptions, TrackpadOptions,
    desktop, dock, finder, keyboard, menubar, mission_control, mouse, safari, screenshots,
    trackpad,
};
use crate::registry::DomainOptions;
use crate::{Error, Result};

/// The only document version this build understands.
pub const SUPPORTED_VERSION: i64 = 1;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    pub version: i64,
    #[serde(default)]
    pub macos: MacosSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct MacosSection {
    #[serde(default)]
    pub dock: DockOptions,
    #[serde(default)]
    pub finder: FinderOptions,
    #[serde(default)]
    pub desktop: DesktopOptions,
    #[serde(default)]
    pub safari: SafariOptions,
    #[serde(default)]
    pub screenshots: ScreenshotOptions,
    #[serde(default)]
    pub menubar: MenubarOptions,
    #[serde(default)]
    pub mouse: MouseOptions,
    #[serde(default)]
    pub trackpad: TrackpadOptions,
    #[serde(default)]
    pub keyboard: KeyboardOptions,
    #[serde(default)]
    pub mission_control: MissionControlOptions,
    #[serde(default)]
    pub defaults_raw: RawDefaults,
}

impl MacosSection {
    /// Typed domains paired with their registry names, in execution order.
    pub fn typed_domains(&self) -> [(&'static str, &dyn DomainOptions); 10] {
        [
            (dock::NAME, &self.dock),
            (finder::NAME, &self.finder),
            (desktop::NAME, &self.desktop),
            (safari::NAME, &self.safari),
            (screenshots::NAME, &self.screenshots),
            (menubar::NAME, &self.menubar),
            (mouse::NAME, &self.mouse),
            (trackpad::NAME, &self.trackpad),
            (keyboard::NAME, &self.keyboard),
            (mission_control::NAME, &self.mission_control),
        ]
    }
}

impl Document {
    /// Parse and validate document text.
    pub fn parse(text: &str) -> Result<Self> {
        let document: Document = toml::from_str(text)?;
        document.validate()?;
        Ok(document)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != SUPPORTED_VERSION {
            return Err(Error::Parse(format!(
                "{} is an invalid version, supported versions: {}",
                self.version, SUPPORTED_VERSION
            )));
        }
        Ok(())
    }
}
