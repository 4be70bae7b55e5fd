//! Mission Control and Spaces.
//!
//! Spread over the Dock, global and Spaces preferences; the Dock and
//! SystemUIServer are restarted, in that order.

use serde::Deserialize;

use crate::defaults::Restart;
use crate::registry::{DomainOptions, DomainSchema, FieldDescriptor, FieldSet, FieldValue};

pub const NAME: &str = "mission-control";

const DOCK: &str = "com.apple.dock";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct MissionControlOptions {
    pub auto_rearrange_spaces: Option<bool>,
    pub group_windows_by_app: Option<bool>,
    pub switch_to_apps_open_window: Option<bool>,
    /// Stored inverted, as `spans-displays`.
    pub displays_have_separate_spaces: Option<bool>,
}

pub fn schema() -> DomainSchema {
    DomainSchema::new(NAME)
        .field(FieldDescriptor::bool("auto-rearrange-spaces", DOCK, "mru-spaces"))
        .field(FieldDescriptor::bool(
            "group-windows-by-app",
            DOCK,
            "expose-group-apps",
        ))
        .field(FieldDescriptor::bool(
            "switch-to-apps-open-window",
            "NSGlobalDomain",
            "AppleSpacesSwitchOnActivate",
        ))
        .field(FieldDescriptor::bool(
            "displays-have-separate-spaces",
            "com.apple.spaces",
            "spans-displays",
        ))
        .restart(Restart::always("Dock"))
        .restart(Restart::always("SystemUIServer"))
}

impl DomainOptions for MissionControlOptions {
    fn populated(&self) -> Vec<(&'static str, FieldValue)> {
        FieldSet::new()
            .bool("auto-rearrange-spaces", self.auto_rearrange_spaces)
            .bool("group-windows-by-app", self.group_windows_by_app)
            .bool("switch-to-apps-open-window", self.switch_to_apps_open_window)
            .bool(
                "displays-have-separate-spaces",
                self.displays_have_separate_spaces.map(|separate| !separate),
            )
            .into_entries()
    }
}
