//! Desktop icons and sorting. Stored in Finder's preferences.

use serde::Deserialize;

use crate::defaults::Restart;
use crate::registry::{DomainOptions, DomainSchema, FieldDescriptor, FieldSet, FieldValue};

pub const NAME: &str = "desktop";

const FINDER: &str = "com.apple.finder";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct DesktopOptions {
    pub sort_folders_first: Option<bool>,
    pub show_icons: Option<bool>,
    pub show_hard_drives: Option<bool>,
    pub show_external_hard_drives: Option<bool>,
    pub show_removable_media: Option<bool>,
    pub show_mounted_servers: Option<bool>,
}

pub fn schema() -> DomainSchema {
    DomainSchema::new(NAME)
        .field(FieldDescriptor::bool(
            "sort-folders-first",
            FINDER,
            "_FXSortFoldersFirstOnDesktop",
        ))
        .field(FieldDescriptor::bool("show-icons", FINDER, "CreateDesktop"))
        .field(FieldDescriptor::bool(
            "show-hard-drives",
            FINDER,
            "ShowHardDrivesOnDesktop",
        ))
        .field(FieldDescriptor::bool(
            "show-external-hard-drives",
            FINDER,
            "ShowExternalHardDrivesOnDesktop",
        ))
        .field(FieldDescriptor::bool(
            "show-removable-media",
            FINDER,
            "ShowRemovableMediaOnDesktop",
        ))
        .field(FieldDescriptor::bool(
            "show-mounted-servers",
            FINDER,
            "ShowMountedServersOnDesktop",
        ))
        .restart(Restart::always("Finder"))
}

impl DomainOptions for DesktopOptions {
    fn populated(&self) -> Vec<(&'static str, FieldValue)> {
        FieldSet::new()
            .bool("sort-folders-first", self.sort_folders_first)
            .bool("show-icons", self.show_icons)
            .bool("show-hard-drives", self.show_hard_drives)
            .bool("show-external-hard-drives", self.show_external_hard_drives)
            .bool("show-removable-media", self.show_removable_media)
            .bool("show-mounted-servers", self.show_mounted_servers)
            .into_entries()
    }
}
