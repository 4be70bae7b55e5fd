//! Finder windows, search and file handling.
//!
//! Most keys live in `com.apple.finder`; a few Finder-visible behaviors are
//! global (`NSGlobalDomain`) or accessibility (`com.apple.universalaccess`)
//! preferences.

use serde::Deserialize;

use crate::defaults::Restart;
use crate::registry::{DomainOptions, DomainSchema, FieldDescriptor, FieldSet, FieldValue};

pub const NAME: &str = "finder";

const FINDER: &str = "com.apple.finder";
const GLOBAL: &str = "NSGlobalDomain";
const UNIVERSAL_ACCESS: &str = "com.apple.universalaccess";

pub const VIEW_STYLES: &[&str] = &["clmv", "Nlsv", "glyv", "icnv"];
pub const VIEW_STYLE_ALIASES: &[(&str, &str)] = &[
    ("column", "clmv"),
    ("list", "Nlsv"),
    ("gallery", "glyv"),
    ("icon", "icnv"),
];

pub const SEARCH_SCOPES: &[&str] = &["SCcf", "SCsp", "SCev"];
pub const SEARCH_SCOPE_ALIASES: &[(&str, &str)] = &[
    ("current", "SCcf"),
    ("previous", "SCsp"),
    ("mac", "SCev"),
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FinderOptions {
    pub show_all_extensions: Option<bool>,
    pub show_all_files: Option<bool>,
    pub show_path_bar: Option<bool>,
    pub preferred_view_style: Option<String>,
    pub sort_folders_first: Option<bool>,
    pub finder_spawn_tab: Option<bool>,
    pub default_search_scope: Option<String>,
    pub remove_old_trash_items: Option<bool>,
    pub show_extension_change_warning: Option<bool>,
    pub save_new_docs_to_cloud: Option<bool>,
    pub show_window_titlebar_icons: Option<bool>,
    pub toolbar_title_view_rollover_delay: Option<f64>,
    pub table_view_default_size_mode: Option<i64>,
}

pub fn schema() -> DomainSchema {
    DomainSchema::new(NAME)
        .field(FieldDescriptor::bool(
            "show-all-extensions",
            GLOBAL,
            "AppleShowAllExtensions",
        ))
        .field(FieldDescriptor::bool("show-all-files", FINDER, "AppleShowAllFiles"))
        .field(FieldDescriptor::bool("show-path-bar", FINDER, "ShowPathbar"))
        .field(
            FieldDescriptor::enumeration(
                "preferred-view-style",
                FINDER,
                "FXPreferredViewStyle",
                VIEW_STYLES,
            )
            .with_aliases(VIEW_STYLE_ALIASES),
        )
        .field(FieldDescriptor::bool(
            "sort-folders-first",
            FINDER,
            "_FXSortFoldersFirst",
        ))
        .field(FieldDescriptor::bool("finder-spawn-tab", FINDER, "FinderSpawnTab"))
        .field(
            FieldDescriptor::enumeration(
                "default-search-scope",
                FINDER,
                "FXDefaultSearchScope",
                SEARCH_SCOPES,
            )
            .with_aliases(SEARCH_SCOPE_ALIASES),
        )
        .field(FieldDescriptor::bool(
            "remove-old-trash-items",
            FINDER,
            "FXRemoveOldTrashItems",
        ))
        .field(FieldDescriptor::bool(
            "show-extension-change-warning",
            FINDER,
            "FXEnableExtensionChangeWarning",
        ))
        .field(FieldDescriptor::bool(
            "save-new-docs-to-cloud",
            GLOBAL,
            "NSDocumentSaveNewDocumentsToCloud",
        ))
        .field(FieldDescriptor::bool(
            "show-window-titlebar-icons",
            UNIVERSAL_ACCESS,
            "showWindowTitlebarIcons",
        ))
        .field(FieldDescriptor::float(
            "toolbar-title-view-rollover-delay",
            GLOBAL,
            "NSToolbarTitleViewRolloverDelay",
        ))
        .field(FieldDescriptor::int(
            "table-view-default-size-mode",
            GLOBAL,
            "NSTableViewDefaultSizeMode",
        ))
        .restart(Restart::always("Finder"))
}

impl DomainOptions for FinderOptions {
    fn populated(&self) -> Vec<(&'static str, FieldValue)> {
        FieldSet::new()
            .bool("show-all-extensions", self.show_all_extensions)
            .bool("show-all-files", self.show_all_files)
            .bool("show-path-bar", self.show_path_bar)
            .text("preferred-view-style", self.preferred_view_style.as_deref())
            .bool("sort-folders-first", self.sort_folders_first)
            .bool("finder-spawn-tab", self.finder_spawn_tab)
            .text("default-search-scope", self.default_search_scope.as_deref())
            .bool("remove-old-trash-items", self.remove_old_trash_items)
            .bool(
                "show-extension-change-warning",
                self.show_extension_change_warning,
            )
            .bool("save-new-docs-to-cloud", self.save_new_docs_to_cloud)
            .bool("show-window-titlebar-icons", self.show_window_titlebar_icons)
            .float(
                "toolbar-title-view-rollover-delay",
                self.toolbar_title_view_rollover_delay,
            )
            .int(
                "table-view-default-size-mode",
                self.table_view_default_size_mode,
            )
            .into_entries()
    }
}
