//! Dock appearance and behavior (`com.apple.dock`).

use serde::Deserialize;

use crate::defaults::Restart;
use crate::registry::{DomainOptions, DomainSchema, FieldDescriptor, FieldSet, FieldValue};

pub const NAME: &str = "dock";

const DOCK: &str = "com.apple.dock";

pub const ORIENTATIONS: &[&str] = &["left", "bottom", "right"];
pub const MINIMIZE_EFFECTS: &[&str] = &["genie", "scale", "suck"];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct DockOptions {
    pub autohide: Option<bool>,
    pub orientation: Option<String>,
    pub tilesize: Option<i64>,
    pub autohide_time_modifier: Option<f64>,
    pub autohide_delay: Option<f64>,
    pub show_recents: Option<bool>,
    pub mineffect: Option<String>,
    pub static_only: Option<bool>,
    pub scroll_to_open: Option<bool>,
}

pub fn schema() -> DomainSchema {
    DomainSchema::new(NAME)
        .field(FieldDescriptor::bool("autohide", DOCK, "autohide"))
        .field(FieldDescriptor::enumeration(
            "orientation",
            DOCK,
            "orientation",
            ORIENTATIONS,
        ))
        .field(FieldDescriptor::int("tilesize", DOCK, "tilesize"))
        .field(FieldDescriptor::float(
            "autohide-time-modifier",
            DOCK,
            "autohide-time-modifier",
        ))
        .field(FieldDescriptor::float("autohide-delay", DOCK, "autohide-delay"))
        .field(FieldDescriptor::bool("show-recents", DOCK, "show-recents"))
        .field(FieldDescriptor::enumeration(
            "mineffect",
            DOCK,
            "mineffect",
            MINIMIZE_EFFECTS,
        ))
        .field(FieldDescriptor::bool("static-only", DOCK, "static-only"))
        .field(FieldDescriptor::bool("scroll-to-open", DOCK, "scroll-to-open"))
        .restart(Restart::always("Dock"))
}

impl DomainOptions for DockOptions {
    fn populated(&self) -> Vec<(&'static str, FieldValue)> {
        FieldSet::new()
            .bool("autohide", self.autohide)
            .text("orientation", self.orientation.as_deref())
            .int("tilesize", self.tilesize)
            .float("autohide-time-modifier", self.autohide_time_modifier)
            .float("autohide-delay", self.autohide_delay)
            .bool("show-recents", self.show_recents)
            .text("mineffect", self.mineffect.as_deref())
            .bool("static-only", self.static_only)
            .bool("scroll-to-open", self.scroll_to_open)
            .into_entries()
    }
}
