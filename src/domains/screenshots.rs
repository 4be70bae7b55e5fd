//! Screenshot capture (`com.apple.screencapture`). Takes effect without a restart.

use serde::Deserialize;

use crate::registry::{DomainOptions, DomainSchema, FieldDescriptor, FieldSet, FieldValue};

pub const NAME: &str = "screenshots";

const SCREENCAPTURE: &str = "com.apple.screencapture";

pub const FORMATS: &[&str] = &[
    "png", "jpg", "jpeg", "pdf", "psd", "gif", "tga", "tiff", "bmp", "heic",
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ScreenshotOptions {
    pub disable_shadow: Option<bool>,
    pub include_date: Option<bool>,
    pub save_location: Option<String>,
    pub show_thumbnail: Option<bool>,
    pub format: Option<String>,
}

pub fn schema() -> DomainSchema {
    DomainSchema::new(NAME)
        .field(FieldDescriptor::bool("disable-shadow", SCREENCAPTURE, "disable-shadow"))
        .field(FieldDescriptor::bool("include-date", SCREENCAPTURE, "include-date"))
        .field(FieldDescriptor::string("save-location", SCREENCAPTURE, "location"))
        .field(FieldDescriptor::bool("show-thumbnail", SCREENCAPTURE, "show-thumbnail"))
        .field(FieldDescriptor::enumeration("format", SCREENCAPTURE, "type", FORMATS))
}

impl DomainOptions for ScreenshotOptions {
    fn populated(&self) -> Vec<(&'static str, FieldValue)> {
        FieldSet::new()
            .bool("disable-shadow", self.disable_shadow)
            .bool("include-date", self.include_date)
            .text("save-location", self.save_location.as_deref())
            .bool("show-thumbnail", self.show_thumbnail)
            .text("format", self.format.as_deref())
            .into_entries()
    }
}
