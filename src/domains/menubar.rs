//! Menu bar clock.

use serde::Deserialize;

use crate::registry::{DomainOptions, DomainSchema, FieldDescriptor, FieldSet, FieldValue};

pub const NAME: &str = "menubar";

const CLOCK: &str = "com.apple.menuextra.clock";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct MenubarOptions {
    pub clock_flash_date_separators: Option<bool>,
    /// ICU date pattern, e.g. `"EEE d MMM HH:mm"`.
    pub clock_date_format: Option<String>,
}

pub fn schema() -> DomainSchema {
    DomainSchema::new(NAME)
        .field(FieldDescriptor::bool(
            "clock-flash-date-separators",
            CLOCK,
            "FlashDateSeparators",
        ))
        .field(FieldDescriptor::string("clock-date-format", CLOCK, "DateFormat"))
}

impl DomainOptions for MenubarOptions {
    fn populated(&self) -> Vec<(&'static str, FieldValue)> {
        FieldSet::new()
            .bool("clock-flash-date-separators", self.clock_flash_date_separators)
            .text("clock-date-format", self.clock_date_format.as_deref())
            .into_entries()
    }
}
