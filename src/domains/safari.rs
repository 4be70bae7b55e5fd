use serde::Deserialize;

use crate::defaults::Restart;
use crate::registry::{DomainOptions, DomainSchema, FieldDescriptor, FieldSet, FieldValue};

pub const NAME: &str = "safari";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SafariOptions {
    pub show_full_url: Option<bool>,
}

pub fn schema() -> DomainSchema {
    DomainSchema::new(NAME)
        .field(FieldDescriptor::bool(
            "show-full-url",
            "com.apple.Safari",
            "ShowFullURLInSmartSearchField",
        ))
        .restart(Restart::if_running("Safari"))
}

impl DomainOptions for SafariOptions {
    fn populated(&self) -> Vec<(&'static str, FieldValue)> {
        FieldSet::new()
            .bool("show-full-url", self.show_full_url)
            .into_entries()
    }
}
