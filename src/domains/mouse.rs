//! Mouse tracking. Both keys are global preferences.

use serde::Deserialize;

use crate::registry::{DomainOptions, DomainSchema, FieldDescriptor, FieldSet, FieldValue};

pub const NAME: &str = "mouse";

const GLOBAL: &str = "NSGlobalDomain";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct MouseOptions {
    /// Pointer acceleration. Stored inverted, as `com.apple.mouse.linear`.
    pub acceleration: Option<bool>,
    pub speed: Option<f64>,
}

pub fn schema() -> DomainSchema {
    DomainSchema::new(NAME)
        .field(FieldDescriptor::bool(
            "acceleration",
            GLOBAL,
            "com.apple.mouse.linear",
        ))
        .field(FieldDescriptor::float("speed", GLOBAL, "com.apple.mouse.scaling"))
}

impl DomainOptions for MouseOptions {
    fn populated(&self) -> Vec<(&'static str, FieldValue)> {
        FieldSet::new()
            .bool("acceleration", self.acceleration.map(|on| !on))
            .float("speed", self.speed)
            .into_entries()
    }
}
