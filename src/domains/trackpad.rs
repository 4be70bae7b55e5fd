use serde::Deserialize;

use crate::registry::{DomainOptions, DomainSchema, FieldDescriptor, FieldSet, FieldValue, Rule};

pub const NAME: &str = "trackpad";

const TRACKPAD: &str = "com.apple.AppleMultitouchTrackpad";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct TrackpadOptions {
    /// Click pressure: 0 (light) to 3 (firm).
    pub click_weight: Option<i64>,
    pub three_finger_drag: Option<bool>,
}

pub fn schema() -> DomainSchema {
    DomainSchema::new(NAME)
        .field(
            FieldDescriptor::int("click-weight", TRACKPAD, "FirstClickThreshold")
                .with_rule(Rule::IntRange { min: 0, max: 3 }),
        )
        .field(FieldDescriptor::bool(
            "three-finger-drag",
            TRACKPAD,
            "TrackpadThreeFingerDrag",
        ))
}

impl DomainOptions for TrackpadOptions {
    fn populated(&self) -> Vec<(&'static str, FieldValue)> {
        FieldSet::new()
            .int("click-weight", self.click_weight)
            .bool("three-finger-drag", self.three_finger_drag)
            .into_entries()
    }
}
