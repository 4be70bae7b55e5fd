//! Keyboard behavior.

use serde::Deserialize;

use crate::registry::{DomainOptions, DomainSchema, FieldDescriptor, FieldSet, FieldValue};

pub const NAME: &str = "keyboard";

const GLOBAL: &str = "NSGlobalDomain";

pub const FN_KEY_BEHAVIORS: &[&str] = &["dictation", "input-source", "emoji", "none"];

/// `AppleKeyboardUIMode` value enabling full keyboard navigation.
const FULL_KEYBOARD_ACCESS: i64 = 2;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct KeyboardOptions {
    pub key_hold_shows_accents: Option<bool>,
    pub fn_key_behavior: Option<String>,
    pub special_f_keys: Option<bool>,
    pub tab_navigation: Option<bool>,
    pub language_indicator: Option<bool>,
}

pub fn schema() -> DomainSchema {
    DomainSchema::new(NAME)
        .field(FieldDescriptor::bool(
            "key-hold-shows-accents",
            GLOBAL,
            "ApplePressAndHoldEnabled",
        ))
        .field(FieldDescriptor::enumeration(
            "fn-key-behavior",
            "com.apple.HIToolbox",
            "AppleFnUsageType",
            FN_KEY_BEHAVIORS,
        ))
        .field(FieldDescriptor::bool(
            "special-f-keys",
            GLOBAL,
            "com.apple.keyboard.fnState",
        ))
        .field(FieldDescriptor::int("tab-navigation", GLOBAL, "AppleKeyboardUIMode"))
        .field(FieldDescriptor::bool(
            "language-indicator",
            "kCFPreferencesAnyApplication",
            "TSMLanguageIndicatorEnabled",
        ))
}

impl DomainOptions for KeyboardOptions {
    fn populated(&self) -> Vec<(&'static str, FieldValue)> {
        FieldSet::new()
            .bool("key-hold-shows-accents", self.key_hold_shows_accents)
            .text("fn-key-behavior", self.fn_key_behavior.as_deref())
            .bool("special-f-keys", self.special_f_keys)
            .int(
                "tab-navigation",
                self.tab_navigation
                    .map(|on| if on { FULL_KEYBOARD_ACCESS } else { 0 }),
            )
            .bool("language-indicator", self.language_indicator)
            .into_entries()
    }
}
