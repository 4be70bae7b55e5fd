//! Free-form `defaultsRaw` entries.
//!
//! Each entry is keyed by `<preference-domain>.<key>`; the domain is
//! everything before the last dot:
//!
//! ```toml
//! [macos.defaultsRaw."com.apple.dock.autohide"]
//! value = true
//! type = "bool"
//!
//! [macos.defaultsRaw."com.apple.dock.tilesize"]
//! type = "int"
//! value = "default"   # delete the key
//! ```
//!
//! An entry resets its key when `reset = true`, when `value` is missing, or
//! when `value` is the string `"default"`. The one exception: a `string`
//! entry with an explicit `reset = false` writes the literal `"default"`.
//!
//! Entries run in key order, not in the order they appear in the document.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::command::{Batch, Command};
use super::value::{TypedValue, ValueKind};
use super::ValidationError;

/// Name of the settings domain that carries raw entries.
pub const RAW_DOMAIN: &str = "defaults-raw";

/// String value meaning "delete this key".
pub const RESET_SENTINEL: &str = "default";

/// Raw entries in key order.
pub type RawDefaults = BTreeMap<String, RawDefaultsEntry>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDefaultsEntry {
    #[serde(default)]
    pub value: Option<toml::Value>,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    #[serde(default)]
    pub reset: Option<bool>,
}

impl RawDefaultsEntry {
    /// Whether this entry deletes its key.
    ///
    /// `reset = true`, a missing value, or the string `"default"` all mean
    /// reset. A string entry with an explicit `reset = false` writes a
    /// literal `"default"` instead.
    pub fn should_reset(&self) -> bool {
        match self.reset {
            Some(true) => true,
            Some(false) if self.kind == ValueKind::String => self.value.is_none(),
            _ => self.value.is_none() || self.is_sentinel(),
        }
    }

    fn is_sentinel(&self) -> bool {
        matches!(&self.value, Some(toml::Value::String(s)) if s == RESET_SENTINEL)
    }

    /// Convert to a typed value, checking the TOML type against `type`.
    ///
    /// Integer TOML values are accepted for `float` entries.
    pub fn typed_value(&self) -> Result<TypedValue, ValidationError> {
        if self.should_reset() {
            return Ok(TypedValue::Reset(self.kind));
        }
        let Some(value) = &self.value else {
            return Ok(TypedValue::Reset(self.kind));
        };
        match (self.kind, value) {
            (ValueKind::Bool, toml::Value::Boolean(b)) => Ok(TypedValue::Bool(*b)),
            (ValueKind::String, toml::Value::String(s)) => Ok(TypedValue::Str(s.clone())),
            (ValueKind::Int, toml::Value::Integer(i)) => Ok(TypedValue::Int(*i)),
            (ValueKind::Float, toml::Value::Float(f)) => Ok(TypedValue::float(*f)),
            (ValueKind::Float, toml::Value::Integer(i)) => Ok(TypedValue::float(*i)),
            (kind, other) => Err(ValidationError::value(
                other,
                format!("expected a {} value, got {}", kind, other.type_str()),
            )),
        }
    }
}

/// Split `domain.key` at the last dot.
pub fn split_domain_key(domain_key: &str) -> Result<(&str, &str), ValidationError> {
    match domain_key.rsplit_once('.') {
        Some((domain, key)) if !domain.is_empty() && !key.is_empty() => Ok((domain, key)),
        _ => Err(ValidationError::new(
            domain_key,
            domain_key,
            "expected <preference-domain>.<key>, e.g. com.apple.dock.autohide",
        )),
    }
}

/// Build the raw domain's batch, failing on the first malformed entry.
///
/// Commands follow the sorted `domain.key` order of [`RawDefaults`].
pub fn raw_batch(raw: &RawDefaults) -> Result<Batch, ValidationError> {
    let mut batch = Batch::new(RAW_DOMAIN);
    for (domain_key, entry) in raw {
        let (domain, key) = split_domain_key(domain_key)?;
        let value = entry
            .typed_value()
            .map_err(|e| e.for_field(domain_key.as_str()))?;
        batch.push(Command::new(domain, key, value));
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::StoreOp;

    fn parse(text: &str) -> RawDefaults {
        toml::from_str(text).unwrap()
    }

    fn ops(text: &str) -> Vec<String> {
        raw_batch(&parse(text))
            .unwrap()
            .operations()
            .unwrap()
            .iter()
            .map(StoreOp::to_string)
            .collect()
    }

    #[test]
    fn test_entries_run_in_key_order() {
        let ops = ops(
            "[\"com.zeta.Last\"]\nvalue = 1\ntype = \"int\"\n\
             [\"com.alpha.First\"]\nvalue = 2\ntype = \"int\"\n",
        );
        assert_eq!(
            ops,
            vec![
                "defaults write com.alpha First -int 2",
                "defaults write com.zeta Last -int 1",
            ]
        );
    }

    #[test]
    fn test_typed_entries() {
        let lines = ops(r#"
            ["com.apple.dock.autohide"]
            value = true
            type = "bool"

            ["com.apple.dock.tilesize"]
            value = 36
            type = "int"

            ["com.apple.screencapture.location"]
            value = "~/Pictures"
            type = "string"

            ["NSGlobalDomain.com.apple.mouse.scaling"]
            value = 2
            type = "float"
        "#);
        assert_eq!(
            lines,
            vec![
                "defaults write NSGlobalDomain.com.apple.mouse scaling -float 2.00",
                "defaults write com.apple.dock autohide -bool true",
                "defaults write com.apple.dock tilesize -int 36",
                "defaults write com.apple.screencapture location -string ~/Pictures",
            ]
        );
    }

    #[test]
    fn test_default_sentinel_resets() {
        let lines = ops(r#"
            ["com.apple.dock.autohide"]
            value = "default"
            type = "bool"
        "#);
        assert_eq!(lines, vec!["defaults delete com.apple.dock autohide"]);
    }

    #[test]
    fn test_missing_value_resets() {
        let lines = ops(r#"
            ["com.apple.dock.tilesize"]
            type = "int"
        "#);
        assert_eq!(lines, vec!["defaults delete com.apple.dock tilesize"]);
    }

    #[test]
    fn test_reset_flag_wins_over_value() {
        let lines = ops(r#"
            ["com.apple.dock.tilesize"]
            value = 48
            type = "int"
            reset = true
        "#);
        assert_eq!(lines, vec!["defaults delete com.apple.dock tilesize"]);
    }

    #[test]
    fn test_explicit_no_reset_writes_literal_default() {
        let lines = ops(r#"
            ["com.example.app.theme"]
            value = "default"
            type = "string"
            reset = false
        "#);
        assert_eq!(
            lines,
            vec!["defaults write com.example.app theme -string default"]
        );
    }

    #[test]
    fn test_type_mismatch() {
        let raw = parse(r#"
            ["com.apple.dock.autohide"]
            value = "yes"
            type = "bool"
        "#);
        let err = raw_batch(&raw).unwrap_err();
        assert_eq!(err.field, "com.apple.dock.autohide");
        assert!(err.reason.contains("expected a bool value"));
    }

    #[test]
    fn test_key_without_domain() {
        let raw = parse(r#"
            [autohide]
            value = true
            type = "bool"
        "#);
        let err = raw_batch(&raw).unwrap_err();
        assert_eq!(err.field, "autohide");
    }

    #[test]
    fn test_unknown_type_rejected_at_parse() {
        let result: Result<RawDefaults, _> = toml::from_str(
            r#"
            ["com.apple.dock.autohide"]
            value = true
            type = "boolean"
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_split_domain_key() {
        assert_eq!(
            split_domain_key("com.apple.dock.autohide").unwrap(),
            ("com.apple.dock", "autohide")
        );
        assert!(split_domain_key("trailing.").is_err());
        assert!(split_domain_key(".leading").is_err());
    }
}
