//! Typed preference values and their `defaults` rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Decimal places used when rendering floats unless stated otherwise.
pub const DEFAULT_FLOAT_PRECISION: usize = 2;

/// Value types understood by `defaults write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    String,
    Int,
    Float,
}

impl ValueKind {
    /// The `defaults write` type flag.
    pub fn flag(self) -> &'static str {
        match self {
            ValueKind::Bool => "-bool",
            ValueKind::String => "-string",
            ValueKind::Int => "-int",
            ValueKind::Float => "-float",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric types accepted by [`TypedValue::float`].
pub trait FloatSource: Copy {
    fn to_f64(self) -> f64;
}

macro_rules! float_source {
    ($($t:ty),*) => {
        $(impl FloatSource for $t {
            fn to_f64(self) -> f64 {
                self as f64
            }
        })*
    };
}

float_source!(f32, f64, i8, i16, i32, i64, u8, u16, u32, u64);

/// A value destined for the preference store.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    Str(String),
    Int(i64),
    Float { value: f64, precision: usize },
    /// A string restricted to `allowed`. Renders as a string.
    Enum { value: String, allowed: Vec<String> },
    /// Delete the key so the system default applies.
    Reset(ValueKind),
}

impl TypedValue {
    pub fn string(value: impl Into<String>) -> Self {
        TypedValue::Str(value.into())
    }

    /// Integer value from any integer type that fits in an `i64`.
    pub fn int<T>(value: T) -> Result<Self, ValidationError>
    where
        T: TryInto<i64> + fmt::Display + Copy,
    {
        value
            .try_into()
            .map(TypedValue::Int)
            .map_err(|_| ValidationError::value(value, "integer out of range for a 64-bit preference"))
    }

    /// Float rendered with [`DEFAULT_FLOAT_PRECISION`] decimals.
    pub fn float<T: FloatSource>(value: T) -> Self {
        Self::float_with_precision(value, DEFAULT_FLOAT_PRECISION)
    }

    pub fn float_with_precision<T: FloatSource>(value: T, precision: usize) -> Self {
        TypedValue::Float {
            value: value.to_f64(),
            precision,
        }
    }

    pub fn enumeration<S: AsRef<str>>(value: impl Into<String>, allowed: &[S]) -> Self {
        TypedValue::Enum {
            value: value.into(),
            allowed: allowed.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Bool(_) => ValueKind::Bool,
            TypedValue::Str(_) | TypedValue::Enum { .. } => ValueKind::String,
            TypedValue::Int(_) => ValueKind::Int,
            TypedValue::Float { .. } => ValueKind::Float,
            TypedValue::Reset(kind) => *kind,
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, TypedValue::Reset(_))
    }

    /// Check the value can be written.
    ///
    /// Strings must be non-empty, enum values must be one of the allowed
    /// values, floats must be finite. Resets are always valid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            TypedValue::Str(s) if s.is_empty() => {
                Err(ValidationError::value("\"\"", "string value cannot be empty"))
            }
            TypedValue::Enum { value, allowed } if !allowed.iter().any(|a| a == value) => {
                Err(ValidationError::value(
                    value,
                    format!("value not allowed, must be one of: {}", allowed.join(", ")),
                ))
            }
            TypedValue::Float { value, .. } if !value.is_finite() => {
                Err(ValidationError::value(value, "float value must be finite"))
            }
            _ => Ok(()),
        }
    }

    /// The textual argument passed to `defaults write`; `None` for resets.
    pub fn render(&self) -> Option<String> {
        match self {
            TypedValue::Bool(b) => Some(b.to_string()),
            TypedValue::Str(s) => Some(s.clone()),
            TypedValue::Enum { value, .. } => Some(value.clone()),
            TypedValue::Int(i) => Some(i.to_string()),
            TypedValue::Float { value, precision } => Some(format!("{:.*}", precision, value)),
            TypedValue::Reset(_) => None,
        }
    }

    /// Parse rendered text back into a value of `kind`.
    ///
    /// Floats keep the number of decimals present in `text` as their precision.
    pub fn parse(kind: ValueKind, text: &str) -> Result<Self, ValidationError> {
        match kind {
            ValueKind::Bool => match text {
                "true" => Ok(TypedValue::Bool(true)),
                "false" => Ok(TypedValue::Bool(false)),
                _ => Err(ValidationError::value(text, "expected true or false")),
            },
            ValueKind::String => Ok(TypedValue::Str(text.to_string())),
            ValueKind::Int => text
                .parse::<i64>()
                .map(TypedValue::Int)
                .map_err(|e| ValidationError::value(text, e.to_string())),
            ValueKind::Float => {
                let value = text
                    .parse::<f64>()
                    .map_err(|e| ValidationError::value(text, e.to_string()))?;
                let precision = text.split_once('.').map_or(0, |(_, frac)| frac.len());
                Ok(TypedValue::Float { value, precision })
            }
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Some(text) => f.write_str(&text),
            None => write!(f, "<reset {}>", self.kind()),
        }
    }
}
