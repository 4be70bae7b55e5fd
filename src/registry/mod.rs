//! Declarative field registry for typed settings domains.
//!
//! Each domain declares its fields once as [`FieldDescriptor`]s: the document
//! tag, the preference domain and key it maps to, its kind, and any enum
//! values, aliases or range rule. [`Registry::synthesize`] walks the
//! populated options of a domain against those descriptors and produces the
//! commands for its batch.
//!
//! ## Synthesis rules
//!
//! - fields are emitted in descriptor order
//! - enum values match allowed values case-insensitively, then aliases
//! - a populated tag with no descriptor is a validation error
//! - values equal to `"default"` are written as-is; only `defaultsRaw`
//!   entries have reset semantics

use std::fmt;

use crate::defaults::{Batch, Command, Restart, TypedValue, ValidationError};
use crate::{Error, Result};

/// A populated option value, before it is typed against its descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    String,
    Enum,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::String => "string",
            FieldKind::Enum => "enum",
        };
        f.write_str(name)
    }
}

/// Extra constraint on a numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    IntRange { min: i64, max: i64 },
    FloatRange { min: f64, max: f64 },
}

impl Rule {
    fn check(&self, value: &TypedValue) -> std::result::Result<(), String> {
        match (self, value) {
            (Rule::IntRange { min, max }, TypedValue::Int(i)) if i < min || i > max => {
                Err(format!("must be between {} and {}", min, max))
            }
            (Rule::FloatRange { min, max }, TypedValue::Float { value, .. })
                if value < min || value > max =>
            {
                Err(format!("must be between {} and {}", min, max))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::IntRange { min, max } => write!(f, "{}..={}", min, max),
            Rule::FloatRange { min, max } => write!(f, "{}..={}", min, max),
        }
    }
}

/// How one document field maps onto the preference store.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Kebab-case tag used in the document.
    pub tag: &'static str,
    /// Preference domain, e.g. `com.apple.dock` or `NSGlobalDomain`.
    pub domain: &'static str,
    pub key: &'static str,
    pub kind: FieldKind,
    pub enum_values: &'static [&'static str],
    /// `(alias, canonical)` pairs accepted for enum fields.
    pub aliases: &'static [(&'static str, &'static str)],
    pub rule: Option<Rule>,
}

impl FieldDescriptor {
    fn new(tag: &'static str, domain: &'static str, key: &'static str, kind: FieldKind) -> Self {
        Self {
            tag,
            domain,
            key,
            kind,
            enum_values: &[],
            aliases: &[],
            rule: None,
        }
    }

    pub fn bool(tag: &'static str, domain: &'static str, key: &'static str) -> Self {
        Self::new(tag, domain, key, FieldKind::Bool)
    }

    pub fn int(tag: &'static str, domain: &'static str, key: &'static str) -> Self {
        Self::new(tag, domain, key, FieldKind::Int)
    }

    pub fn float(tag: &'static str, domain: &'static str, key: &'static str) -> Self {
        Self::new(tag, domain, key, FieldKind::Float)
    }

    pub fn string(tag: &'static str, domain: &'static str, key: &'static str) -> Self {
        Self::new(tag, domain, key, FieldKind::String)
    }

    pub fn enumeration(
        tag: &'static str,
        domain: &'static str,
        key: &'static str,
        values: &'static [&'static str],
    ) -> Self {
        Self {
            enum_values: values,
            ..Self::new(tag, domain, key, FieldKind::Enum)
        }
    }

    pub fn with_aliases(mut self, aliases: &'static [(&'static str, &'static str)]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Canonical spelling of an enum value, or the input unchanged.
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if let Some(value) = self
            .enum_values
            .iter()
            .find(|v| v.eq_ignore_ascii_case(trimmed))
        {
            return value.to_string();
        }
        if let Some((_, value)) = self
            .aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
        {
            return value.to_string();
        }
        raw.to_string()
    }

    /// Type, normalize and check a populated value.
    fn typed_value(&self, value: &FieldValue) -> std::result::Result<TypedValue, String> {
        let typed = match (self.kind, value) {
            (FieldKind::Bool, FieldValue::Bool(b)) => TypedValue::Bool(*b),
            (FieldKind::Int, FieldValue::Int(i)) => TypedValue::Int(*i),
            (FieldKind::Float, FieldValue::Float(x)) => TypedValue::float(*x),
            (FieldKind::Float, FieldValue::Int(i)) => TypedValue::float(*i),
            (FieldKind::String, FieldValue::Text(s)) => TypedValue::Str(s.clone()),
            (FieldKind::Enum, FieldValue::Text(s)) => {
                TypedValue::enumeration(self.normalize(s), self.enum_values)
            }
            (kind, other) => {
                return Err(format!("expected {} value, got {}", kind, other.type_name()));
            }
        };
        typed.validate().map_err(|e| e.reason)?;
        if let Some(rule) = &self.rule {
            rule.check(&typed)?;
        }
        Ok(typed)
    }
}

/// A typed settings domain: its fields and the processes to restart.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSchema {
    pub name: &'static str,
    pub fields: Vec<FieldDescriptor>,
    pub restarts: Vec<Restart>,
}

impl DomainSchema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            restarts: Vec::new(),
        }
    }

    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.push(descriptor);
        self
    }

    pub fn restart(mut self, restart: Restart) -> Self {
        self.restarts.push(restart);
        self
    }

    pub fn descriptor(&self, tag: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.tag == tag)
    }
}

/// Options of one typed domain as parsed from the document.
pub trait DomainOptions {
    /// Tags and values of the populated fields.
    fn populated(&self) -> Vec<(&'static str, FieldValue)>;
}

/// Builder collecting the populated fields of a [`DomainOptions`] value.
#[derive(Debug, Default)]
pub struct FieldSet {
    entries: Vec<(&'static str, FieldValue)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bool(mut self, tag: &'static str, value: Option<bool>) -> Self {
        if let Some(b) = value {
            self.entries.push((tag, FieldValue::Bool(b)));
        }
        self
    }

    pub fn int(mut self, tag: &'static str, value: Option<i64>) -> Self {
        if let Some(i) = value {
            self.entries.push((tag, FieldValue::Int(i)));
        }
        self
    }

    pub fn float(mut self, tag: &'static str, value: Option<f64>) -> Self {
        if let Some(x) = value {
            self.entries.push((tag, FieldValue::Float(x)));
        }
        self
    }

    pub fn text(mut self, tag: &'static str, value: Option<&str>) -> Self {
        if let Some(s) = value {
            self.entries.push((tag, FieldValue::Text(s.to_string())));
        }
        self
    }

    pub fn into_entries(self) -> Vec<(&'static str, FieldValue)> {
        self.entries
    }
}

/// Commands and validation errors produced for one domain.
#[derive(Debug, Default)]
pub struct Synthesis {
    pub domain: String,
    pub commands: Vec<Command>,
    pub errors: Vec<ValidationError>,
}

impl Synthesis {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The domain's batch, or the first validation error.
    pub fn into_batch(self) -> std::result::Result<Batch, ValidationError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        let mut batch = Batch::new(self.domain);
        for command in self.commands {
            batch.push(command);
        }
        Ok(batch)
    }
}

/// The set of known typed domains.
#[derive(Debug, Default)]
pub struct Registry {
    domains: Vec<DomainSchema>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a domain. Names and tags within a domain must be unique.
    pub fn register(&mut self, schema: DomainSchema) -> Result<()> {
        if self.get(schema.name).is_some() {
            return Err(Error::Other(format!(
                "domain {} is already registered",
                schema.name
            )));
        }
        for (index, field) in schema.fields.iter().enumerate() {
            if schema.fields[..index].iter().any(|f| f.tag == field.tag) {
                return Err(Error::Other(format!(
                    "domain {} declares field {} twice",
                    schema.name, field.tag
                )));
            }
        }
        self.domains.push(schema);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DomainSchema> {
        self.domains.iter().find(|d| d.name == name)
    }

    /// Registered domains in registration order.
    pub fn domains(&self) -> impl Iterator<Item = &DomainSchema> {
        self.domains.iter()
    }

    pub fn synthesize(&self, name: &str, options: &dyn DomainOptions) -> Result<Synthesis> {
        let schema = self
            .get(name)
            .ok_or_else(|| Error::Other(format!("unknown settings domain: {}", name)))?;
        let populated = options.populated();

        let mut synthesis = Synthesis {
            domain: name.to_string(),
            ..Synthesis::default()
        };

        for (tag, value) in &populated {
            if schema.descriptor(tag).is_none() {
                synthesis.errors.push(ValidationError::new(
                    format!("{}.{}", name, tag),
                    value,
                    "no such field in this domain",
                ));
            }
        }

        for field in &schema.fields {
            let Some((_, value)) = populated.iter().find(|(tag, _)| *tag == field.tag) else {
                continue;
            };
            match field.typed_value(value) {
                Ok(typed) => synthesis
                    .commands
                    .push(Command::new(field.domain, field.key, typed)),
                Err(reason) => synthesis.errors.push(ValidationError::new(
                    format!("{}.{}", name, field.tag),
                    value,
                    reason,
                )),
            }
        }

        Ok(synthesis)
    }
}
