//! Field descriptors: the declared shape of tuples and policies.
//!
//! A descriptor tree is plain data.  `ReField::instantiate` turns a
//! descriptor into a fresh, unattached field instance.
use crate::re::CharSet;

/// The type of a field, together with its universe.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldType {
    /// One of a fixed list of literals.
    Enum(Vec<String>),
    /// Any string over a character set.
    CharsetString(CharSet),
    /// `.`-separated sub-fields.  Sub-fields must be `Enum` or
    /// `CharsetString`.
    Tuple(Vec<FieldDescriptor>),
    /// The allow/deny decision of a policy.
    Decision,
}

impl FieldType {
    /// Returns a short human-readable name for the type.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldType::Enum(_) => "an enum",
            FieldType::CharsetString(_) => "a charset string",
            FieldType::Tuple(_) => "a tuple",
            FieldType::Decision => "a decision",
        }
    }
}

/// A named field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldDescriptor {
    #[must_use]
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_owned(),
            field_type,
        }
    }

    /// Returns a descriptor for an enum over `values`.
    #[must_use]
    pub fn enumeration(name: &str, values: &[&str]) -> Self {
        Self::new(
            name,
            FieldType::Enum(values.iter().map(|v| (*v).to_owned()).collect()),
        )
    }

    #[must_use]
    pub fn charset_string(name: &str, charset: CharSet) -> Self {
        Self::new(name, FieldType::CharsetString(charset))
    }

    #[must_use]
    pub fn tuple(name: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self::new(name, FieldType::Tuple(fields))
    }

    #[must_use]
    pub fn decision(name: &str) -> Self {
        Self::new(name, FieldType::Decision)
    }
}
