//! Errors raised while building field types, attaching values and
//! constructing policies.  Proof outcomes are never errors: see
//! `ProofOutcome`.

/// The broad class of an `Error`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorCategory {
    /// Malformed field descriptors or duplicate names.
    Structural,
    /// A value outside its universe, or missing data.
    Data,
    /// A policy that does not fit its declared shape.
    PolicyStructure,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("the character '{character}' is reserved and cannot be used; it was used in {context}")]
    InvalidCharacter { character: char, context: String },

    #[error("value {value:?} is not allowed: {reason}")]
    InvalidValue { value: String, reason: String },

    #[error("invalid structure: {0}")]
    InvalidStructure(String),

    #[error("no data attached to {0}; was set_data called?")]
    MissingData(String),

    #[error("invalid policy structure: {0}")]
    InvalidPolicyStructure(String),

    #[error("policy requires the {0} field")]
    MissingPolicyField(String),

    #[error("field {field} must be {expected}; got {found}")]
    InvalidPolicyFieldType {
        field: String,
        expected: String,
        found: String,
    },

    #[error("invalid checker configuration: {0}")]
    InvalidConfig(String),

    #[error("all policies handed to one checker must share one shape: {0}")]
    MismatchedPolicyType(String),
}

impl Error {
    pub(crate) fn invalid_value(value: &str, reason: impl Into<String>) -> Self {
        Error::InvalidValue {
            value: value.to_owned(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidStructure(_) | Error::InvalidConfig(_) => ErrorCategory::Structural,
            Error::InvalidCharacter { .. } | Error::InvalidValue { .. } | Error::MissingData(_) => {
                ErrorCategory::Data
            }
            Error::InvalidPolicyStructure(_)
            | Error::MissingPolicyField(_)
            | Error::InvalidPolicyFieldType { .. }
            | Error::MismatchedPolicyType(_) => ErrorCategory::PolicyStructure,
        }
    }
}

#[test]
fn test_category() {
    assert_eq!(
        Error::InvalidStructure("dup".into()).category(),
        ErrorCategory::Structural
    );
    assert_eq!(
        Error::invalid_value("HEAD", "not a verb").category(),
        ErrorCategory::Data
    );
    assert_eq!(
        Error::MissingPolicyField("action".into()).category(),
        ErrorCategory::PolicyStructure
    );
}

#[test]
fn test_display() {
    let error = Error::InvalidCharacter {
        character: '.',
        context: "a.b".into(),
    };
    assert_eq!(
        error.to_string(),
        "the character '.' is reserved and cannot be used; it was used in a.b"
    );
}
