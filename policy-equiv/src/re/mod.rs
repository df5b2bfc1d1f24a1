//! Typed string fields.  Each field type denotes a regular language
//! over strings, fixed by a universe at construction and narrowed by
//! the value attached with `set_data`.
mod charset;
mod enumeration;
mod string;
mod tuple;

pub use charset::CharSet;
pub use enumeration::EnumRe;
pub use string::CharsetStringRe;
pub use tuple::TupleRe;

use crate::backend::Backend;
use crate::error::Error;
use crate::field::FieldType;

/// Separates the sub-fields of a tuple; never allowed in universes.
pub const SEPARATOR: char = '.';

/// Stands for the whole universe, or for any run of charset
/// characters inside a value.
pub const WILDCARD: char = '*';

/// Fails with `InvalidCharacter` if `text` contains the reserved
/// separator.  Every constructor that accepts literals goes through
/// here.
pub(crate) fn check_reserved(text: &str, context: &str) -> Result<(), Error> {
    if text.contains(SEPARATOR) {
        return Err(Error::InvalidCharacter {
            character: SEPARATOR,
            context: context.to_owned(),
        });
    }

    Ok(())
}

/// Returns true iff `value` is the lone wildcard.
pub(crate) fn is_wildcard(value: &str) -> bool {
    let mut chars = value.chars();
    chars.next() == Some(WILDCARD) && chars.next().is_none()
}

/// The value attached to a field instance, if any.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Attached<T> {
    Unset,
    Set(T),
}

impl<T> Default for Attached<T> {
    fn default() -> Self {
        Attached::Unset
    }
}

impl<T> Attached<T> {
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        match self {
            Attached::Unset => None,
            Attached::Set(value) => Some(value),
        }
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        matches!(self, Attached::Set(_))
    }

    /// Returns the attached value, or `MissingData` naming `what`.
    pub(crate) fn require(&self, what: &str) -> Result<&T, Error> {
        self.get().ok_or_else(|| Error::MissingData(what.to_owned()))
    }
}

/// A field instance of any regex type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReField {
    Enum(EnumRe),
    CharsetString(CharsetStringRe),
    Tuple(TupleRe),
}

impl ReField {
    /// Builds an unattached instance of `field_type`.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidStructure` for `Decision`, which is not a
    /// regex type, and with whatever the type's constructor rejects.
    pub fn instantiate(field_type: &FieldType) -> Result<Self, Error> {
        match field_type {
            FieldType::Enum(values) => Ok(ReField::Enum(EnumRe::new(values.iter().cloned())?)),
            FieldType::CharsetString(charset) => {
                Ok(ReField::CharsetString(CharsetStringRe::new(charset.clone())))
            }
            FieldType::Tuple(fields) => Ok(ReField::Tuple(TupleRe::new(fields.clone())?)),
            FieldType::Decision => Err(Error::InvalidStructure(
                "a decision is not a regex field type".into(),
            )),
        }
    }

    /// Returns the type (and universe) of this instance.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        match self {
            ReField::Enum(field) => FieldType::Enum(field.values().to_vec()),
            ReField::CharsetString(field) => FieldType::CharsetString(field.charset().clone()),
            ReField::Tuple(field) => FieldType::Tuple(field.descriptors()),
        }
    }

    /// Returns true iff a value is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        match self {
            ReField::Enum(field) => field.data().is_some(),
            ReField::CharsetString(field) => field.data().is_some(),
            ReField::Tuple(field) => field.is_attached(),
        }
    }

    /// Compiles the attached value.
    pub fn to_re<B: Backend>(&self, backend: &mut B) -> Result<B::Re, Error> {
        match self {
            ReField::Enum(field) => field.to_re(backend),
            ReField::CharsetString(field) => field.to_re(backend),
            ReField::Tuple(field) => field.to_re(backend),
        }
    }

    /// Returns the term "`var` matches the attached value".
    pub fn bool_term<B: Backend>(&self, backend: &mut B, var: &B::Var) -> Result<B::Bool, Error> {
        let re = self.to_re(backend)?;
        Ok(backend.in_re(var, &re))
    }
}

impl From<EnumRe> for ReField {
    fn from(field: EnumRe) -> Self {
        ReField::Enum(field)
    }
}

impl From<CharsetStringRe> for ReField {
    fn from(field: CharsetStringRe) -> Self {
        ReField::CharsetString(field)
    }
}

impl From<TupleRe> for ReField {
    fn from(field: TupleRe) -> Self {
        ReField::Tuple(field)
    }
}

#[test]
fn test_check_reserved() {
    assert!(check_reserved("tacc", "sites").is_ok());
    assert_eq!(
        check_reserved("ta.cc", "sites"),
        Err(Error::InvalidCharacter {
            character: '.',
            context: "sites".into()
        })
    );
}

#[test]
fn test_instantiate() {
    let field = ReField::instantiate(&FieldType::Enum(vec!["GET".into(), "PUT".into()]))
        .expect("valid enum");
    assert!(!field.is_attached());
    assert_eq!(
        field.field_type(),
        FieldType::Enum(vec!["GET".into(), "PUT".into()])
    );

    assert!(matches!(
        ReField::instantiate(&FieldType::Decision),
        Err(Error::InvalidStructure(_))
    ));
}

#[test]
fn test_unattached_to_re() {
    let mut ctx = regsat::Context::new();
    let field = ReField::instantiate(&FieldType::Enum(vec!["GET".into()])).expect("valid enum");

    assert!(matches!(field.to_re(&mut ctx), Err(Error::MissingData(_))));
}
