use super::{check_reserved, Attached, ReField, SEPARATOR};
use crate::backend::Backend;
use crate::error::Error;
use crate::field::{FieldDescriptor, FieldType};
use std::collections::{BTreeMap, BTreeSet};

/// A field made of named sub-fields, e.g. a principal
/// `site.tenant.username`.  It matches the concatenation of its
/// sub-fields' languages, in declared order, separated by `.`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TupleRe {
    fields: Vec<(String, ReField)>,
    data: Attached<BTreeMap<String, String>>,
}

impl TupleRe {
    /// Builds one sub-field instance per descriptor.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidStructure` on empty or duplicate names, and
    /// on sub-fields that are neither enums nor charset strings.
    pub fn new(descriptors: Vec<FieldDescriptor>) -> Result<Self, Error> {
        let mut names = BTreeSet::new();
        let mut fields = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if descriptor.name.is_empty() {
                return Err(Error::InvalidStructure("tuple field with an empty name".into()));
            }

            check_reserved(&descriptor.name, "a tuple field name")?;
            if !names.insert(descriptor.name.clone()) {
                return Err(Error::InvalidStructure(format!(
                    "duplicate tuple field {}",
                    descriptor.name
                )));
            }

            match descriptor.field_type {
                FieldType::Enum(_) | FieldType::CharsetString(_) => {}
                ref other => {
                    return Err(Error::InvalidStructure(format!(
                        "tuple field {} must be an enum or a charset string; got {}",
                        descriptor.name,
                        other.kind_name()
                    )))
                }
            }

            let instance = ReField::instantiate(&descriptor.field_type)?;
            fields.push((descriptor.name, instance));
        }

        Ok(Self {
            fields,
            data: Attached::Unset,
        })
    }

    /// Returns the sub-field names, in declared order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the descriptors this tuple was built from.
    #[must_use]
    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        self.fields
            .iter()
            .map(|(name, field)| FieldDescriptor::new(name, field.field_type()))
            .collect()
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.data.is_set()
    }

    /// Returns the value attached to sub-field `name`.
    #[must_use]
    pub fn data(&self, name: &str) -> Option<&str> {
        self.data.get()?.get(name).map(String::as_str)
    }

    /// Attaches one value per sub-field, replacing any previous
    /// values.  Values are only validated by `to_re`.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidStructure` unless the names in `values` are
    /// exactly the declared sub-field names, each given once.
    pub fn set_data<'a, I>(&mut self, values: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut data = BTreeMap::new();
        for (name, value) in values {
            if !self.fields.iter().any(|(declared, _)| declared == name) {
                return Err(Error::InvalidStructure(format!(
                    "unexpected argument {} to set_data; fields are {:?}",
                    name,
                    self.field_names().collect::<Vec<_>>()
                )));
            }

            if data.insert(name.to_owned(), value.to_owned()).is_some() {
                return Err(Error::InvalidStructure(format!(
                    "argument {} supplied twice to set_data",
                    name
                )));
            }
        }

        if let Some(missing) = self.field_names().find(|name| !data.contains_key(*name)) {
            return Err(Error::InvalidStructure(format!(
                "required field {} missing in call to set_data",
                missing
            )));
        }

        for (name, field) in &mut self.fields {
            let value = &data[name.as_str()];
            match field {
                ReField::Enum(inner) => inner.set_data(value),
                ReField::CharsetString(inner) => inner.set_data(value),
                ReField::Tuple(_) => {
                    return Err(Error::InvalidStructure(format!(
                        "nested tuple field {}",
                        name
                    )))
                }
            }
        }

        self.data = Attached::Set(data);
        Ok(())
    }

    /// Compiles the attached values: each sub-field's regex, in
    /// declared order, with a literal `.` between consecutive ones.
    pub fn to_re<B: Backend>(&self, backend: &mut B) -> Result<B::Re, Error> {
        self.data.require("tuple field")?;

        let mut parts = Vec::with_capacity(2 * self.fields.len());
        for (index, (_, field)) in self.fields.iter().enumerate() {
            if index > 0 {
                parts.push(backend.re_literal(SEPARATOR.encode_utf8(&mut [0; 4])));
            }

            parts.push(field.to_re(backend)?);
        }

        Ok(backend.re_concat(parts))
    }
}

#[cfg(test)]
fn endpoint() -> TupleRe {
    use crate::re::CharSet;

    TupleRe::new(vec![
        FieldDescriptor::enumeration("verb", &["GET", "POST", "PUT", "DELETE"]),
        FieldDescriptor::charset_string(
            "url_path",
            CharSet::from_chars("abcdefghijklmnopqrstuvwxyz0123456789_/").expect("valid"),
        ),
    ])
    .expect("valid tuple")
}

#[test]
fn test_literals() {
    let mut ctx = regsat::Context::new();
    let mut tuple = endpoint();
    tuple
        .set_data(vec![("url_path", "/sprokets/123"), ("verb", "GET")])
        .expect("valid data");

    let re = tuple.to_re(&mut ctx).expect("valid values");
    // Order follows the declaration, not the set_data arguments.
    assert!(ctx.matches(re, "GET./sprokets/123"));
    assert!(!ctx.matches(re, "/sprokets/123.GET"));
    assert!(!ctx.matches(re, "POST./sprokets/123"));
    assert!(!ctx.matches(re, "GET./sprokets/12"));
    assert!(!ctx.matches(re, "GET./sprokets/123."));
}

#[test]
fn test_wildcards() {
    let mut ctx = regsat::Context::new();
    let mut tuple = endpoint();
    tuple
        .set_data(vec![("url_path", "/sprokets*"), ("verb", "*")])
        .expect("valid data");

    let re = tuple.to_re(&mut ctx).expect("valid values");
    assert!(ctx.matches(re, "GET./sprokets/123"));
    assert!(ctx.matches(re, "POST./sprokets"));
    assert!(ctx.matches(re, "PUT./sprokets/1234/details"));
    assert!(!ctx.matches(re, "GET./sprok"));
    assert!(!ctx.matches(re, "HEAD./sprokets"));
}

#[test]
fn test_set_data_structure() {
    let mut tuple = endpoint();

    assert!(matches!(
        tuple.set_data(vec![("verb", "GET")]),
        Err(Error::InvalidStructure(_))
    ));
    assert!(matches!(
        tuple.set_data(vec![("verb", "GET"), ("url_path", "/a"), ("host", "x")]),
        Err(Error::InvalidStructure(_))
    ));
    assert!(!tuple.is_attached());

    let mut ctx = regsat::Context::new();
    assert!(matches!(tuple.to_re(&mut ctx), Err(Error::MissingData(_))));
}

#[test]
fn test_set_data_duplicate_name() {
    let mut tuple = endpoint();
    tuple
        .set_data(vec![("verb", "GET"), ("url_path", "/a")])
        .expect("valid data");

    assert!(matches!(
        tuple.set_data(vec![("verb", "GET"), ("url_path", "/a"), ("verb", "PUT")]),
        Err(Error::InvalidStructure(_))
    ));
    // The earlier values stay attached.
    assert_eq!(tuple.data("verb"), Some("GET"));
    assert_eq!(tuple.data("url_path"), Some("/a"));
}

#[test]
fn test_invalid_value_surfaces_at_to_re() {
    let mut ctx = regsat::Context::new();
    let mut tuple = endpoint();
    tuple
        .set_data(vec![("verb", "HEAD"), ("url_path", "/a")])
        .expect("structurally valid");

    assert!(matches!(
        tuple.to_re(&mut ctx),
        Err(Error::InvalidValue { .. })
    ));
}

#[test]
fn test_structure_errors() {
    assert!(matches!(
        TupleRe::new(vec![
            FieldDescriptor::enumeration("a", &["x"]),
            FieldDescriptor::enumeration("a", &["y"]),
        ]),
        Err(Error::InvalidStructure(_))
    ));
    assert!(matches!(
        TupleRe::new(vec![FieldDescriptor::decision("d")]),
        Err(Error::InvalidStructure(_))
    ));
    assert!(matches!(
        TupleRe::new(vec![FieldDescriptor::tuple("t", vec![])]),
        Err(Error::InvalidStructure(_))
    ));
}
