use super::{check_reserved, is_wildcard, Attached};
use crate::backend::Backend;
use crate::error::Error;
use std::collections::BTreeSet;

/// A field restricted to a fixed list of literals, e.g. HTTP verbs or
/// the tenants of a platform.  The value `*` stands for every
/// literal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnumRe {
    values: Vec<String>,
    data: Attached<String>,
}

impl EnumRe {
    /// # Errors
    ///
    /// Fails with `InvalidCharacter` if a value contains the
    /// separator, and with `InvalidStructure` if a value is repeated.
    pub fn new<I, S>(values: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let mut seen = BTreeSet::new();
        for value in &values {
            check_reserved(value, value)?;
            if !seen.insert(value.as_str()) {
                return Err(Error::InvalidStructure(format!(
                    "enum value {:?} is listed twice",
                    value
                )));
            }
        }

        Ok(Self {
            values,
            data: Attached::Unset,
        })
    }

    /// Returns the allowed literals, in declared order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Attaches `value`, replacing any previous one.  The value is
    /// only validated by `to_re`.
    pub fn set_data(&mut self, value: &str) {
        self.data = Attached::Set(value.to_owned());
    }

    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.data.get().map(String::as_str)
    }

    /// Returns the union of all literals.
    pub fn universe<B: Backend>(&self, backend: &mut B) -> B::Re {
        let literals = self
            .values
            .iter()
            .map(|value| backend.re_literal(value))
            .collect();
        backend.re_union(literals)
    }

    /// Compiles the attached value.
    pub fn to_re<B: Backend>(&self, backend: &mut B) -> Result<B::Re, Error> {
        let value = self.data.require("enum field")?;
        self.to_re_value(backend, value)
    }

    /// Compiles `value`: `*` yields the whole universe, a listed
    /// literal yields itself.
    pub fn to_re_value<B: Backend>(&self, backend: &mut B, value: &str) -> Result<B::Re, Error> {
        if is_wildcard(value) {
            return Ok(self.universe(backend));
        }

        if !self.values.iter().any(|allowed| allowed == value) {
            return Err(Error::invalid_value(
                value,
                format!("allowed values are {:?}", self.values),
            ));
        }

        Ok(backend.re_literal(value))
    }
}

#[cfg(test)]
fn verbs() -> EnumRe {
    EnumRe::new(vec!["GET", "POST", "PUT", "DELETE"]).expect("valid enum")
}

#[test]
fn test_rejects_reserved() {
    assert!(matches!(
        EnumRe::new(vec!["ok", "not.ok"]),
        Err(Error::InvalidCharacter { character: '.', .. })
    ));
}

#[test]
fn test_rejects_duplicates() {
    assert!(matches!(
        EnumRe::new(vec!["a", "b", "a"]),
        Err(Error::InvalidStructure(_))
    ));
}

#[test]
fn test_literal_value() {
    let mut ctx = regsat::Context::new();
    let mut verbs = verbs();
    verbs.set_data("GET");

    let re = verbs.to_re(&mut ctx).expect("valid value");
    assert!(ctx.matches(re, "GET"));
    assert!(!ctx.matches(re, "PUT"));
    assert!(!ctx.matches(re, ""));
}

#[test]
fn test_wildcard_value() {
    let mut ctx = regsat::Context::new();
    let verbs = verbs();

    let re = verbs.to_re_value(&mut ctx, "*").expect("wildcard");
    for verb in verbs.values() {
        assert!(ctx.matches(re, verb));
    }
    assert!(!ctx.matches(re, "HEAD"));
    assert!(!ctx.matches(re, "*"));
}

#[test]
fn test_invalid_values() {
    let mut ctx = regsat::Context::new();
    let mut verbs = verbs();

    assert!(matches!(verbs.to_re(&mut ctx), Err(Error::MissingData(_))));

    verbs.set_data("HEAD");
    assert!(matches!(
        verbs.to_re(&mut ctx),
        Err(Error::InvalidValue { .. })
    ));

    // Only an isolated wildcard is special.
    verbs.set_data("GE*");
    assert!(matches!(
        verbs.to_re(&mut ctx),
        Err(Error::InvalidValue { .. })
    ));

    // set_data replaces the previous value.
    verbs.set_data("PUT");
    assert!(verbs.to_re(&mut ctx).is_ok());
}
