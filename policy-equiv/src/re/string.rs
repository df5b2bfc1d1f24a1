use super::{Attached, CharSet, WILDCARD};
use crate::backend::Backend;
use crate::error::Error;
use crate::wildcard;

/// A field holding any string over a character set, e.g. a user name
/// or a path.  Values may embed `*` wildcards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CharsetStringRe {
    charset: CharSet,
    data: Attached<String>,
}

impl CharsetStringRe {
    /// `CharSet` already excludes the separator, so this cannot fail.
    #[must_use]
    pub fn new(charset: CharSet) -> Self {
        Self {
            charset,
            data: Attached::Unset,
        }
    }

    /// Convenience constructor from the characters of `chars`.
    pub fn from_chars(chars: &str) -> Result<Self, Error> {
        Ok(Self::new(CharSet::from_chars(chars)?))
    }

    #[must_use]
    pub fn charset(&self) -> &CharSet {
        &self.charset
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

    /// Returns `C*`.
    pub fn universe<B: Backend>(&self, backend: &mut B) -> B::Re {
        wildcard::any_of(backend, &self.charset)
    }

    /// Compiles the attached value.
    pub fn to_re<B: Backend>(&self, backend: &mut B) -> Result<B::Re, Error> {
        let value = self.data.require("charset string field")?;
        self.to_re_value(backend, value)
    }

    /// Compiles `value`, which may only use charset characters and `*`.
    pub fn to_re_value<B: Backend>(&self, backend: &mut B, value: &str) -> Result<B::Re, Error> {
        if let Some(bad) = value
            .chars()
            .find(|ch| *ch != WILDCARD && !self.charset.contains(*ch))
        {
            return Err(Error::invalid_value(
                value,
                format!("character {:?} is outside the field's character set", bad),
            ));
        }

        Ok(wildcard::compile(backend, value, &self.charset))
    }
}

#[cfg(test)]
const ALPHANUM: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

#[test]
fn test_literal() {
    let mut ctx = regsat::Context::new();
    let mut field = CharsetStringRe::from_chars(ALPHANUM).expect("valid");
    field.set_data("foobar");

    let re = field.to_re(&mut ctx).expect("valid value");
    assert!(ctx.matches(re, "foobar"));
    assert!(!ctx.matches(re, "fooba"));
    assert!(!ctx.matches(re, "oobar"));
    assert!(!ctx.matches(re, "foobr"));
}

#[test]
fn test_trailing_wildcard() {
    let mut ctx = regsat::Context::new();
    let mut field = CharsetStringRe::from_chars(ALPHANUM).expect("valid");
    field.set_data("foo*");

    let re = field.to_re(&mut ctx).expect("valid value");
    assert!(ctx.matches(re, "foo"));
    assert!(ctx.matches(re, "foobar"));
    assert!(ctx.matches(re, "foo12345aaaaaaaaaaa"));
    assert!(!ctx.matches(re, "fobo"));
    assert!(!ctx.matches(re, "oobar"));
    assert!(!ctx.matches(re, "fo0"));
}

#[test]
fn test_invalid() {
    let mut ctx = regsat::Context::new();
    let mut field = CharsetStringRe::from_chars(ALPHANUM).expect("valid");

    assert!(matches!(field.to_re(&mut ctx), Err(Error::MissingData(_))));

    field.set_data("not_valid/");
    assert!(matches!(
        field.to_re(&mut ctx),
        Err(Error::InvalidValue { .. })
    ));

    assert!(matches!(
        CharsetStringRe::from_chars("ab."),
        Err(Error::InvalidCharacter { .. })
    ));
}
