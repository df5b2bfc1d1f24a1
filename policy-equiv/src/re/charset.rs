use super::SEPARATOR;
use crate::error::Error;
use std::collections::BTreeSet;

/// A set of permitted characters.  Never contains the separator.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CharSet(BTreeSet<char>);

impl CharSet {
    /// # Errors
    ///
    /// Fails with `InvalidCharacter` if `chars` includes the
    /// separator.
    pub fn new<I: IntoIterator<Item = char>>(chars: I) -> Result<Self, Error> {
        let set: BTreeSet<char> = chars.into_iter().collect();
        if set.contains(&SEPARATOR) {
            return Err(Error::InvalidCharacter {
                character: SEPARATOR,
                context: "a character set".into(),
            });
        }

        Ok(Self(set))
    }

    /// Returns the set of characters in `chars`.
    pub fn from_chars(chars: &str) -> Result<Self, Error> {
        Self::new(chars.chars())
    }

    #[must_use]
    pub fn contains(&self, ch: char) -> bool {
        self.0.contains(&ch)
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[test]
fn test_rejects_separator() {
    assert!(matches!(
        CharSet::from_chars("ab.c"),
        Err(Error::InvalidCharacter { character: '.', .. })
    ));
}

#[test]
fn test_dedups() {
    let charset = CharSet::from_chars("abca").expect("valid");

    assert_eq!(charset.len(), 3);
    assert!(charset.contains('c'));
    assert!(!charset.contains('d'));
    assert_eq!(charset.iter().collect::<String>(), "abc");
}
