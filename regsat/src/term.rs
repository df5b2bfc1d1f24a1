//! Handles and nodes for the term graph owned by a `Context`.
//!
//! Every handle is a plain index into one of the `Context`'s arenas.
//! Nodes are hash-consed, so structurally identical terms share the
//! same handle; in particular, two membership atoms on the same
//! variable and the same regex always map to the same SAT variable.

/// A regular expression over strings.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Regex(pub(crate) u32);

/// A free string variable.  There is at most one `StrVar` per name
/// in a given `Context`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StrVar(pub(crate) u32);

/// A boolean formula.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Term(pub(crate) u32);

impl Regex {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl StrVar {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl Term {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) enum RegexNode {
    /// Exactly the string.  The empty string denotes `{""}`.
    Literal(String),
    /// An empty union denotes the empty language.
    Union(Vec<Regex>),
    /// An empty concatenation denotes `{""}`.
    Concat(Vec<Regex>),
    Star(Regex),
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) enum TermNode {
    Constant(bool),
    Member(StrVar, Regex),
    And(Vec<Term>),
    Or(Vec<Term>),
    Not(Term),
    Implies(Term, Term),
}

/// Converts an arena length to the next handle value.
pub(crate) fn next_id(len: usize) -> u32 {
    assert!(len < u32::MAX as usize, "term arena overflow");
    len as u32
}
