use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A concrete value for every field, allowed by one policy set and
/// not by the other.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Counterexample(BTreeMap<String, String>);

impl Counterexample {
    #[must_use]
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Iterates over `(field, value)` in field name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// The result of one implication proof.  None of these is an error.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ProofOutcome {
    /// The implication holds for every assignment of the fields.
    Proved,
    Counterexample(Counterexample),
    /// The backend gave up, e.g. on timeout; the reason is for humans.
    Inconclusive(String),
}

impl ProofOutcome {
    #[must_use]
    pub fn is_proved(&self) -> bool {
        matches!(self, ProofOutcome::Proved)
    }

    #[must_use]
    pub fn counterexample(&self) -> Option<&Counterexample> {
        match self {
            ProofOutcome::Counterexample(cex) => Some(cex),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_inconclusive(&self) -> bool {
        matches!(self, ProofOutcome::Inconclusive(_))
    }
}

/// Both directions of an equivalence proof.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct EquivalenceReport {
    pub p_implies_q: ProofOutcome,
    pub q_implies_p: ProofOutcome,
}

impl EquivalenceReport {
    /// Returns true iff both implications were proved.
    #[must_use]
    pub fn is_equivalent(&self) -> bool {
        self.p_implies_q.is_proved() && self.q_implies_p.is_proved()
    }
}

macro_rules! display_as_json {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                    f.write_str(&json)
                }
            }
        )*
    };
}

display_as_json!(Counterexample, ProofOutcome, EquivalenceReport);

#[cfg(test)]
fn sample() -> Counterexample {
    let mut values = BTreeMap::new();
    values.insert("action".to_owned(), "PUT".to_owned());
    values.insert("principal".to_owned(), "tacc.dev.a".to_owned());
    Counterexample::new(values)
}

#[test]
fn test_display() {
    assert_eq!(
        sample().to_string(),
        r#"{"action":"PUT","principal":"tacc.dev.a"}"#
    );
    assert_eq!(ProofOutcome::Proved.to_string(), r#"{"outcome":"proved"}"#);
    assert_eq!(
        ProofOutcome::Counterexample(sample()).to_string(),
        r#"{"outcome":"counterexample","detail":{"action":"PUT","principal":"tacc.dev.a"}}"#
    );
    assert_eq!(
        ProofOutcome::Inconclusive("timed out".into()).to_string(),
        r#"{"outcome":"inconclusive","detail":"timed out"}"#
    );
}

#[test]
fn test_report() {
    let report = EquivalenceReport {
        p_implies_q: ProofOutcome::Proved,
        q_implies_p: ProofOutcome::Counterexample(sample()),
    };
    assert!(!report.is_equivalent());
    assert_eq!(
        report.q_implies_p.counterexample().and_then(|cex| cex.get("action")),
        Some("PUT")
    );

    let report = EquivalenceReport {
        p_implies_q: ProofOutcome::Proved,
        q_implies_p: ProofOutcome::Proved,
    };
    assert!(report.is_equivalent());
}
