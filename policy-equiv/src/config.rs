use crate::budget::ProofBudget;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::time::Duration;

/// What a checker does with a policy set that has no allow rule.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyAllowPolicy {
    /// The set allows nothing.
    False,
    /// Construction fails with `InvalidPolicyStructure`.
    Reject,
}

impl Default for EmptyAllowPolicy {
    fn default() -> Self {
        EmptyAllowPolicy::False
    }
}

/// Knobs for `PolicyEquivalenceChecker`.
///
/// ```
/// # use policy_equiv::{CheckerConfig, EmptyAllowPolicy};
/// let config = CheckerConfig::from_json(r#"{"timeout_ms": 2500}"#).unwrap();
/// assert_eq!(config.timeout_ms, Some(2500));
/// assert_eq!(config.empty_allow, EmptyAllowPolicy::False);
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    /// Wall-clock budget for each proof; none means unbounded.
    pub timeout_ms: Option<u64>,
    pub empty_allow: EmptyAllowPolicy,
}

impl CheckerConfig {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Sets the per-proof budget, saturating at `u64::MAX` milliseconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn with_empty_allow(mut self, empty_allow: EmptyAllowPolicy) -> Self {
        self.empty_allow = empty_allow;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Returns a fresh budget for one proof.
    #[must_use]
    pub(crate) fn budget(&self) -> ProofBudget {
        match self.timeout() {
            Some(timeout) => ProofBudget::unlimited().with_max_time(timeout),
            None => ProofBudget::unlimited(),
        }
    }
}

#[test]
fn test_defaults() {
    let config = CheckerConfig::from_json("{}").expect("valid config");
    assert_eq!(config, CheckerConfig::default());
    assert_eq!(config.timeout(), None);
    assert_eq!(config.budget().max_time(), None);
}

#[test]
fn test_from_json() {
    let config = CheckerConfig::from_json(r#"{"timeout_ms": 100, "empty_allow": "reject"}"#)
        .expect("valid config");
    assert_eq!(config.timeout(), Some(Duration::from_millis(100)));
    assert_eq!(config.empty_allow, EmptyAllowPolicy::Reject);
    assert_eq!(config.budget().max_time(), Some(Duration::from_millis(100)));

    assert!(matches!(
        CheckerConfig::from_json(r#"{"timeout": 100}"#),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        CheckerConfig::from_json(r#"{"empty_allow": "maybe"}"#),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_round_trip() {
    let config = CheckerConfig::default()
        .with_timeout(Duration::from_secs(3))
        .with_empty_allow(EmptyAllowPolicy::Reject);
    let json = serde_json::to_string(&config).expect("serializable");
    assert_eq!(CheckerConfig::from_json(&json), Ok(config));
}

#[test]
fn test_huge_timeout() {
    let config = CheckerConfig::default().with_timeout(Duration::from_secs(u64::MAX));
    assert_eq!(config.timeout_ms, Some(u64::MAX));

    let config = CheckerConfig::default().with_timeout(Duration::from_millis(u64::MAX));
    assert_eq!(config.timeout_ms, Some(u64::MAX));
}
