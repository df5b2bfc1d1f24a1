use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The effect of a policy.  Not a regex type: it only selects which
/// half of a policy set the policy joins.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    /// Parses `"allow"` or `"deny"`.
    pub fn new(value: &str) -> Result<Self, Error> {
        value.parse()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
        }
    }
}

impl FromStr for Decision {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        match value {
            "allow" => Ok(Decision::Allow),
            "deny" => Ok(Decision::Deny),
            _ => Err(Error::invalid_value(
                value,
                "a decision must be \"allow\" or \"deny\"",
            )),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[test]
fn test_parse() {
    assert_eq!(Decision::new("allow"), Ok(Decision::Allow));
    assert_eq!(Decision::new("deny"), Ok(Decision::Deny));
    assert!(matches!(
        Decision::new("Allow"),
        Err(Error::InvalidValue { .. })
    ));
    assert!(matches!(Decision::new(""), Err(Error::InvalidValue { .. })));
}

#[test]
fn test_serde() {
    assert_eq!(
        serde_json::to_string(&Decision::Deny).expect("serializable"),
        "\"deny\""
    );
    assert_eq!(
        serde_json::from_str::<Decision>("\"allow\"").expect("valid"),
        Decision::Allow
    );
}
