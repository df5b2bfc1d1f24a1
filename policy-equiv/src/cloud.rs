//! A ready-made policy shape for cloud services: who (`principal`)
//! may do what (`action`) on which `resource`.
//!
//! Principals are `site.tenant.username` and resources are
//! `site.tenant.service.path`, e.g. `tacc.dev.testuser1` and
//! `tacc.dev.files./sys1/*`.
//!
//! ```
//! # use policy_equiv::cloud::CloudPolicyManager;
//! # use policy_equiv::PolicyEquivalenceChecker;
//! let manager = CloudPolicyManager::default();
//! let p = vec![manager
//!     .policy_from_strs("tacc.dev.testuser1", "tacc.dev.systems./sys1", "GET", "allow")
//!     .unwrap()];
//! let q = vec![manager
//!     .policy_from_strs("tacc.dev.testuser1", "tacc.dev.systems./sys1", "*", "allow")
//!     .unwrap()];
//! let mut checker = PolicyEquivalenceChecker::new(regsat::Context::new(), p, q).unwrap();
//! assert!(checker.p_implies_q().is_proved());
//! assert!(checker.q_implies_p().counterexample().is_some());
//! ```
use crate::decision::Decision;
use crate::error::Error;
use crate::field::{FieldDescriptor, FieldType};
use crate::policy::{FieldValue, Policy};
use crate::re::{CharSet, EnumRe, TupleRe, SEPARATOR};

/// Characters allowed in user names.
pub const ALPHANUM_SET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// Characters allowed in resource paths.
pub const PATH_CHAR_SET: &str = "abcdefghijklmnopqrstuvwxyz0123456789_/";

/// HTTP verbs a policy can grant or deny.
pub const ACTIONS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];

pub const DEFAULT_SITES: [&str; 2] = ["tacc", "uh"];
pub const DEFAULT_TENANTS: [&str; 5] = ["admin", "cii", "dev", "a2cps", "tacc"];
pub const DEFAULT_SERVICES: [&str; 5] = ["actors", "apps", "files", "jobs", "systems"];

/// Builds cloud policies for one platform's sites, tenants and
/// services.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CloudPolicyManager {
    sites: Vec<String>,
    tenants: Vec<String>,
    services: Vec<String>,
}

impl Default for CloudPolicyManager {
    fn default() -> Self {
        Self {
            sites: owned(&DEFAULT_SITES),
            tenants: owned(&DEFAULT_TENANTS),
            services: owned(&DEFAULT_SERVICES),
        }
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

impl CloudPolicyManager {
    /// Empty lists fall back to the defaults.
    #[must_use]
    pub fn new(sites: Vec<String>, tenants: Vec<String>, services: Vec<String>) -> Self {
        let defaults = Self::default();
        let or_default = |values: Vec<String>, default: Vec<String>| {
            if values.is_empty() {
                default
            } else {
                values
            }
        };

        Self {
            sites: or_default(sites, defaults.sites),
            tenants: or_default(tenants, defaults.tenants),
            services: or_default(services, defaults.services),
        }
    }

    #[must_use]
    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    #[must_use]
    pub fn tenants(&self) -> &[String] {
        &self.tenants
    }

    #[must_use]
    pub fn services(&self) -> &[String] {
        &self.services
    }

    fn principal_fields(&self) -> Result<Vec<FieldDescriptor>, Error> {
        Ok(vec![
            enum_descriptor("site", &self.sites),
            enum_descriptor("tenant", &self.tenants),
            FieldDescriptor::charset_string("username", CharSet::from_chars(ALPHANUM_SET)?),
        ])
    }

    fn resource_fields(&self) -> Result<Vec<FieldDescriptor>, Error> {
        Ok(vec![
            enum_descriptor("site", &self.sites),
            enum_descriptor("tenant", &self.tenants),
            enum_descriptor("service", &self.services),
            FieldDescriptor::charset_string("path", CharSet::from_chars(PATH_CHAR_SET)?),
        ])
    }

    /// Returns the shape of every policy this manager builds.
    pub fn descriptors(&self) -> Result<Vec<FieldDescriptor>, Error> {
        Ok(vec![
            FieldDescriptor::tuple("principal", self.principal_fields()?),
            FieldDescriptor::tuple("resource", self.resource_fields()?),
            FieldDescriptor::enumeration("action", &ACTIONS),
            FieldDescriptor::decision("decision"),
        ])
    }

    /// Parses a policy such as
    /// `("tacc.dev.testuser1", "tacc.dev.files./sys1/*", "GET", "allow")`.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidValue` unless `principal` has exactly two
    /// separators and `resource` exactly three, or if `decision` is
    /// neither `allow` nor `deny`.  Values outside their universes are
    /// reported when a checker compiles the policy.
    pub fn policy_from_strs(
        &self,
        principal: &str,
        resource: &str,
        action: &str,
        decision: &str,
    ) -> Result<Policy, Error> {
        let principal = parse_tuple(self.principal_fields()?, "principal", principal)?;
        let resource = parse_tuple(self.resource_fields()?, "resource", resource)?;

        let mut action_field = EnumRe::new(ACTIONS.iter().copied())?;
        action_field.set_data(action);

        let decision = Decision::new(decision)?;
        Policy::new(
            &self.descriptors()?,
            vec![
                ("principal", FieldValue::from(principal)),
                ("resource", resource.into()),
                ("action", action_field.into()),
                ("decision", decision.into()),
            ],
        )
    }
}

fn enum_descriptor(name: &str, values: &[String]) -> FieldDescriptor {
    FieldDescriptor::new(name, FieldType::Enum(values.to_vec()))
}

/// Splits `literal` on the separator and attaches one part per field.
fn parse_tuple(fields: Vec<FieldDescriptor>, what: &str, literal: &str) -> Result<TupleRe, Error> {
    let expected = fields.len().saturating_sub(1);
    let found = literal.matches(SEPARATOR).count();
    if found != expected {
        return Err(Error::invalid_value(
            literal,
            format!(
                "{} should contain exactly {} dot characters; got {}",
                what, expected, found
            ),
        ));
    }

    let names: Vec<String> = fields.iter().map(|field| field.name.clone()).collect();
    let mut tuple = TupleRe::new(fields)?;
    tuple.set_data(
        names
            .iter()
            .map(String::as_str)
            .zip(literal.split(SEPARATOR)),
    )?;
    Ok(tuple)
}

#[test]
fn test_defaults() {
    let manager = CloudPolicyManager::new(vec![], vec!["dev".into()], vec![]);
    assert_eq!(manager.sites(), &["tacc", "uh"][..]);
    assert_eq!(manager.tenants(), &["dev"][..]);
    assert_eq!(manager.services().len(), 5);
}

#[test]
fn test_policy_from_strs() {
    let manager = CloudPolicyManager::default();
    let policy = manager
        .policy_from_strs("tacc.dev.testuser1", "tacc.dev.files./sys1/*", "GET", "allow")
        .expect("valid policy");

    assert_eq!(policy.decision(), Decision::Allow);
    assert_eq!(
        policy
            .fields()
            .iter()
            .map(|field| field.name.as_str())
            .collect::<Vec<_>>(),
        vec!["principal", "resource", "action"]
    );

    let mut ctx = regsat::Context::new();
    let resource = policy
        .value("resource")
        .expect("resource field")
        .to_re(&mut ctx)
        .expect("valid values");
    assert!(ctx.matches(resource, "tacc.dev.files./sys1/some/path/on/sys1"));
    assert!(!ctx.matches(resource, "tacc.dev.files./sys2/a"));
}

#[test]
fn test_separator_count() {
    let manager = CloudPolicyManager::default();
    assert!(matches!(
        manager.policy_from_strs("tacc.dev", "tacc.dev.files./a", "GET", "allow"),
        Err(Error::InvalidValue { .. })
    ));
    assert!(matches!(
        manager.policy_from_strs("tacc.dev.a.b", "tacc.dev.files./a", "GET", "allow"),
        Err(Error::InvalidValue { .. })
    ));
    assert!(matches!(
        manager.policy_from_strs("tacc.dev.a", "tacc.dev.files", "GET", "allow"),
        Err(Error::InvalidValue { .. })
    ));
    assert!(matches!(
        manager.policy_from_strs("tacc.dev.a", "tacc.dev.files./a", "GET", "permit"),
        Err(Error::InvalidValue { .. })
    ));
}
