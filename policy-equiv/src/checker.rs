//! Decides implication and equivalence between two policy sets.
//!
//! A policy set denotes a predicate over one free string variable per
//! field: some allow rule matches and, if there are deny rules, not
//! all of them match.  `P ⇒ Q` holds iff `¬(P ⇒ Q)` is unsatisfiable;
//! otherwise the backend's model is a counterexample.
use crate::backend::{Backend, SatOutcome};
use crate::budget::CancelFlag;
use crate::config::{CheckerConfig, EmptyAllowPolicy};
use crate::decision::Decision;
use crate::error::Error;
use crate::field::FieldDescriptor;
use crate::outcome::{Counterexample, EquivalenceReport, ProofOutcome};
use crate::policy::Policy;
#[cfg(test)]
use crate::policy::FieldValue;
use std::collections::BTreeMap;

pub struct PolicyEquivalenceChecker<B: Backend> {
    backend: B,
    config: CheckerConfig,
    cancel: CancelFlag,
    fields: Vec<FieldDescriptor>,
    /// Field name to free variable, shared by both sets.
    vars: BTreeMap<String, B::Var>,
    p: Vec<Policy>,
    q: Vec<Policy>,
    predicate_p: B::Bool,
    predicate_q: B::Bool,
}

impl<B: Backend> PolicyEquivalenceChecker<B> {
    /// Builds a checker with the default configuration.
    pub fn new(backend: B, p: Vec<Policy>, q: Vec<Policy>) -> Result<Self, Error> {
        Self::with_config(backend, p, q, CheckerConfig::default())
    }

    /// Builds both set predicates in `backend`.
    ///
    /// # Errors
    ///
    /// Fails with `MismatchedPolicyType` unless every policy has the
    /// same shape, and with `InvalidPolicyStructure` if a set has no
    /// allow rule and `config` rejects that.
    pub fn with_config(
        mut backend: B,
        p: Vec<Policy>,
        q: Vec<Policy>,
        config: CheckerConfig,
    ) -> Result<Self, Error> {
        let fields = common_shape(p.iter().chain(q.iter()))?;

        let mut vars = BTreeMap::new();
        let predicate_p = set_predicate(&mut backend, &mut vars, &p, "P", &config)?;
        let predicate_q = set_predicate(&mut backend, &mut vars, &q, "Q", &config)?;
        tracing::debug!(
            fields = fields.len(),
            p = p.len(),
            q = q.len(),
            "built policy set predicates"
        );

        Ok(Self {
            backend,
            config,
            cancel: CancelFlag::new(),
            fields,
            vars,
            p,
            q,
            predicate_p,
            predicate_q,
        })
    }

    /// Replaces the cancellation flag watched by later proofs.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns a handle that cancels proofs.  A proof notices the flag
    /// between refinement rounds and while searching for string
    /// witnesses, not inside a single SAT solve, so a cancelled proof
    /// may still run until the current solve returns.  Proofs started
    /// after cancellation are inconclusive at once.
    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    #[must_use]
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Returns the shared field descriptors; empty if both sets are.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub fn p(&self) -> &[Policy] {
        &self.p
    }

    #[must_use]
    pub fn q(&self) -> &[Policy] {
        &self.q
    }

    #[must_use]
    pub fn predicate_p(&self) -> &B::Bool {
        &self.predicate_p
    }

    #[must_use]
    pub fn predicate_q(&self) -> &B::Bool {
        &self.predicate_q
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Decides whether `lhs ⇒ rhs` holds for every field assignment.
    pub fn prove(&mut self, lhs: &B::Bool, rhs: &B::Bool) -> ProofOutcome {
        let implication = self.backend.implies(lhs, rhs);
        let refutation = self.backend.not(&implication);
        let budget = self.config.budget().with_cancel(self.cancel.clone());

        match self.backend.check_sat(&refutation, &budget) {
            SatOutcome::Unsat => ProofOutcome::Proved,
            SatOutcome::Sat(model) => {
                let values = self
                    .vars
                    .iter()
                    .map(|(name, var)| {
                        let value = self.backend.model_value(&model, var).unwrap_or_default();
                        (name.clone(), value)
                    })
                    .collect();
                ProofOutcome::Counterexample(Counterexample::new(values))
            }
            SatOutcome::Unknown(reason) => {
                tracing::warn!(%reason, "implication proof is inconclusive");
                ProofOutcome::Inconclusive(reason)
            }
        }
    }

    pub fn p_implies_q(&mut self) -> ProofOutcome {
        let (lhs, rhs) = (self.predicate_p.clone(), self.predicate_q.clone());
        let outcome = self.prove(&lhs, &rhs);
        tracing::info!(%outcome, "P => Q");
        outcome
    }

    pub fn q_implies_p(&mut self) -> ProofOutcome {
        let (lhs, rhs) = (self.predicate_q.clone(), self.predicate_p.clone());
        let outcome = self.prove(&lhs, &rhs);
        tracing::info!(%outcome, "Q => P");
        outcome
    }

    /// Proves both directions.
    pub fn equivalence(&mut self) -> EquivalenceReport {
        EquivalenceReport {
            p_implies_q: self.p_implies_q(),
            q_implies_p: self.q_implies_p(),
        }
    }
}

/// Returns the non-decision fields shared by all `policies`.
fn common_shape<'a>(
    mut policies: impl Iterator<Item = &'a Policy>,
) -> Result<Vec<FieldDescriptor>, Error> {
    let first = match policies.next() {
        Some(first) => first,
        None => return Ok(Vec::new()),
    };

    for policy in policies {
        if !policy.same_shape(first) {
            return Err(Error::MismatchedPolicyType(format!(
                "expected fields {:?}, got {:?}",
                names(first.fields()),
                names(policy.fields())
            )));
        }
    }

    Ok(first.fields().to_vec())
}

fn names(fields: &[FieldDescriptor]) -> Vec<&str> {
    fields.iter().map(|field| field.name.as_str()).collect()
}

/// Returns the free variable for field `name`, allocating it on first
/// use.
fn field_var<B: Backend>(
    backend: &mut B,
    vars: &mut BTreeMap<String, B::Var>,
    name: &str,
) -> B::Var {
    if let Some(var) = vars.get(name) {
        return var.clone();
    }

    let var = backend.string_var(name);
    tracing::debug!(field = name, "allocated free variable");
    vars.insert(name.to_owned(), var.clone());
    var
}

/// Returns the conjunction of "field var matches the policy's value"
/// over every field of `policy`.
fn match_predicate<B: Backend>(
    backend: &mut B,
    vars: &mut BTreeMap<String, B::Var>,
    policy: &Policy,
) -> Result<B::Bool, Error> {
    let mut terms = Vec::with_capacity(policy.fields().len());
    for (name, field) in policy.re_fields() {
        let var = field_var(backend, vars, name);
        terms.push(field.bool_term(backend, &var)?);
    }

    Ok(backend.and(terms))
}

fn set_predicate<B: Backend>(
    backend: &mut B,
    vars: &mut BTreeMap<String, B::Var>,
    policies: &[Policy],
    label: &str,
    config: &CheckerConfig,
) -> Result<B::Bool, Error> {
    let mut allow = Vec::new();
    let mut deny = Vec::new();
    for policy in policies {
        let term = match_predicate(backend, vars, policy)?;
        match policy.decision() {
            Decision::Allow => allow.push(term),
            Decision::Deny => deny.push(term),
        }
    }

    tracing::debug!(
        set = label,
        allow = allow.len(),
        deny = deny.len(),
        "combining policy set"
    );

    let allow_or = if allow.is_empty() {
        match config.empty_allow {
            EmptyAllowPolicy::Reject => {
                return Err(Error::InvalidPolicyStructure(format!(
                    "policy set {} has no allow rule",
                    label
                )))
            }
            EmptyAllowPolicy::False => {
                tracing::warn!(set = label, "policy set has no allow rule and allows nothing");
                backend.constant(false)
            }
        }
    } else {
        backend.or(allow)
    };

    if deny.is_empty() {
        return Ok(allow_or);
    }

    let all_deny = backend.and(deny);
    let not_denied = backend.not(&all_deny);
    Ok(backend.and(vec![allow_or, not_denied]))
}

#[cfg(test)]
fn verb_policies(rules: &[(&str, Decision)]) -> Vec<Policy> {
    use crate::re::EnumRe;

    let shape = vec![
        FieldDescriptor::enumeration("verb", &["GET", "PUT", "POST"]),
        FieldDescriptor::decision("decision"),
    ];
    rules
        .iter()
        .map(|(verb, decision)| {
            let mut field = EnumRe::new(vec!["GET", "PUT", "POST"]).expect("valid enum");
            field.set_data(verb);
            Policy::new(
                &shape,
                vec![
                    ("verb", FieldValue::from(field)),
                    ("decision", (*decision).into()),
                ],
            )
            .expect("valid policy")
        })
        .collect()
}

#[test]
fn test_allow_subset() {
    let p = verb_policies(&[("GET", Decision::Allow)]);
    let q = verb_policies(&[("*", Decision::Allow)]);
    let mut checker =
        PolicyEquivalenceChecker::new(regsat::Context::new(), p, q).expect("same shape");

    assert_eq!(checker.p_implies_q(), ProofOutcome::Proved);
    match checker.q_implies_p() {
        ProofOutcome::Counterexample(cex) => {
            assert_eq!(cex.len(), 1);
            assert!(matches!(cex.get("verb"), Some("PUT") | Some("POST")));
        }
        other => panic!("unexpected {:?}", other),
    }

    // Repeated proofs give the same answer.
    assert_eq!(checker.p_implies_q(), ProofOutcome::Proved);
}

#[test]
fn test_deny_rules() {
    // A single deny rule carves its match out of the allow rules.
    let p = verb_policies(&[("*", Decision::Allow), ("PUT", Decision::Deny)]);
    let q = verb_policies(&[("GET", Decision::Allow), ("POST", Decision::Allow)]);
    let mut checker =
        PolicyEquivalenceChecker::new(regsat::Context::new(), p, q).expect("same shape");
    assert!(checker.equivalence().is_equivalent());
}

#[test]
fn test_deny_rules_conjoin() {
    // Several deny rules only restrict where all of them match.
    let p = verb_policies(&[
        ("*", Decision::Allow),
        ("PUT", Decision::Deny),
        ("POST", Decision::Deny),
    ]);
    let q = verb_policies(&[("*", Decision::Allow)]);
    let mut checker =
        PolicyEquivalenceChecker::new(regsat::Context::new(), p, q).expect("same shape");
    assert!(checker.equivalence().is_equivalent());
}

#[test]
fn test_empty_allow() {
    let p = verb_policies(&[("GET", Decision::Deny)]);
    let q = verb_policies(&[("GET", Decision::Allow)]);

    let mut checker = PolicyEquivalenceChecker::new(regsat::Context::new(), p.clone(), q.clone())
        .expect("same shape");
    assert_eq!(checker.p_implies_q(), ProofOutcome::Proved);
    assert!(checker.q_implies_p().counterexample().is_some());

    let config = CheckerConfig::default().with_empty_allow(EmptyAllowPolicy::Reject);
    assert!(matches!(
        PolicyEquivalenceChecker::with_config(regsat::Context::new(), p, q, config),
        Err(Error::InvalidPolicyStructure(_))
    ));
}

#[test]
fn test_shared_variables() {
    let p = verb_policies(&[("GET", Decision::Allow)]);
    let q = verb_policies(&[("PUT", Decision::Allow)]);
    let checker = PolicyEquivalenceChecker::new(regsat::Context::new(), p, q).expect("same shape");

    assert_eq!(checker.vars.len(), 1);
    assert_eq!(checker.backend().vars().count(), 1);
}

#[test]
fn test_mismatched_shapes() {
    use crate::re::EnumRe;

    let shape = vec![
        FieldDescriptor::enumeration("action", &["GET"]),
        FieldDescriptor::decision("decision"),
    ];
    let mut field = EnumRe::new(vec!["GET"]).expect("valid enum");
    field.set_data("GET");
    let other = Policy::new(
        &shape,
        vec![
            ("action", FieldValue::from(field)),
            ("decision", Decision::Allow.into()),
        ],
    )
    .expect("valid policy");

    assert!(matches!(
        PolicyEquivalenceChecker::new(
            regsat::Context::new(),
            verb_policies(&[("GET", Decision::Allow)]),
            vec![other],
        ),
        Err(Error::MismatchedPolicyType(_))
    ));
}

#[test]
fn test_cancelled() {
    let p = verb_policies(&[("GET", Decision::Allow)]);
    let q = verb_policies(&[("*", Decision::Allow)]);
    let mut checker =
        PolicyEquivalenceChecker::new(regsat::Context::new(), p, q).expect("same shape");

    checker.cancel_flag().cancel();
    assert!(checker.p_implies_q().is_inconclusive());
}

#[test]
fn test_zero_timeout() {
    let config = CheckerConfig::from_json(r#"{"timeout_ms": 0}"#).expect("valid config");
    let p = verb_policies(&[("GET", Decision::Allow)]);
    let q = verb_policies(&[("*", Decision::Allow)]);
    let mut checker = PolicyEquivalenceChecker::with_config(regsat::Context::new(), p, q, config)
        .expect("same shape");

    let expired = ProofOutcome::Inconclusive("time budget exhausted".into());
    assert_eq!(checker.p_implies_q(), expired);
    assert_eq!(checker.q_implies_p(), expired);
    // The budget restarts with each proof, and stays exhausted.
    assert_eq!(checker.p_implies_q(), expired);
}
