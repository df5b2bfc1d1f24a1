use policy_equiv::cloud::CloudPolicyManager;
use policy_equiv::{
    CancelFlag, CheckerConfig, Error, Policy, PolicyEquivalenceChecker, ProofOutcome,
};

fn policy(principal: &str, resource: &str, action: &str, decision: &str) -> Policy {
    CloudPolicyManager::default()
        .policy_from_strs(principal, resource, action, decision)
        .expect("valid policy")
}

fn checker(p: Vec<Policy>, q: Vec<Policy>) -> PolicyEquivalenceChecker<regsat::Context> {
    PolicyEquivalenceChecker::new(regsat::Context::new(), p, q).expect("valid policy sets")
}

#[test]
fn any_action_vs_get() {
    let p = vec![policy("tacc.dev.testuser1", "tacc.dev.systems./sys1", "*", "allow")];
    let q = vec![policy("tacc.dev.testuser1", "tacc.dev.systems./sys1", "GET", "allow")];
    let mut checker = checker(p, q);

    let outcome = checker.p_implies_q();
    let cex = outcome.counterexample().expect("counterexample");
    assert!(matches!(cex.get("action"), Some("PUT") | Some("POST") | Some("DELETE")));
    assert_eq!(cex.get("principal"), Some("tacc.dev.testuser1"));
    assert_eq!(cex.get("resource"), Some("tacc.dev.systems./sys1"));

    assert_eq!(checker.q_implies_p(), ProofOutcome::Proved);
}

#[test]
fn permissive_set_with_denies() {
    let p = vec![
        policy("tacc.dev.testuser1", "tacc.dev.systems./sys1", "*", "allow"),
        policy("tacc.dev.testuser1", "tacc.dev.systems./sys2", "*", "deny"),
    ];
    let q = vec![
        policy("tacc.dev.testuser1", "tacc.dev.systems./sys1", "GET", "allow"),
        policy("tacc.dev.testuser1", "tacc.dev.systems./sys2", "GET", "deny"),
    ];
    let mut checker = checker(p, q);

    assert_eq!(checker.q_implies_p(), ProofOutcome::Proved);
    let outcome = checker.p_implies_q();
    let cex = outcome.counterexample().expect("counterexample");
    assert_ne!(cex.get("action"), Some("GET"));
}

#[test]
fn incomparable_sets() {
    let p = vec![
        policy("tacc.dev.testuser1", "tacc.dev.systems./sys1/*", "*", "allow"),
        policy("tacc.dev.testuser1", "tacc.dev.systems./sys2", "*", "deny"),
    ];
    let q = vec![
        policy("tacc.dev.testuser1", "tacc.dev.systems./sys1", "GET", "allow"),
        policy("tacc.dev.testuser1", "tacc.dev.systems./sys2", "GET", "deny"),
    ];

    let report = checker(p, q).equivalence();
    let forward = report.p_implies_q.counterexample().expect("P allows more");
    assert!(forward
        .get("resource")
        .map_or(false, |r| r.starts_with("tacc.dev.systems./sys1/")));

    let backward = report.q_implies_p.counterexample().expect("Q allows more");
    assert_eq!(backward.get("resource"), Some("tacc.dev.systems./sys1"));
    assert_eq!(backward.get("action"), Some("GET"));
}

#[test]
fn narrower_path_prefix() {
    let p = vec![
        policy("tacc.dev.testuser1", "tacc.dev.files./sys1/*", "GET", "allow"),
        policy("tacc.dev.testuser1", "tacc.dev.files./sys2/*", "GET", "deny"),
    ];
    let q = vec![
        policy("tacc.dev.testuser1", "tacc.dev.files./*", "GET", "allow"),
        policy("tacc.dev.testuser1", "tacc.dev.files./sys2/*", "GET", "deny"),
    ];
    let mut checker = checker(p, q);

    assert_eq!(checker.p_implies_q(), ProofOutcome::Proved);
    let outcome = checker.q_implies_p();
    let cex = outcome.counterexample().expect("counterexample");
    let resource = cex.get("resource").expect("resource value");
    assert!(resource.starts_with("tacc.dev.files./"));
    assert!(!resource.starts_with("tacc.dev.files./sys1/"));
    assert!(!resource.starts_with("tacc.dev.files./sys2/"));
}

#[test]
fn username_wildcards() {
    let p = vec![policy("tacc.*.testuser*", "tacc.dev.apps./app1", "GET", "allow")];
    let q = vec![policy("tacc.*.test*", "tacc.dev.apps./app1", "GET", "allow")];
    let mut checker = checker(p, q);

    assert!(checker.p_implies_q().is_proved());
    let outcome = checker.q_implies_p();
    let principal = outcome
        .counterexample()
        .and_then(|cex| cex.get("principal"))
        .expect("counterexample");
    assert!(principal.starts_with("tacc."));
    assert!(!principal.contains(".testuser"));
}

#[test]
fn unknown_site_is_rejected() {
    let p = vec![policy("mars.dev.testuser1", "tacc.dev.apps./app1", "GET", "allow")];
    let q = vec![policy("tacc.dev.testuser1", "tacc.dev.apps./app1", "GET", "allow")];

    let error = PolicyEquivalenceChecker::new(regsat::Context::new(), p, q)
        .err()
        .expect("invalid site");
    assert!(matches!(error, Error::InvalidValue { ref value, .. } if value == "mars"));
}

#[test]
fn configured_checker() {
    let config = CheckerConfig::from_json(r#"{"timeout_ms": 60000}"#).expect("valid config");
    let p = vec![policy("tacc.dev.testuser1", "tacc.dev.jobs./j1", "GET", "allow")];
    let q = vec![policy("tacc.dev.testuser1", "tacc.dev.jobs./j*", "GET", "allow")];
    let cancel = CancelFlag::new();
    let mut checker =
        PolicyEquivalenceChecker::with_config(regsat::Context::new(), p, q, config)
            .expect("valid policy sets")
            .with_cancel_flag(cancel.clone());

    assert!(checker.p_implies_q().is_proved());

    cancel.cancel();
    assert!(checker.q_implies_p().is_inconclusive());
}

#[test]
fn report_serializes() {
    let p = vec![policy("tacc.dev.testuser1", "tacc.dev.apps./app1", "GET", "allow")];
    let q = vec![policy("tacc.dev.testuser1", "tacc.dev.apps./app1", "GET", "allow")];
    let report = checker(p, q).equivalence();

    assert!(report.is_equivalent());
    assert_eq!(
        report.to_string(),
        r#"{"p_implies_q":{"outcome":"proved"},"q_implies_p":{"outcome":"proved"}}"#
    );
}
