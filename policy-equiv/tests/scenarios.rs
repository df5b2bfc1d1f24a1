use policy_equiv::{
    CharSet, CharsetStringRe, Decision, EnumRe, FieldDescriptor, FieldValue, Policy,
    PolicyEquivalenceChecker, ProofOutcome, TupleRe,
};
use policy_equiv::wildcard;

const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

fn checker(p: Vec<Policy>, q: Vec<Policy>) -> PolicyEquivalenceChecker<regsat::Context> {
    PolicyEquivalenceChecker::new(regsat::Context::new(), p, q).expect("valid policy sets")
}

fn digit_policy(value: &str) -> Policy {
    let shape = vec![
        FieldDescriptor::enumeration("digit", &DIGITS),
        FieldDescriptor::decision("decision"),
    ];
    let mut digit = EnumRe::new(DIGITS.iter().copied()).expect("valid enum");
    digit.set_data(value);
    Policy::new(
        &shape,
        vec![
            ("digit", FieldValue::from(digit)),
            ("decision", Decision::Allow.into()),
        ],
    )
    .expect("valid policy")
}

#[test]
fn enum_literals_partition_universe() {
    let p = DIGITS.iter().map(|digit| digit_policy(digit)).collect();
    let q = vec![digit_policy("*")];

    let report = checker(p, q).equivalence();
    assert_eq!(report.p_implies_q, ProofOutcome::Proved);
    assert_eq!(report.q_implies_p, ProofOutcome::Proved);
    assert!(report.is_equivalent());
}

#[test]
fn enum_literals_missing_one() {
    let p = DIGITS[..9].iter().map(|digit| digit_policy(digit)).collect();
    let q = vec![digit_policy("*")];

    let mut checker = checker(p, q);
    assert_eq!(checker.p_implies_q(), ProofOutcome::Proved);
    let outcome = checker.q_implies_p();
    let cex = outcome.counterexample().expect("counterexample");
    assert_eq!(cex.get("digit"), Some("9"));
}

const PATH_CHARS: &str = "abcdefghijklmnopqrstuvwxyz0123456789/_";

fn path_policy(value: &str) -> Policy {
    let charset = CharSet::from_chars(PATH_CHARS).expect("valid charset");
    let shape = vec![
        FieldDescriptor::charset_string("path", charset.clone()),
        FieldDescriptor::decision("decision"),
    ];
    let mut path = CharsetStringRe::new(charset);
    path.set_data(value);
    Policy::new(
        &shape,
        vec![
            ("path", FieldValue::from(path)),
            ("decision", Decision::Allow.into()),
        ],
    )
    .expect("valid policy")
}

#[test]
fn trailing_wildcard_is_weaker() {
    let mut checker = checker(
        vec![path_policy("a1b2c3d4e5/3")],
        vec![path_policy("a1b2c3d4e5/3*")],
    );

    assert_eq!(checker.p_implies_q(), ProofOutcome::Proved);
    let outcome = checker.q_implies_p();
    let value = outcome
        .counterexample()
        .and_then(|cex| cex.get("path"))
        .expect("counterexample")
        .to_owned();
    assert!(value.starts_with("a1b2c3d4e5/3"));
    assert!(value.len() > "a1b2c3d4e5/3".len());
    assert!(value.chars().all(|ch| PATH_CHARS.contains(ch)));
}

#[test]
fn interior_wildcards() {
    let mut checker = checker(
        vec![path_policy("/home/*/docs/*")],
        vec![path_policy("/home/*")],
    );

    assert!(checker.p_implies_q().is_proved());
    let outcome = checker.q_implies_p();
    let value = outcome
        .counterexample()
        .and_then(|cex| cex.get("path"))
        .expect("counterexample");
    let mut ctx = regsat::Context::new();
    let charset = CharSet::from_chars(PATH_CHARS).expect("valid charset");
    let narrow = wildcard::compile(&mut ctx, "/home/*/docs/*", &charset);
    let wide = wildcard::compile(&mut ctx, "/home/*", &charset);
    assert!(ctx.matches(wide, value));
    assert!(!ctx.matches(narrow, value));
}

fn pair_policy(first: &str, second: &str) -> Policy {
    let values = ["0", "1", "2", "3"];
    let fields = vec![
        FieldDescriptor::enumeration("f0", &values),
        FieldDescriptor::enumeration("f1", &values),
    ];
    let shape = vec![
        FieldDescriptor::tuple("pair", fields.clone()),
        FieldDescriptor::decision("decision"),
    ];

    let mut pair = TupleRe::new(fields).expect("valid tuple");
    pair.set_data(vec![("f0", first), ("f1", second)]).expect("valid data");
    Policy::new(
        &shape,
        vec![
            ("pair", FieldValue::from(pair)),
            ("decision", Decision::Allow.into()),
        ],
    )
    .expect("valid policy")
}

#[test]
fn tuple_first_field_partition() {
    let p = ["0", "1", "2", "3"]
        .iter()
        .map(|first| pair_policy(first, "*"))
        .collect();
    let q = vec![pair_policy("*", "*")];

    assert!(checker(p, q).equivalence().is_equivalent());
}

#[test]
fn tuple_counterexample_is_joined() {
    let mut checker = checker(vec![pair_policy("0", "*")], vec![pair_policy("*", "*")]);

    assert!(checker.p_implies_q().is_proved());
    let outcome = checker.q_implies_p();
    let value = outcome
        .counterexample()
        .and_then(|cex| cex.get("pair"))
        .expect("counterexample");
    let parts: Vec<&str> = value.split('.').collect();
    assert_eq!(parts.len(), 2);
    assert_ne!(parts[0], "0");
    assert!(["1", "2", "3"].contains(&parts[0]));
    assert!(["0", "1", "2", "3"].contains(&parts[1]));
}

#[test]
fn invalid_values_fail_checker_construction() {
    let p = vec![digit_policy("10")];
    let q = vec![digit_policy("*")];

    assert!(matches!(
        PolicyEquivalenceChecker::new(regsat::Context::new(), p, q),
        Err(policy_equiv::Error::InvalidValue { .. })
    ));
}

#[test]
fn empty_sets() {
    let report = checker(vec![], vec![]).equivalence();
    assert!(report.is_equivalent());
}
