//! Property tests: compiled wildcard values accept exactly the strings
//! a plain glob matcher accepts, and proofs agree with membership.

use proptest::prelude::*;

use policy_equiv::wildcard;
use policy_equiv::{
    CharSet, CharsetStringRe, Decision, FieldDescriptor, FieldValue, Policy,
    PolicyEquivalenceChecker, ProofOutcome,
};

const CHARS: &str = "ab/";

/// Reference matcher: `*` matches any run of charset characters.
fn glob_matches(pattern: &[char], input: &[char]) -> bool {
    match pattern.split_first() {
        None => input.is_empty(),
        Some((&'*', rest)) => (0..=input.len()).any(|skip| glob_matches(rest, &input[skip..])),
        Some((expected, rest)) => match input.split_first() {
            Some((actual, remaining)) => actual == expected && glob_matches(rest, remaining),
            None => false,
        },
    }
}

fn glob(pattern: &str, input: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let input: Vec<char> = input.chars().collect();
    glob_matches(&pattern, &input)
}

fn charset() -> CharSet {
    CharSet::from_chars(CHARS).expect("valid charset")
}

fn policy(value: &str) -> Policy {
    let shape = vec![
        FieldDescriptor::charset_string("path", charset()),
        FieldDescriptor::decision("decision"),
    ];
    let mut path = CharsetStringRe::new(charset());
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

// ──────────────────────────────────────────────
// Strategies
// ──────────────────────────────────────────────

fn arb_pattern() -> impl Strategy<Value = String> {
    "[ab/*]{0,6}"
}

fn arb_input() -> impl Strategy<Value = String> {
    "[ab/]{0,8}"
}

/// A pattern together with a string it accepts, built by filling each
/// wildcard with a random run.
fn arb_pattern_and_instance() -> impl Strategy<Value = (String, String)> {
    (arb_pattern(), prop::collection::vec("[ab/]{0,3}", 6)).prop_map(|(pattern, fills)| {
        let mut fills = fills.into_iter();
        let instance = pattern
            .chars()
            .map(|ch| {
                if ch == '*' {
                    fills.next().unwrap_or_default()
                } else {
                    ch.to_string()
                }
            })
            .collect();
        (pattern, instance)
    })
}

proptest! {
    #[test]
    fn compile_agrees_with_glob(pattern in arb_pattern(), input in arb_input()) {
        let mut ctx = regsat::Context::new();
        let re = wildcard::compile(&mut ctx, &pattern, &charset());
        prop_assert_eq!(ctx.matches(re, &input), glob(&pattern, &input));
    }

    #[test]
    fn compile_accepts_instances((pattern, instance) in arb_pattern_and_instance()) {
        let mut ctx = regsat::Context::new();
        let re = wildcard::compile(&mut ctx, &pattern, &charset());
        prop_assert!(ctx.matches(re, &instance));
    }

    #[test]
    fn literal_denotes_itself(literal in arb_input(), input in arb_input()) {
        let mut ctx = regsat::Context::new();
        let re = wildcard::compile(&mut ctx, &literal, &charset());
        prop_assert_eq!(ctx.matches(re, &input), literal == input);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn proofs_are_sound(lhs in arb_pattern(), rhs in arb_pattern(), input in arb_input()) {
        let mut checker =
            PolicyEquivalenceChecker::new(regsat::Context::new(), vec![policy(&lhs)], vec![policy(&rhs)])
                .expect("valid policy sets");

        match checker.p_implies_q() {
            ProofOutcome::Proved => {
                prop_assert!(!glob(&lhs, &input) || glob(&rhs, &input));
            }
            ProofOutcome::Counterexample(cex) => {
                let value = cex.get("path").expect("path value");
                prop_assert!(value.chars().all(|ch| CHARS.contains(ch)));
                prop_assert!(glob(&lhs, value));
                prop_assert!(!glob(&rhs, value));
            }
            ProofOutcome::Inconclusive(reason) => {
                prop_assert!(false, "unbounded proof gave up: {}", reason);
            }
        }
    }
}
