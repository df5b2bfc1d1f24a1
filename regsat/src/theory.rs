//! The string theory: given membership literals `x ∈ R` and `x ∉ R`
//! on a single string variable, either find a string that satisfies
//! all of them, or report that they conflict.
//!
//! We explore the product of the literals' automata breadth-first,
//! determinising on the fly.  The product is finite, so the search
//! always terminates, and the first accepting product state yields a
//! shortest witness.
use super::budget::{Clock, UnknownReason};
use super::nfa::{Nfa, StateSet};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// How many product states we expand between two budget checks.
const POLL_INTERVAL: usize = 1024;

/// The result of a consistency check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Consistency {
    Witness(String),
    Conflict,
    Interrupted(UnknownReason),
}

/// A membership literal: `positive` literals require a match, the
/// others forbid one.
#[derive(Clone, Copy, Debug)]
pub struct MembershipLiteral<'a> {
    pub nfa: &'a Nfa,
    pub positive: bool,
}

struct ProductNode {
    states: Vec<StateSet>,
    parent: Option<(usize, char)>,
}

/// Returns a character outside `alphabet`.  Strings only constrained
/// by negative literals may need one.
fn fresh_char(alphabet: &BTreeSet<char>) -> Option<char> {
    (0x21u32..=0x10FFFF)
        .filter_map(std::char::from_u32)
        .find(|ch| !alphabet.contains(ch))
}

/// Decides whether `literals` are simultaneously satisfiable.
pub(crate) fn find_witness(literals: &[MembershipLiteral<'_>], clock: &Clock) -> Consistency {
    let mut alphabet = BTreeSet::new();
    for literal in literals {
        literal.nfa.collect_alphabet(&mut alphabet);
    }

    if let Some(extra) = fresh_char(&alphabet) {
        alphabet.insert(extra);
    }

    let accepting = |states: &[StateSet]| {
        literals
            .iter()
            .zip(states)
            .all(|(literal, set)| literal.nfa.is_accepting(set) == literal.positive)
    };
    // Once a positive literal's automaton is stuck, no extension can
    // satisfy it.
    let dead = |states: &[StateSet]| {
        literals
            .iter()
            .zip(states)
            .any(|(literal, set)| literal.positive && set.is_empty())
    };

    let initial: Vec<StateSet> = literals.iter().map(|literal| literal.nfa.initial()).collect();
    let mut nodes = vec![ProductNode {
        states: initial.clone(),
        parent: None,
    }];
    let mut seen: HashSet<Vec<StateSet>> = HashSet::new();
    seen.insert(initial);
    let mut queue = VecDeque::new();
    queue.push_back(0usize);

    let mut expanded = 0usize;
    while let Some(current) = queue.pop_front() {
        if accepting(&nodes[current].states) {
            return Consistency::Witness(reconstruct(&nodes, current));
        }

        if dead(&nodes[current].states) {
            continue;
        }

        expanded += 1;
        if expanded % POLL_INTERVAL == 0 {
            if let Some(reason) = clock.interrupted() {
                return Consistency::Interrupted(reason);
            }
        }

        for ch in &alphabet {
            let next: Vec<StateSet> = literals
                .iter()
                .zip(&nodes[current].states)
                .map(|(literal, set)| literal.nfa.step(set, *ch))
                .collect();

            if seen.insert(next.clone()) {
                nodes.push(ProductNode {
                    states: next,
                    parent: Some((current, *ch)),
                });
                queue.push_back(nodes.len() - 1);
            }
        }
    }

    Consistency::Conflict
}

/// Spells out the path from the initial product state to `node`.
fn reconstruct(nodes: &[ProductNode], mut node: usize) -> String {
    let mut reversed = Vec::new();
    while let Some((parent, ch)) = nodes[node].parent {
        reversed.push(ch);
        node = parent;
    }

    reversed.into_iter().rev().collect()
}

#[cfg(test)]
fn literal_nfa(text: &str) -> Nfa {
    use crate::term::{Regex, RegexNode};

    Nfa::build(&[RegexNode::Literal(text.into())], Regex(0))
}

#[cfg(test)]
fn prefix_nfa(prefix: &str, chars: &str) -> Nfa {
    use crate::term::{Regex, RegexNode};

    // prefix (c1|c2|...)*
    let mut nodes = vec![RegexNode::Literal(prefix.into())];
    let mut alternatives = Vec::new();
    for ch in chars.chars() {
        nodes.push(RegexNode::Literal(ch.to_string()));
        alternatives.push(Regex(crate::term::next_id(nodes.len() - 1)));
    }
    nodes.push(RegexNode::Union(alternatives));
    nodes.push(RegexNode::Star(Regex(crate::term::next_id(nodes.len() - 1))));
    nodes.push(RegexNode::Concat(vec![
        Regex(0),
        Regex(crate::term::next_id(nodes.len() - 1)),
    ]));

    Nfa::build(&nodes, Regex(crate::term::next_id(nodes.len() - 1)))
}

#[cfg(test)]
fn positive(nfa: &Nfa) -> MembershipLiteral<'_> {
    MembershipLiteral {
        nfa,
        positive: true,
    }
}

#[cfg(test)]
fn negative(nfa: &Nfa) -> MembershipLiteral<'_> {
    MembershipLiteral {
        nfa,
        positive: false,
    }
}

#[test]
fn test_no_literals() {
    let clock = crate::Budget::unlimited().start();

    assert_eq!(find_witness(&[], &clock), Consistency::Witness("".into()));
}

#[test]
fn test_single_literal() {
    let clock = crate::Budget::unlimited().start();
    let get = literal_nfa("GET");

    assert_eq!(
        find_witness(&[positive(&get)], &clock),
        Consistency::Witness("GET".into())
    );
}

#[test]
fn test_distinct_literals_conflict() {
    let clock = crate::Budget::unlimited().start();
    let get = literal_nfa("GET");
    let put = literal_nfa("PUT");

    assert_eq!(
        find_witness(&[positive(&get), positive(&put)], &clock),
        Consistency::Conflict
    );
}

#[test]
fn test_prefix_minus_literal() {
    // "ab" (a|b)* but not "ab": the shortest witness is "aba".
    let clock = crate::Budget::unlimited().start();
    let prefix = prefix_nfa("ab", "ab");
    let exact = literal_nfa("ab");

    assert_eq!(
        find_witness(&[positive(&prefix), negative(&exact)], &clock),
        Consistency::Witness("aba".into())
    );
    assert_eq!(
        find_witness(&[positive(&exact), negative(&prefix)], &clock),
        Consistency::Conflict
    );
}

#[test]
fn test_negative_only_needs_fresh_char() {
    // Everything over {a} is excluded, so the witness must use
    // another character.
    let clock = crate::Budget::unlimited().start();
    let all_a = prefix_nfa("", "a");

    match find_witness(&[negative(&all_a)], &clock) {
        Consistency::Witness(witness) => assert!(!all_a.matches(&witness)),
        other => panic!("unexpected {:?}", other),
    }
}
