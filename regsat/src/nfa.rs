//! Thompson construction for regex terms.
//!
//! The string theory only ever needs to run these automata forward
//! on sets of states, so we never determinise them eagerly: the
//! product search in `theory` performs an on-the-fly subset
//! construction instead.
use crate::term::{Regex, RegexNode};
use std::collections::BTreeSet;

/// A set of NFA states, closed under epsilon transitions.
pub type StateSet = BTreeSet<usize>;

#[derive(Clone, Debug, Default)]
struct State {
    epsilon: Vec<usize>,
    on_char: Vec<(char, usize)>,
}

/// A nondeterministic automaton with a single start and a single
/// accepting state.
#[derive(Clone, Debug)]
pub struct Nfa {
    states: Vec<State>,
    start: usize,
    accept: usize,
}

impl Nfa {
    /// Compiles `root`, whose nodes live in `nodes`.
    pub fn build(nodes: &[RegexNode], root: Regex) -> Self {
        let mut nfa = Self {
            states: Vec::new(),
            start: 0,
            accept: 0,
        };

        let (start, accept) = nfa.fragment(nodes, root);
        nfa.start = start;
        nfa.accept = accept;
        nfa
    }

    fn add_state(&mut self) -> usize {
        self.states.push(State::default());
        self.states.len() - 1
    }

    fn add_epsilon(&mut self, from: usize, to: usize) {
        self.states[from].epsilon.push(to);
    }

    /// Returns the `(entry, exit)` pair of a fresh sub-automaton for
    /// `re`.
    fn fragment(&mut self, nodes: &[RegexNode], re: Regex) -> (usize, usize) {
        match &nodes[re.index()] {
            RegexNode::Literal(text) => {
                let start = self.add_state();
                let mut current = start;
                for ch in text.chars() {
                    let next = self.add_state();
                    self.states[current].on_char.push((ch, next));
                    current = next;
                }

                (start, current)
            }
            RegexNode::Union(alternatives) => {
                // With no alternative, `exit` is unreachable: the
                // empty language.
                let entry = self.add_state();
                let exit = self.add_state();
                for alternative in alternatives {
                    let (from, to) = self.fragment(nodes, *alternative);
                    self.add_epsilon(entry, from);
                    self.add_epsilon(to, exit);
                }

                (entry, exit)
            }
            RegexNode::Concat(parts) => {
                let entry = self.add_state();
                let mut current = entry;
                for part in parts {
                    let (from, to) = self.fragment(nodes, *part);
                    self.add_epsilon(current, from);
                    current = to;
                }

                (entry, current)
            }
            RegexNode::Star(inner) => {
                let entry = self.add_state();
                let exit = self.add_state();
                let (from, to) = self.fragment(nodes, *inner);
                self.add_epsilon(entry, from);
                self.add_epsilon(entry, exit);
                self.add_epsilon(to, from);
                self.add_epsilon(to, exit);

                (entry, exit)
            }
        }
    }

    /// Inserts every character that labels a transition into `dst`.
    pub fn collect_alphabet(&self, dst: &mut BTreeSet<char>) {
        for state in &self.states {
            dst.extend(state.on_char.iter().map(|(ch, _)| *ch));
        }
    }

    /// Returns the epsilon closure of the start state.
    pub fn initial(&self) -> StateSet {
        let mut set = StateSet::new();
        set.insert(self.start);
        self.close(set)
    }

    /// Returns the closed set of states reachable from `set` by
    /// reading `ch`.
    pub fn step(&self, set: &StateSet, ch: char) -> StateSet {
        let moved = set
            .iter()
            .flat_map(|state| self.states[*state].on_char.iter())
            .filter(|(label, _)| *label == ch)
            .map(|(_, target)| *target)
            .collect();

        self.close(moved)
    }

    /// Returns true iff `set` contains the accepting state.
    #[inline]
    pub fn is_accepting(&self, set: &StateSet) -> bool {
        set.contains(&self.accept)
    }

    /// Returns true iff `input` is in the language of `self`.
    pub fn matches(&self, input: &str) -> bool {
        let mut current = self.initial();
        for ch in input.chars() {
            if current.is_empty() {
                return false;
            }

            current = self.step(&current, ch);
        }

        self.is_accepting(&current)
    }

    fn close(&self, mut set: StateSet) -> StateSet {
        let mut stack: Vec<usize> = set.iter().copied().collect();
        while let Some(state) = stack.pop() {
            for next in &self.states[state].epsilon {
                if set.insert(*next) {
                    stack.push(*next);
                }
            }
        }

        set
    }
}

#[cfg(test)]
fn build_for_test(nodes: Vec<RegexNode>) -> Nfa {
    let root = Regex(crate::term::next_id(nodes.len() - 1));
    Nfa::build(&nodes, root)
}

#[test]
fn test_literal() {
    let nfa = build_for_test(vec![RegexNode::Literal("abc".into())]);

    assert!(nfa.matches("abc"));
    assert!(!nfa.matches("ab"));
    assert!(!nfa.matches("abcd"));
    assert!(!nfa.matches(""));
}

#[test]
fn test_empty_union() {
    // The empty union rejects everything, even the empty string.
    let nfa = build_for_test(vec![RegexNode::Union(vec![])]);

    assert!(!nfa.matches(""));
    assert!(!nfa.matches("a"));
}

#[test]
fn test_star_of_union() {
    // (a|b)*c
    let nfa = build_for_test(vec![
        RegexNode::Literal("a".into()),
        RegexNode::Literal("b".into()),
        RegexNode::Union(vec![Regex(0), Regex(1)]),
        RegexNode::Star(Regex(2)),
        RegexNode::Literal("c".into()),
        RegexNode::Concat(vec![Regex(3), Regex(4)]),
    ]);

    assert!(nfa.matches("c"));
    assert!(nfa.matches("abbac"));
    assert!(!nfa.matches("abba"));
    assert!(!nfa.matches("cc"));

    let mut alphabet = BTreeSet::new();
    nfa.collect_alphabet(&mut alphabet);
    assert_eq!(alphabet.into_iter().collect::<String>(), "abc");
}
