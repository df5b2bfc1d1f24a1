//! `regsat` decides boolean combinations of regular membership
//! constraints `x ∈ R` over free string variables.
//!
//! A `Context` owns the term graph: regex terms built from literals,
//! unions, concatenations and Kleene stars, named string variables,
//! and boolean formulas over membership atoms.  `Context::check`
//! hands the boolean skeleton to CryptoMiniSat and refines it lazily
//! against the string theory until it finds a model with one witness
//! string per variable, proves that there is none, or runs out of
//! budget.
mod backend;
mod budget;
mod gadgets;
mod nfa;
mod solver_state;
mod term;
mod theory;

pub use budget::{Budget, CancelFlag, UnknownReason};
pub use term::{Regex, StrVar, Term};

use nfa::Nfa;
use std::collections::{BTreeMap, HashMap};
use term::{next_id, RegexNode, TermNode};

/// The result of a satisfiability check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Sat(Model),
    Unsat,
    Unknown(UnknownReason),
}

/// One witness string for every variable in the `Context`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Model {
    values: BTreeMap<StrVar, String>,
}

impl Model {
    fn new(values: BTreeMap<StrVar, String>) -> Self {
        Self { values }
    }

    /// Returns the value assigned to `var`.
    #[must_use]
    pub fn value(&self, var: StrVar) -> Option<&str> {
        self.values.get(&var).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StrVar, &str)> + '_ {
        self.values.iter().map(|(var, value)| (*var, value.as_str()))
    }
}

/// A term graph, and the entry point for satisfiability checks.
#[derive(Clone, Debug, Default)]
pub struct Context {
    regexes: Vec<RegexNode>,
    regex_ids: HashMap<RegexNode, Regex>,
    terms: Vec<TermNode>,
    term_ids: HashMap<TermNode, Term>,
    vars: Vec<String>,
    var_ids: HashMap<String, StrVar>,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the regex that matches exactly `value`.
    pub fn literal(&mut self, value: &str) -> Regex {
        self.intern_regex(RegexNode::Literal(value.to_owned()))
    }

    /// Returns the union of `alternatives`; the empty union matches
    /// nothing.
    pub fn union(&mut self, alternatives: Vec<Regex>) -> Regex {
        match alternatives.as_slice() {
            [single] => *single,
            _ => self.intern_regex(RegexNode::Union(alternatives)),
        }
    }

    /// Returns the concatenation of `parts`; the empty concatenation
    /// matches only the empty string.
    pub fn concat(&mut self, parts: Vec<Regex>) -> Regex {
        match parts.as_slice() {
            [single] => *single,
            _ => self.intern_regex(RegexNode::Concat(parts)),
        }
    }

    /// Returns the Kleene star of `inner`.
    pub fn star(&mut self, inner: Regex) -> Regex {
        self.intern_regex(RegexNode::Star(inner))
    }

    /// Returns the string variable called `name`, creating it on
    /// first use.
    pub fn string_var(&mut self, name: &str) -> StrVar {
        if let Some(var) = self.var_ids.get(name) {
            return *var;
        }

        let var = StrVar(next_id(self.vars.len()));
        self.vars.push(name.to_owned());
        self.var_ids.insert(name.to_owned(), var);
        tracing::trace!(name, "new string variable");
        var
    }

    /// Returns the name `var` was created with.
    #[must_use]
    pub fn var_name(&self, var: StrVar) -> &str {
        &self.vars[var.index()]
    }

    /// Iterates over all string variables, in creation order.
    pub fn vars(&self) -> impl Iterator<Item = StrVar> {
        (0..self.vars.len()).map(|index| StrVar(next_id(index)))
    }

    /// Returns the atom "`var` is in the language of `regex`".
    pub fn member(&mut self, var: StrVar, regex: Regex) -> Term {
        self.intern_term(TermNode::Member(var, regex))
    }

    pub fn constant(&mut self, value: bool) -> Term {
        self.intern_term(TermNode::Constant(value))
    }

    /// Returns the conjunction of `children`; the empty conjunction
    /// is true.
    pub fn and(&mut self, children: Vec<Term>) -> Term {
        match children.as_slice() {
            [single] => *single,
            _ => self.intern_term(TermNode::And(children)),
        }
    }

    /// Returns the disjunction of `children`; the empty disjunction
    /// is false.
    pub fn or(&mut self, children: Vec<Term>) -> Term {
        match children.as_slice() {
            [single] => *single,
            _ => self.intern_term(TermNode::Or(children)),
        }
    }

    pub fn not(&mut self, inner: Term) -> Term {
        self.intern_term(TermNode::Not(inner))
    }

    pub fn implies(&mut self, lhs: Term, rhs: Term) -> Term {
        self.intern_term(TermNode::Implies(lhs, rhs))
    }

    /// Decides whether `assertion` is satisfiable within `budget`.
    ///
    /// Checks never modify the term graph, so they may be repeated.
    #[must_use]
    pub fn check(&self, assertion: Term, budget: &Budget) -> Outcome {
        backend::Impl::new(self).check(assertion, budget)
    }

    /// Returns true iff `input` is in the language of `regex`.
    #[must_use]
    pub fn matches(&self, regex: Regex, input: &str) -> bool {
        Nfa::build(&self.regexes, regex).matches(input)
    }

    pub(crate) fn regex_nodes(&self) -> &[RegexNode] {
        &self.regexes
    }

    pub(crate) fn term_node(&self, term: Term) -> &TermNode {
        &self.terms[term.index()]
    }

    fn intern_regex(&mut self, node: RegexNode) -> Regex {
        if let Some(id) = self.regex_ids.get(&node) {
            return *id;
        }

        let id = Regex(next_id(self.regexes.len()));
        self.regexes.push(node.clone());
        self.regex_ids.insert(node, id);
        id
    }

    fn intern_term(&mut self, node: TermNode) -> Term {
        if let Some(id) = self.term_ids.get(&node) {
            return *id;
        }

        let id = Term(next_id(self.terms.len()));
        self.terms.push(node.clone());
        self.term_ids.insert(node, id);
        id
    }
}

#[cfg(test)]
fn any_of(ctx: &mut Context, chars: &str) -> Regex {
    let alternatives = chars.chars().map(|ch| ctx.literal(&ch.to_string())).collect();
    let class = ctx.union(alternatives);
    ctx.star(class)
}

#[test]
fn test_hash_consing() {
    let mut ctx = Context::new();

    let get = ctx.literal("GET");
    assert_eq!(ctx.literal("GET"), get);

    let x = ctx.string_var("x");
    assert_eq!(ctx.string_var("x"), x);
    assert_ne!(ctx.string_var("y"), x);
    assert_eq!(ctx.var_name(x), "x");
    assert_eq!(ctx.member(x, get), ctx.member(x, get));
}

#[test]
fn test_matches() {
    let mut ctx = Context::new();

    let prefix = ctx.literal("/sys");
    let rest = any_of(&mut ctx, "abc/");
    let path = ctx.concat(vec![prefix, rest]);

    assert!(ctx.matches(path, "/sys"));
    assert!(ctx.matches(path, "/sys/abc"));
    assert!(!ctx.matches(path, "/sy"));
    assert!(!ctx.matches(path, "/sys/d"));
}

#[test]
fn test_sat_with_witness() {
    let mut ctx = Context::new();

    let x = ctx.string_var("x");
    let get = ctx.literal("GET");
    let put = ctx.literal("PUT");
    let verbs = ctx.union(vec![get, put]);
    let in_verbs = ctx.member(x, verbs);
    let in_get = ctx.member(x, get);
    let not_get = ctx.not(in_get);
    let assertion = ctx.and(vec![in_verbs, not_get]);

    match ctx.check(assertion, &Budget::unlimited()) {
        Outcome::Sat(model) => assert_eq!(model.value(x), Some("PUT")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unsat_implication() {
    // x ∈ "/sys" [abc/]* implies x ∈ "/" [abcsy/]*, so the negation
    // of the implication has no model.
    let mut ctx = Context::new();

    let x = ctx.string_var("x");
    let narrow_prefix = ctx.literal("/sys");
    let narrow_rest = any_of(&mut ctx, "abc/");
    let narrow = ctx.concat(vec![narrow_prefix, narrow_rest]);
    let wide_prefix = ctx.literal("/");
    let wide_rest = any_of(&mut ctx, "abcsy/");
    let wide = ctx.concat(vec![wide_prefix, wide_rest]);

    let in_narrow = ctx.member(x, narrow);
    let in_wide = ctx.member(x, wide);
    let implication = ctx.implies(in_narrow, in_wide);
    let negated = ctx.not(implication);
    assert_eq!(ctx.check(negated, &Budget::unlimited()), Outcome::Unsat);

    // The converse fails.
    let converse = ctx.implies(in_wide, in_narrow);
    let negated = ctx.not(converse);
    match ctx.check(negated, &Budget::unlimited()) {
        Outcome::Sat(model) => {
            let value = model.value(x).expect("has value");
            assert!(ctx.matches(wide, value));
            assert!(!ctx.matches(narrow, value));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_constants() {
    let mut ctx = Context::new();

    let yes = ctx.constant(true);
    let no = ctx.constant(false);
    assert!(matches!(ctx.check(yes, &Budget::unlimited()), Outcome::Sat(_)));
    assert_eq!(ctx.check(no, &Budget::unlimited()), Outcome::Unsat);

    let empty_or = ctx.or(vec![]);
    assert_eq!(ctx.check(empty_or, &Budget::unlimited()), Outcome::Unsat);
    let empty_and = ctx.and(vec![]);
    assert!(matches!(
        ctx.check(empty_and, &Budget::unlimited()),
        Outcome::Sat(_)
    ));
}

#[test]
fn test_variables_are_independent() {
    // x and y may take different values even under the same regex.
    let mut ctx = Context::new();

    let x = ctx.string_var("x");
    let y = ctx.string_var("y");
    let a = ctx.literal("a");
    let b = ctx.literal("b");
    let either = ctx.union(vec![a, b]);
    let x_in = ctx.member(x, either);
    let y_in = ctx.member(y, either);
    let x_a = ctx.member(x, a);
    let y_a = ctx.member(y, a);
    let not_y_a = ctx.not(y_a);
    let assertion = ctx.and(vec![x_in, y_in, x_a, not_y_a]);

    match ctx.check(assertion, &Budget::unlimited()) {
        Outcome::Sat(model) => {
            assert_eq!(model.value(x), Some("a"));
            assert_eq!(model.value(y), Some("b"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_cancelled_check() {
    let mut ctx = Context::new();

    let x = ctx.string_var("x");
    let a = ctx.literal("a");
    let assertion = ctx.member(x, a);

    let flag = CancelFlag::new();
    flag.cancel();
    assert_eq!(
        ctx.check(assertion, &Budget::unlimited().with_cancel(flag)),
        Outcome::Unknown(UnknownReason::Cancelled)
    );
}
