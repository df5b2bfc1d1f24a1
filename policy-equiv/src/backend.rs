//! The capability surface the checker needs from a string-constraint
//! solver, and its implementation on top of `regsat`.
//!
//! Term constructors take `&mut self`: backends own their term graph,
//! and free variables are scoped to one backend handle.
use crate::budget::ProofBudget;
use regsat::{Context, Outcome, Regex, StrVar, Term};
use std::fmt::Debug;

/// The answer to a satisfiability query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SatOutcome<M> {
    Sat(M),
    Unsat,
    /// The backend could not decide; the reason is for humans.
    Unknown(String),
}

pub trait Backend {
    type Re: Clone + Debug;
    type Bool: Clone + Debug;
    type Var: Clone + Debug;
    type Model;

    /// Returns the regex matching exactly `value`.
    fn re_literal(&mut self, value: &str) -> Self::Re;

    /// The empty union must denote the empty language.
    fn re_union(&mut self, alternatives: Vec<Self::Re>) -> Self::Re;

    fn re_concat(&mut self, parts: Vec<Self::Re>) -> Self::Re;

    fn re_star(&mut self, inner: Self::Re) -> Self::Re;

    /// Returns the free string variable called `name`.  Repeated calls
    /// with the same name must return the same variable.
    fn string_var(&mut self, name: &str) -> Self::Var;

    /// Returns the boolean term "`var` matches `re`".
    fn in_re(&mut self, var: &Self::Var, re: &Self::Re) -> Self::Bool;

    fn constant(&mut self, value: bool) -> Self::Bool;

    fn and(&mut self, children: Vec<Self::Bool>) -> Self::Bool;

    fn or(&mut self, children: Vec<Self::Bool>) -> Self::Bool;

    fn not(&mut self, inner: &Self::Bool) -> Self::Bool;

    fn implies(&mut self, lhs: &Self::Bool, rhs: &Self::Bool) -> Self::Bool;

    /// Decides whether `assertion` is satisfiable within `budget`.
    fn check_sat(
        &mut self,
        assertion: &Self::Bool,
        budget: &ProofBudget,
    ) -> SatOutcome<Self::Model>;

    /// Returns the value `model` assigns to `var`.
    fn model_value(&self, model: &Self::Model, var: &Self::Var) -> Option<String>;
}

impl Backend for Context {
    type Re = Regex;
    type Bool = Term;
    type Var = StrVar;
    type Model = regsat::Model;

    fn re_literal(&mut self, value: &str) -> Regex {
        self.literal(value)
    }

    fn re_union(&mut self, alternatives: Vec<Regex>) -> Regex {
        self.union(alternatives)
    }

    fn re_concat(&mut self, parts: Vec<Regex>) -> Regex {
        self.concat(parts)
    }

    fn re_star(&mut self, inner: Regex) -> Regex {
        self.star(inner)
    }

    fn string_var(&mut self, name: &str) -> StrVar {
        Context::string_var(self, name)
    }

    fn in_re(&mut self, var: &StrVar, re: &Regex) -> Term {
        self.member(*var, *re)
    }

    fn constant(&mut self, value: bool) -> Term {
        Context::constant(self, value)
    }

    fn and(&mut self, children: Vec<Term>) -> Term {
        Context::and(self, children)
    }

    fn or(&mut self, children: Vec<Term>) -> Term {
        Context::or(self, children)
    }

    fn not(&mut self, inner: &Term) -> Term {
        Context::not(self, *inner)
    }

    fn implies(&mut self, lhs: &Term, rhs: &Term) -> Term {
        Context::implies(self, *lhs, *rhs)
    }

    fn check_sat(
        &mut self,
        assertion: &Term,
        budget: &ProofBudget,
    ) -> SatOutcome<regsat::Model> {
        let cancel = regsat::CancelFlag::from(budget.cancel_flag().shared());
        let mut limits = regsat::Budget::unlimited().with_cancel(cancel);
        if let Some(max_time) = budget.max_time() {
            limits = limits.with_max_time(max_time);
        }

        match self.check(*assertion, &limits) {
            Outcome::Sat(model) => SatOutcome::Sat(model),
            Outcome::Unsat => SatOutcome::Unsat,
            Outcome::Unknown(reason) => SatOutcome::Unknown(reason.to_string()),
        }
    }

    fn model_value(&self, model: &regsat::Model, var: &StrVar) -> Option<String> {
        model.value(*var).map(str::to_owned)
    }
}

#[test]
fn test_context_backend() {
    fn prove_disjoint<B: Backend>(backend: &mut B) -> SatOutcome<B::Model> {
        let x = backend.string_var("x");
        let get = backend.re_literal("GET");
        let put = backend.re_literal("PUT");
        let in_get = backend.in_re(&x, &get);
        let in_put = backend.in_re(&x, &put);
        let both = backend.and(vec![in_get, in_put]);
        backend.check_sat(&both, &ProofBudget::unlimited())
    }

    let mut ctx = Context::new();
    assert_eq!(prove_disjoint(&mut ctx), SatOutcome::Unsat);
}

#[test]
fn test_context_backend_model() {
    let mut ctx = Context::new();
    let x = Backend::string_var(&mut ctx, "x");
    let any = ctx.re_literal("a");
    let any = ctx.re_star(any);
    let in_any = ctx.in_re(&x, &any);
    let empty = ctx.re_literal("");
    let in_empty = ctx.in_re(&x, &empty);
    let not_empty = Backend::not(&mut ctx, &in_empty);
    let assertion = Backend::and(&mut ctx, vec![in_any, not_empty]);

    match ctx.check_sat(&assertion, &ProofBudget::unlimited()) {
        SatOutcome::Sat(model) => assert_eq!(ctx.model_value(&model, &x), Some("a".into())),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_context_backend_budget() {
    use crate::budget::CancelFlag;
    use std::time::Duration;

    let mut ctx = Context::new();
    let x = Backend::string_var(&mut ctx, "x");
    let get = ctx.re_literal("GET");
    let assertion = ctx.in_re(&x, &get);

    let expired = ProofBudget::unlimited().with_max_time(Duration::from_secs(0));
    assert_eq!(
        ctx.check_sat(&assertion, &expired),
        SatOutcome::Unknown("time budget exhausted".into())
    );

    let cancel = CancelFlag::new();
    cancel.cancel();
    let cancelled = ProofBudget::unlimited().with_cancel(cancel);
    assert_eq!(
        ctx.check_sat(&assertion, &cancelled),
        SatOutcome::Unknown("check cancelled".into())
    );
}
