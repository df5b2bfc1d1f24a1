//! The refinement loop: the SAT core proposes truth values for the
//! boolean skeleton, and the string theory either confirms them with
//! one witness string per variable, or rejects an inconsistent subset
//! of the membership literals with a nogood.  We stop at the first
//! confirmed proposal, when the SAT core runs out of proposals, or
//! when the budget runs out.
use super::budget::{Budget, Clock, UnknownReason};
use super::gadgets;
use super::nfa::Nfa;
use super::solver_state::{Atom, SolverState};
use super::term::{Regex, StrVar, Term, TermNode};
use super::theory::{self, Consistency, MembershipLiteral};
use super::{Context, Model, Outcome};
use cryptominisat::Lbool;
use cryptominisat::Lit;
use std::collections::{BTreeMap, HashMap};

/// A membership literal, as currently assigned by the SAT model.
#[derive(Clone, Copy, Debug)]
struct Assigned {
    lit: Lit,
    regex: Regex,
    positive: bool,
}

impl Assigned {
    /// Returns the SAT literal that is true under the current model.
    fn as_true_lit(self) -> Lit {
        if self.positive {
            self.lit
        } else {
            !self.lit
        }
    }
}

enum Verdict {
    Model(Model),
    /// We added at least one nogood; the SAT core should try again.
    Refined,
    Interrupted(UnknownReason),
}

pub struct Impl<'ctx> {
    ctx: &'ctx Context,
    sat_state: SolverState,
    encoded: HashMap<Term, Lit>,
    automata: HashMap<Regex, Nfa>,
}

impl<'ctx> Impl<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        Self {
            ctx,
            sat_state: SolverState::new(),
            encoded: HashMap::new(),
            automata: HashMap::new(),
        }
    }

    /// Decides whether `assertion` has a model.
    pub fn check(mut self, assertion: Term, budget: &Budget) -> Outcome {
        let clock = budget.start();
        let root = self.encode(assertion);
        self.sat_state.solver().add_clause(&[root]);

        let mut round = 0usize;
        loop {
            if let Some(reason) = clock.interrupted() {
                return Outcome::Unknown(reason);
            }

            if let Some(remaining) = clock.remaining() {
                self.sat_state
                    .solver()
                    .set_max_time(remaining.as_secs_f64());
            }

            // CryptoMiniSat does not watch the cancel flag: a cancel
            // raised during `solve` is seen once it returns.
            round += 1;
            match self.sat_state.solver().solve() {
                Lbool::True => match self.theory_check(&clock) {
                    Verdict::Model(model) => {
                        tracing::debug!(rounds = round, "theory-consistent model");
                        return Outcome::Sat(model);
                    }
                    Verdict::Refined => continue,
                    Verdict::Interrupted(reason) => return Outcome::Unknown(reason),
                },
                Lbool::False => {
                    tracing::debug!(rounds = round, "skeleton exhausted");
                    return Outcome::Unsat;
                }
                // CryptoMiniSat only gives up on its own when we gave
                // it a time limit.
                Lbool::Undef if clock.remaining().is_some() => {
                    return Outcome::Unknown(UnknownReason::TimedOut);
                }
                Lbool::Undef => return Outcome::Unknown(UnknownReason::SolverGaveUp),
            }
        }
    }

    /// Returns a literal equivalent to `term`, adding Tseitin
    /// definitions for compound terms.
    fn encode(&mut self, term: Term) -> Lit {
        if let Some(lit) = self.encoded.get(&term) {
            return *lit;
        }

        let lit = match self.ctx.term_node(term).clone() {
            TermNode::Constant(true) => self.sat_state.true_lit(),
            TermNode::Constant(false) => !self.sat_state.true_lit(),
            TermNode::Member(var, regex) => self.sat_state.atom_var(Atom { term, var, regex }).0,
            TermNode::Not(inner) => !self.encode(inner),
            TermNode::And(children) => {
                let inputs: Vec<Lit> = children.iter().map(|child| self.encode(*child)).collect();
                self.gate(&inputs, true)
            }
            TermNode::Or(children) => {
                let inputs: Vec<Lit> = children.iter().map(|child| self.encode(*child)).collect();
                self.gate(&inputs, false)
            }
            TermNode::Implies(lhs, rhs) => {
                let inputs = [!self.encode(lhs), self.encode(rhs)];
                self.gate(&inputs, false)
            }
        };

        self.encoded.insert(term, lit);
        lit
    }

    /// Returns a literal for the conjunction (`conjunction`) or the
    /// disjunction of `inputs`.
    fn gate(&mut self, inputs: &[Lit], conjunction: bool) -> Lit {
        match inputs {
            [] if conjunction => self.sat_state.true_lit(),
            [] => !self.sat_state.true_lit(),
            [single] => *single,
            _ => {
                let output = self.sat_state.fresh_var();
                if conjunction {
                    gadgets::add_tseitin_and(self.sat_state.solver(), output, inputs);
                } else {
                    gadgets::add_tseitin_or(self.sat_state.solver(), output, inputs);
                }
                output
            }
        }
    }

    /// Checks the current SAT model against the string theory.
    fn theory_check(&mut self, clock: &Clock) -> Verdict {
        let model: Vec<Lbool> = self.sat_state.solver().get_model().into();

        let mut by_var: BTreeMap<StrVar, Vec<Assigned>> = BTreeMap::new();
        for (lit, atom) in self.sat_state.atoms() {
            let positive = model.get(lit.var() as usize) == Some(&Lbool::True);
            by_var.entry(atom.var).or_default().push(Assigned {
                lit,
                regex: atom.regex,
                positive,
            });
        }

        for assigned in by_var.values().flatten() {
            let ctx = self.ctx;
            self.automata
                .entry(assigned.regex)
                .or_insert_with(|| Nfa::build(ctx.regex_nodes(), assigned.regex));
        }

        let mut values = BTreeMap::new();
        let mut nogoods = Vec::new();
        for (var, assigned) in &by_var {
            match theory::find_witness(&self.literals(assigned), clock) {
                Consistency::Witness(witness) => {
                    values.insert(*var, witness);
                }
                Consistency::Conflict => match self.minimize_conflict(assigned.clone(), clock) {
                    Ok(core) => nogoods.push(core),
                    Err(reason) => return Verdict::Interrupted(reason),
                },
                Consistency::Interrupted(reason) => return Verdict::Interrupted(reason),
            }
        }

        if nogoods.is_empty() {
            // Variables without any atom are unconstrained.
            for var in self.ctx.vars() {
                values.entry(var).or_insert_with(String::new);
            }

            return Verdict::Model(Model::new(values));
        }

        tracing::debug!(nogoods = nogoods.len(), "theory conflicts");
        for core in nogoods {
            let lits: Vec<Lit> = core.into_iter().map(Assigned::as_true_lit).collect();
            gadgets::add_nogood(self.sat_state.solver(), &lits);
        }

        Verdict::Refined
    }

    /// Greedily drops literals from a conflicting set, as long as the
    /// remainder still conflicts.  Smaller nogoods prune more of the
    /// skeleton.
    fn minimize_conflict(
        &self,
        mut core: Vec<Assigned>,
        clock: &Clock,
    ) -> Result<Vec<Assigned>, UnknownReason> {
        let mut index = 0;
        while index < core.len() {
            let mut candidate = core.clone();
            candidate.remove(index);

            match theory::find_witness(&self.literals(&candidate), clock) {
                Consistency::Conflict => core = candidate,
                Consistency::Witness(_) => index += 1,
                Consistency::Interrupted(reason) => return Err(reason),
            }
        }

        Ok(core)
    }

    fn literals<'a>(&'a self, assigned: &[Assigned]) -> Vec<MembershipLiteral<'a>> {
        assigned
            .iter()
            .map(|literal| MembershipLiteral {
                nfa: &self.automata[&literal.regex],
                positive: literal.positive,
            })
            .collect()
    }
}
