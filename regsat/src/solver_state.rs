//! In order to represent a boolean skeleton in CryptoMiniSat, we need
//! a mapping between variable id (u32) and membership atom, along with
//! anonymous variables for Tseitin outputs.
//!
//! CryptoMiniSat needs us to explicitly register new variables, so
//! every variable goes through `new_var`, which keeps `from_id` in
//! lockstep with the solver.
use super::term::{Regex, StrVar, Term};
use cryptominisat::Lit;
use cryptominisat::Solver;
use std::collections::HashMap;

/// What a SAT variable stands for, when it stands for a theory atom.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Atom {
    pub term: Term,
    pub var: StrVar,
    pub regex: Regex,
}

pub struct SolverState {
    from_id: Vec<Option<Atom>>,
    to_id: HashMap<Term, Lit>,
    true_lit: Option<Lit>,
    solver: Solver,
}

impl SolverState {
    /// Returns a fresh `SolverState` instance.
    pub fn new() -> Self {
        Self {
            from_id: Vec::new(),
            to_id: HashMap::new(),
            true_lit: None,
            solver: Solver::new(),
        }
    }

    /// Returns the variable for `atom`, creating it if needed.
    ///
    /// Returns a pair of `(variable, freshly_created?)`.
    pub fn atom_var(&mut self, atom: Atom) -> (Lit, bool) {
        if let Some(id) = self.to_id.get(&atom.term) {
            return (*id, false);
        }

        let var = self.new_var(Some(atom));
        self.to_id.insert(atom.term, var);
        (var, true)
    }

    /// Returns a fresh anonymous variable.
    pub fn fresh_var(&mut self) -> Lit {
        self.new_var(None)
    }

    /// Returns a literal that is always true.
    pub fn true_lit(&mut self) -> Lit {
        if let Some(lit) = self.true_lit {
            return lit;
        }

        let lit = self.new_var(None);
        self.solver.add_clause(&[lit]);
        self.true_lit = Some(lit);
        lit
    }

    /// Returns the atom associated with `var`, if any.
    #[cfg(test)]
    pub fn meaning(&self, var: Lit) -> Option<&Atom> {
        match self.from_id.get(var.var() as usize) {
            Some(Some(ret)) => Some(ret),
            _ => None,
        }
    }

    /// Iterates over all atom variables, in creation order.
    pub fn atoms(&self) -> impl Iterator<Item = (Lit, &Atom)> + '_ {
        self.from_id
            .iter()
            .enumerate()
            .filter_map(|(index, meaning)| {
                let atom = meaning.as_ref()?;
                let lit = Lit::new(index as u32, false)?;
                Some((lit, atom))
            })
    }

    /// Returns the solver.
    pub fn solver(&mut self) -> &mut Solver {
        &mut self.solver
    }

    /// Creates a new variable in the solver, and registers it in
    /// `from_id`.
    fn new_var(&mut self, wanted: Option<Atom>) -> Lit {
        assert!(self.from_id.len() >= self.to_id.len());
        assert_eq!(self.from_id.len(), self.solver.nvars() as usize);

        let var = self.solver.new_var();
        assert_eq!(var.var() as usize, self.from_id.len());

        self.from_id.push(wanted);
        var
    }
}

#[test]
fn test_atom_var_is_shared() {
    let mut state = SolverState::new();
    let atom = Atom {
        term: Term(3),
        var: StrVar(0),
        regex: Regex(1),
    };

    let (first, fresh) = state.atom_var(atom);
    assert!(fresh);
    let (second, fresh) = state.atom_var(atom);
    assert!(!fresh);
    assert_eq!(first, second);
    assert_eq!(state.meaning(first), Some(&atom));

    let anonymous = state.fresh_var();
    assert_eq!(state.meaning(anonymous), None);
    assert_eq!(state.atoms().count(), 1);
}

#[test]
fn test_true_lit() {
    use cryptominisat::Lbool;

    let mut state = SolverState::new();
    let lit = state.true_lit();
    assert_eq!(state.true_lit(), lit);

    assert_eq!(state.solver().solve_with_assumptions(&[!lit]), Lbool::False);
    assert_eq!(state.solver().solve(), Lbool::True);
}
