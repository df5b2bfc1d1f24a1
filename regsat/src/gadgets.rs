//! We must translate our boolean skeleton (conjunctions, disjunctions,
//! and theory nogoods) to CNF clauses in order to use SAT.  This
//! module handles that translation.
use cryptominisat::Lit;
use cryptominisat::Solver;

/// Add a nogood for `vars`.
pub fn add_nogood(solver: &mut Solver, nogood: &[Lit]) {
    // We don't want solutions where all the literals are satisfied.
    // In other words, at least one of them must be violated, i.e.
    // at least one of their complements must be true.
    solver.add_clause(&nogood.iter().map(|x| !*x).collect::<Vec<_>>());
}

/// Constrains `output` to be equivalent to the conjunction of `inputs`.
pub fn add_tseitin_and(solver: &mut Solver, output: Lit, inputs: &[Lit]) {
    // output -> input, for each input.
    for input in inputs {
        solver.add_clause(&[!output, *input]);
    }

    // (all inputs) -> output.
    let mut clause: Vec<Lit> = inputs.iter().map(|x| !*x).collect();
    clause.push(output);
    solver.add_clause(&clause);
}

/// Constrains `output` to be equivalent to the disjunction of `inputs`.
pub fn add_tseitin_or(solver: &mut Solver, output: Lit, inputs: &[Lit]) {
    // input -> output, for each input.
    for input in inputs {
        solver.add_clause(&[!*input, output]);
    }

    // output -> (some input).
    let mut clause: Vec<Lit> = inputs.to_vec();
    clause.push(!output);
    solver.add_clause(&clause);
}

#[cfg(test)]
fn assignments(vars: &[Lit], values: u32) -> Vec<Lit> {
    vars.iter()
        .enumerate()
        .map(|(bit, var)| Lit::new(var.var(), (values & (1 << bit)) == 0).expect("ok"))
        .collect()
}

#[test]
fn test_nogood() {
    use cryptominisat::Lbool;

    let mut solver = Solver::new();
    let (x, y, z) = (solver.new_var(), solver.new_var(), solver.new_var());

    // Add a nogood for (x, y, z)
    add_nogood(&mut solver, &[x, y, z]);

    // The constraint set is feasible.
    assert_eq!(solver.solve(), Lbool::True);
    // Iterate over the truth value for all 3 variables
    for values in 0..8 {
        // Should be true if `values != 7` (if variables not all true).
        let expected = if values == 7 {
            Lbool::False
        } else {
            Lbool::True
        };

        assert_eq!(
            solver.solve_with_assumptions(&assignments(&[x, y, z], values)),
            expected
        );
    }
}

#[test]
fn test_tseitin_and() {
    use cryptominisat::Lbool;

    let mut solver = Solver::new();
    let (x, y, out) = (solver.new_var(), solver.new_var(), solver.new_var());

    add_tseitin_and(&mut solver, out, &[x, y]);

    // For every input, `out` must take exactly the value `x && y`.
    for values in 0..8 {
        let (x_value, y_value, out_value) =
            ((values & 1) != 0, (values & 2) != 0, (values & 4) != 0);
        let expected = if out_value == (x_value && y_value) {
            Lbool::True
        } else {
            Lbool::False
        };

        assert_eq!(
            solver.solve_with_assumptions(&assignments(&[x, y, out], values)),
            expected
        );
    }
}

#[test]
fn test_tseitin_or() {
    use cryptominisat::Lbool;

    let mut solver = Solver::new();
    let (x, y, out) = (solver.new_var(), solver.new_var(), solver.new_var());

    add_tseitin_or(&mut solver, out, &[x, y]);

    for values in 0..8 {
        let (x_value, y_value, out_value) =
            ((values & 1) != 0, (values & 2) != 0, (values & 4) != 0);
        let expected = if out_value == (x_value || y_value) {
            Lbool::True
        } else {
            Lbool::False
        };

        assert_eq!(
            solver.solve_with_assumptions(&assignments(&[x, y, out], values)),
            expected
        );
    }
}
