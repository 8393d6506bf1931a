//! DIMACS CNF emission
//!
//! Writes the current clause database in classical DIMACS: root-satisfied
//! clauses are skipped, root-false literals are dropped, assumptions are
//! emitted as unit clauses, and variables are renumbered densely. A solver in
//! a contradictory state emits the canonical two-clause unsatisfiable formula.

use std::io::Write;

use thiserror::Error;

use crate::arena::ClauseRef;
use crate::literal::{Literal, Variable};
use crate::solver::Solver;

/// DIMACS emission failure.
#[derive(Debug, Error)]
#[error("failed to emit DIMACS: {0}")]
pub struct DimacsError(#[from] std::io::Error);

/// Dense renumbering of the variables that actually appear in the output.
#[derive(Default)]
struct VarMap {
    map: Vec<Option<u32>>,
    next: u32,
}

impl VarMap {
    /// 1-based DIMACS index of `var`, assigned on first use.
    fn dimacs_index(&mut self, var: Variable) -> u32 {
        if self.map.len() <= var.index() {
            self.map.resize(var.index() + 1, None);
        }
        match self.map[var.index()] {
            Some(n) => n,
            None => {
                self.next += 1;
                self.map[var.index()] = Some(self.next);
                self.next
            }
        }
    }

    fn max(&self) -> u32 {
        self.next
    }
}

impl Solver {
    /// Emit the live clause database plus `assumptions` as DIMACS CNF.
    pub fn to_dimacs<W: Write>(
        &self,
        out: &mut W,
        assumptions: &[Literal],
    ) -> Result<(), DimacsError> {
        if !self.okay() {
            out.write_all(b"p cnf 1 2\n1 0\n-1 0\n")?;
            return Ok(());
        }

        let live: Vec<ClauseRef> = self
            .original_clauses()
            .iter()
            .copied()
            .filter(|&cref| !self.is_satisfied(cref))
            .collect();

        // Number clause variables first, assumption variables after, so the
        // header's variable count covers everything printed.
        let mut map = VarMap::default();
        for &cref in &live {
            for &l in self.clause(cref) {
                if self.lit_value(l) != Some(false) {
                    map.dimacs_index(l.var());
                }
            }
        }
        for &a in assumptions {
            debug_assert!(self.lit_value(a) != Some(false));
            map.dimacs_index(a.var());
        }

        writeln!(out, "p cnf {} {}", map.max(), live.len() + assumptions.len())?;

        for &a in assumptions {
            let sign = if a.sign() { "-" } else { "" };
            writeln!(out, "{}{} 0", sign, map.dimacs_index(a.var()))?;
        }

        for &cref in &live {
            for &l in self.clause(cref) {
                if self.lit_value(l) != Some(false) {
                    let sign = if l.sign() { "-" } else { "" };
                    write!(out, "{}{} ", sign, map.dimacs_index(l.var()))?;
                }
            }
            writeln!(out, "0")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::hooks::SolitaryHost;

    fn lit(i: i32) -> Literal {
        Literal::signed(Variable(i.unsigned_abs() - 1), i < 0)
    }

    fn emit(solver: &Solver, assumptions: &[Literal]) -> String {
        let mut buf = Vec::new();
        solver.to_dimacs(&mut buf, assumptions).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn contradictory_state_emits_canonical_unsat() {
        let mut host = SolitaryHost;
        let mut solver = Solver::new(SolverConfig::default());
        solver.new_var(&mut host, None, true);
        solver.add_clause(&mut host, &[lit(1)]);
        solver.add_clause(&mut host, &[lit(-1)]);
        assert!(!solver.okay());
        assert_eq!(emit(&solver, &[]), "p cnf 1 2\n1 0\n-1 0\n");
    }

    #[test]
    fn root_facts_prune_clauses_and_literals() {
        let mut host = SolitaryHost;
        let mut solver = Solver::new(SolverConfig::default());
        for _ in 0..3 {
            solver.new_var(&mut host, None, true);
        }
        solver.add_clause(&mut host, &[lit(1)]); // root fact, clause not stored
        solver.add_clause(&mut host, &[lit(1), lit(2)]); // satisfied at root
        solver.add_clause(&mut host, &[lit(-1), lit(2), lit(3)]); // -1 is false

        let text = emit(&solver, &[]);
        let mut lines = text.lines();
        // One clause survives, with the false literal stripped and the two
        // remaining variables renumbered densely.
        assert_eq!(lines.next(), Some("p cnf 2 1"));
        assert_eq!(lines.next(), Some("1 2 0"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn assumptions_are_emitted_as_units() {
        let mut host = SolitaryHost;
        let mut solver = Solver::new(SolverConfig::default());
        for _ in 0..2 {
            solver.new_var(&mut host, None, true);
        }
        solver.add_clause(&mut host, &[lit(1), lit(2)]);
        let text = emit(&solver, &[lit(-2)]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "p cnf 2 2");
        // Renumbering follows clause-storage order, which intake permutes;
        // the assumption is one of the two variables, negated.
        assert!(lines[1] == "-1 0" || lines[1] == "-2 0");
        let mut toks: Vec<&str> = lines[2].split_whitespace().collect();
        assert_eq!(toks.pop(), Some("0"));
        toks.sort_unstable();
        assert_eq!(toks, ["1", "2"]);
    }
}
