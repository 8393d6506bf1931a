//! Workspaces for conflict analysis
//!
//! The first-UIP walk, clause minimization, and final-conflict extraction all
//! need per-variable scratch marks and a few reusable buffers. They live here
//! so the solver never allocates on the conflict path.

use crate::literal::{Literal, Variable};

/// Reusable state for conflict analysis.
#[derive(Debug, Default)]
pub struct ConflictAnalyzer {
    seen: Vec<bool>,
    /// Literals whose `seen` mark must be cleared after analysis.
    pub to_clear: Vec<Literal>,
    /// DFS stack for the recursive-minimization check.
    pub stack: Vec<Literal>,
}

impl ConflictAnalyzer {
    /// Fresh analyzer.
    pub fn new() -> Self {
        ConflictAnalyzer::default()
    }

    /// Grow the scratch marks to cover `num_vars` variables.
    pub fn ensure_vars(&mut self, num_vars: usize) {
        if self.seen.len() < num_vars {
            self.seen.resize(num_vars, false);
        }
    }

    /// Whether the variable was already visited in this analysis.
    #[inline]
    pub fn is_seen(&self, var: Variable) -> bool {
        self.seen[var.index()]
    }

    /// Mark a variable visited.
    #[inline]
    pub fn mark(&mut self, var: Variable) {
        self.seen[var.index()] = true;
    }

    /// Clear a single variable's mark.
    #[inline]
    pub fn unmark(&mut self, var: Variable) {
        self.seen[var.index()] = false;
    }

    /// Clear the marks of every literal recorded in `to_clear`.
    pub fn clear_marks(&mut self) {
        for i in 0..self.to_clear.len() {
            self.seen[self.to_clear[i].var().index()] = false;
        }
        self.to_clear.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_round_trip() {
        let mut analyzer = ConflictAnalyzer::new();
        analyzer.ensure_vars(4);
        assert!(!analyzer.is_seen(Variable(2)));
        analyzer.mark(Variable(2));
        assert!(analyzer.is_seen(Variable(2)));
        analyzer.unmark(Variable(2));
        assert!(!analyzer.is_seen(Variable(2)));
    }

    #[test]
    fn clear_marks_uses_the_record() {
        let mut analyzer = ConflictAnalyzer::new();
        analyzer.ensure_vars(4);
        for v in [Variable(0), Variable(3)] {
            analyzer.mark(v);
            analyzer.to_clear.push(Literal::positive(v));
        }
        analyzer.clear_marks();
        assert!(!analyzer.is_seen(Variable(0)));
        assert!(!analyzer.is_seen(Variable(3)));
        assert!(analyzer.to_clear.is_empty());
    }
}
