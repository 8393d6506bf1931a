//! Callback surface between the core and the enclosing propagator framework
//!
//! The framework owns the solver and passes a host implementation into every
//! entry point. Queries let the host inject propagations, materialize reasons
//! for literals it enqueued, veto a total assignment, and override branching.
//! Notifications are fire-and-forget; the core does not observe their effect.

use crate::arena::ClauseRef;
use crate::literal::{Literal, Variable};
use crate::solver::Solver;

/// Host side of the core/framework contract.
///
/// Every method has a neutral default, so a standalone SAT application only
/// implements what it needs (usually nothing; see [`SolitaryHost`]).
pub trait PropagatorHost {
    /// Run the host's own propagators after the core reached a fixpoint.
    ///
    /// The host may enqueue literals on the solver trail (with reasons it can
    /// later explain) and may report a conflict clause, which the core treats
    /// exactly like one of its own.
    fn propagate(&mut self, solver: &mut Solver) -> Option<ClauseRef> {
        let _ = solver;
        None
    }

    /// Materialize a reason clause for a literal this host enqueued without
    /// one. The clause must be allocated in the solver's arena with `lit` at
    /// position 0; the core frees it again after one resolution step.
    ///
    /// Only called for literals that are neither decisions nor core
    /// propagations, so a host that never enqueues can keep the default.
    fn explanation(&mut self, solver: &mut Solver, lit: Literal) -> ClauseRef {
        let _ = (solver, lit);
        unreachable!("explanation requested for a literal the host never enqueued")
    }

    /// Inspect a total assignment over decidable variables before the core
    /// reports a model. A returned clause is treated as a conflict; the host
    /// may also backtrack the solver or add clauses here.
    fn check_full_assignment(&mut self, solver: &mut Solver) -> Option<ClauseRef> {
        let _ = solver;
        None
    }

    /// Replace the branching variable the core picked with another one.
    fn change_branch_choice(&mut self, solver: &Solver, chosen: Variable) -> Variable {
        let _ = solver;
        chosen
    }

    /// A variable was appended to the solver.
    fn on_var_added(&mut self, var: Variable) {
        let _ = var;
    }

    /// A clause entered the database (original or learned).
    fn on_clause_added(&mut self, cref: ClauseRef) {
        let _ = cref;
    }

    /// A literal became true on the trail.
    fn on_literal_set(&mut self, lit: Literal) {
        let _ = lit;
    }

    /// A variable was promoted to decidable.
    fn on_became_decidable(&mut self, var: Variable) {
        let _ = var;
    }

    /// A new decision level was opened.
    fn on_new_decision_level(&mut self) {}

    /// The solver backtracked to `level`; `decision` opened the first undone
    /// level, for the host's own bookkeeping.
    fn on_backtrack(&mut self, level: u32, decision: Literal) {
        let _ = (level, decision);
    }

    /// Intake finished and the root database was simplified.
    fn on_finish_parsing(&mut self) {}
}

/// Host that never propagates, explains, or overrides anything.
///
/// Used when the solver runs standalone rather than inside a framework.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolitaryHost;

impl PropagatorHost for SolitaryHost {}
