//! The CDCL search engine
//!
//! Holds the clause database, the assignment trail, and the branching state,
//! and drives the decide/propagate/analyze/backjump loop. The enclosing
//! propagator framework participates through the [`PropagatorHost`] passed
//! into every entry point: it can propagate, explain literals it enqueued,
//! veto a total assignment, and override branching, and it is notified of
//! every state transition it may need to mirror.

use std::fmt;

use tracing::{debug, trace};

use crate::arena::{ClauseArena, ClauseRef};
use crate::config::{CcMin, PhaseSaving, SolverConfig};
use crate::conflict::ConflictAnalyzer;
use crate::hooks::PropagatorHost;
use crate::literal::{Literal, Variable};
use crate::order::VarOrder;
use crate::rng::SeedRng;
use crate::watch::{WatchLists, Watcher};

/// Outcome of a [`Solver::solve`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveResult {
    /// A satisfying assignment was found. Variables never touched by the
    /// search (undecidable and unconstrained) stay `None`.
    Sat(Vec<Option<bool>>),
    /// No satisfying assignment exists under the given assumptions. The
    /// payload is the set of negated assumptions sufficient for the
    /// contradiction; empty if the formula is unconditionally unsatisfiable.
    Unsat(Vec<Literal>),
    /// A budget ran out or an interrupt was requested.
    Undef,
}

impl SolveResult {
    /// Whether this is the satisfiable outcome.
    pub fn is_sat(&self) -> bool {
        matches!(self, SolveResult::Sat(_))
    }

    /// Whether this is the unsatisfiable outcome.
    pub fn is_unsat(&self) -> bool {
        matches!(self, SolveResult::Unsat(_))
    }
}

/// Search statistics.
#[derive(Debug, Default, Clone)]
pub struct Stats {
    /// Calls to `solve`.
    pub solves: u64,
    /// Restarts performed (inner `search` invocations).
    pub starts: u64,
    /// Branching decisions.
    pub decisions: u64,
    /// Decisions taken from the random pick.
    pub rnd_decisions: u64,
    /// Literals dequeued by unit propagation.
    pub propagations: u64,
    /// Conflicts encountered.
    pub conflicts: u64,
    /// Variables currently flagged decidable.
    pub dec_vars: u64,
    /// Total literals in attached original clauses.
    pub clauses_literals: u64,
    /// Total literals in attached learned clauses.
    pub learnts_literals: u64,
    /// Learned-clause literals before minimization.
    pub max_literals: u64,
    /// Learned-clause literals after minimization.
    pub tot_literals: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = |part: u64, whole: u64| {
            if whole == 0 {
                0.0
            } else {
                part as f64 * 100.0 / whole as f64
            }
        };
        writeln!(f, "restarts          : {}", self.starts)?;
        writeln!(f, "conflicts         : {}", self.conflicts)?;
        writeln!(
            f,
            "decisions         : {} ({:.2} % random)",
            self.decisions,
            pct(self.rnd_decisions, self.decisions)
        )?;
        writeln!(f, "propagations      : {}", self.propagations)?;
        writeln!(
            f,
            "conflict literals : {} ({:.2} % deleted)",
            self.tot_literals,
            pct(
                self.max_literals.saturating_sub(self.tot_literals),
                self.max_literals
            )
        )
    }
}

/// Root-level snapshot taken by [`Solver::save_state`].
#[derive(Debug, Clone)]
struct SavedState {
    ok: bool,
    level: u32,
    clauses_len: usize,
    qhead: usize,
    trail: Vec<Literal>,
    trail_lim: Vec<usize>,
}

/// The CDCL solver core.
pub struct Solver {
    config: SolverConfig,
    rng: SeedRng,

    // Clause database
    arena: ClauseArena,
    clauses: Vec<ClauseRef>,
    learnts: Vec<ClauseRef>,
    watches: WatchLists,

    // Assignment
    assigns: Vec<Option<bool>>,
    level: Vec<u32>,
    reason: Vec<Option<ClauseRef>>,
    trail: Vec<Literal>,
    trail_lim: Vec<usize>,
    qhead: usize,

    // Branching
    order: VarOrder,
    decidable: Vec<bool>,
    saved_phase: Vec<bool>,
    user_pol: Vec<Option<bool>>,
    custom_heur_freq: f64,

    // Conflict analysis
    analyzer: ConflictAnalyzer,
    cla_inc: f64,

    // Learned-clause limit governor
    max_learnts: f64,
    learntsize_adjust_confl: f64,
    learntsize_adjust_cnt: i64,

    // Simplification watermarks
    simp_db_assigns: i64,
    simp_db_props: i64,
    remove_satisfied: bool,

    // Status
    ok: bool,
    assumptions: Vec<Literal>,
    conflict: Vec<Literal>,
    progress: f64,

    // Resource limits
    conflict_budget: i64,
    propagation_budget: i64,
    interrupt_requested: bool,

    stats: Stats,
    saved: Option<SavedState>,
}

impl Solver {
    /// New solver with the given configuration and no variables.
    pub fn new(config: SolverConfig) -> Self {
        let rng = SeedRng::new(config.random_seed);
        let order = VarOrder::new(config.var_decay);
        let remove_satisfied = config.remove_satisfied;
        let conflict_budget = if config.conflict_budget >= 0 {
            config.conflict_budget
        } else {
            -1
        };
        let propagation_budget = if config.propagation_budget >= 0 {
            config.propagation_budget
        } else {
            -1
        };
        let custom_heur_freq = config.custom_heur_freq;
        Solver {
            config,
            rng,
            arena: ClauseArena::new(),
            clauses: Vec::new(),
            learnts: Vec::new(),
            watches: WatchLists::new(),
            assigns: Vec::new(),
            level: Vec::new(),
            reason: Vec::new(),
            trail: Vec::new(),
            trail_lim: Vec::new(),
            qhead: 0,
            order,
            decidable: Vec::new(),
            saved_phase: Vec::new(),
            user_pol: Vec::new(),
            custom_heur_freq,
            analyzer: ConflictAnalyzer::new(),
            cla_inc: 1.0,
            max_learnts: 0.0,
            learntsize_adjust_confl: 0.0,
            learntsize_adjust_cnt: 0,
            simp_db_assigns: -1,
            simp_db_props: 0,
            remove_satisfied,
            ok: true,
            assumptions: Vec::new(),
            conflict: Vec::new(),
            progress: 0.0,
            conflict_budget,
            propagation_budget,
            interrupt_requested: false,
            stats: Stats::default(),
            saved: None,
        }
    }

    // ======================================================================
    // Accessors
    // ======================================================================

    /// Number of variables.
    #[inline]
    pub fn num_vars(&self) -> usize {
        self.assigns.len()
    }

    /// Number of currently assigned variables.
    #[inline]
    pub fn num_assigns(&self) -> usize {
        self.trail.len()
    }

    /// Number of attached original clauses.
    #[inline]
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Number of attached learned clauses.
    #[inline]
    pub fn num_learnts(&self) -> usize {
        self.learnts.len()
    }

    /// Current decision level.
    #[inline]
    pub fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    /// Truth value of a variable, `None` when unassigned.
    #[inline]
    pub fn value(&self, var: Variable) -> Option<bool> {
        self.assigns[var.index()]
    }

    /// Truth value of a literal under the current assignment.
    #[inline]
    pub fn lit_value(&self, lit: Literal) -> Option<bool> {
        self.assigns[lit.var().index()].map(|v| v != lit.sign())
    }

    /// Whether the variable may be picked by branching.
    #[inline]
    pub fn is_decidable(&self, var: Variable) -> bool {
        self.decidable[var.index()]
    }

    /// False once a permanent inconsistency has been found.
    #[inline]
    pub fn okay(&self) -> bool {
        self.ok
    }

    /// Literals of a clause.
    #[inline]
    pub fn clause(&self, cref: ClauseRef) -> &[Literal] {
        self.arena.lits(cref)
    }

    /// Search statistics so far.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// The decision literal of every open level, in order.
    pub fn decisions(&self) -> Vec<Literal> {
        self.trail_lim.iter().map(|&i| self.trail[i]).collect()
    }

    /// Final conflict of the last unsatisfiable solve: the negated
    /// assumptions responsible for it.
    pub fn final_conflict(&self) -> &[Literal] {
        &self.conflict
    }

    /// Progress estimate recorded when the last budget expired.
    pub fn progress_estimate(&self) -> f64 {
        self.progress
    }

    pub(crate) fn original_clauses(&self) -> &[ClauseRef] {
        &self.clauses
    }

    pub(crate) fn is_satisfied(&self, cref: ClauseRef) -> bool {
        self.arena
            .lits(cref)
            .iter()
            .any(|&l| self.lit_value(l) == Some(true))
    }

    // ======================================================================
    // Resource control
    // ======================================================================

    /// Request cooperative termination; every loop returns `Undef` at its
    /// next check. Callable from host hooks mid-solve.
    pub fn interrupt(&mut self) {
        self.interrupt_requested = true;
    }

    /// Clear a previously requested interrupt.
    pub fn clear_interrupt(&mut self) {
        self.interrupt_requested = false;
    }

    /// Allow `budget` more conflicts before search surrenders with `Undef`.
    pub fn set_conflict_budget(&mut self, budget: i64) {
        self.conflict_budget = self.stats.conflicts as i64 + budget;
    }

    /// Allow `budget` more propagations before search surrenders with `Undef`.
    pub fn set_propagation_budget(&mut self, budget: i64) {
        self.propagation_budget = self.stats.propagations as i64 + budget;
    }

    /// Remove both resource budgets.
    pub fn budget_off(&mut self) {
        self.conflict_budget = -1;
        self.propagation_budget = -1;
    }

    fn within_budget(&self) -> bool {
        !self.interrupt_requested
            && (self.conflict_budget < 0 || (self.stats.conflicts as i64) < self.conflict_budget)
            && (self.propagation_budget < 0
                || (self.stats.propagations as i64) < self.propagation_budget)
    }

    // ======================================================================
    // Variables
    // ======================================================================

    /// Append a variable. `user_pol` pins its branching sign; `decidable`
    /// controls whether branching may pick it.
    pub fn new_var(
        &mut self,
        host: &mut dyn PropagatorHost,
        user_pol: Option<bool>,
        decidable: bool,
    ) -> Variable {
        let v = Variable(self.num_vars() as u32);
        self.watches.ensure_vars(v.index() + 1);
        self.assigns.push(None);
        self.level.push(0);
        self.reason.push(None);
        let initial_act = if self.config.rnd_init_act {
            self.rng.next_f64() * 0.00001
        } else {
            0.0
        };
        self.order.push_var(initial_act);
        self.analyzer.ensure_vars(v.index() + 1);
        self.saved_phase.push(true);
        self.user_pol.push(user_pol);
        self.decidable.push(false);
        // The host learns of the variable before any decidability callback.
        host.on_var_added(v);
        self.set_decidable(host, v, decidable);
        v
    }

    /// Change whether branching may pick `var`. Idempotent; the host is
    /// notified only of a false-to-true transition.
    pub fn set_decidable(&mut self, host: &mut dyn PropagatorHost, var: Variable, decide: bool) {
        let newly = decide && !self.decidable[var.index()];
        if newly {
            self.stats.dec_vars += 1;
        } else if !decide && self.decidable[var.index()] {
            self.stats.dec_vars -= 1;
        }
        self.decidable[var.index()] = decide;
        if decide {
            self.insert_var_order(var);
        } else {
            self.order.remove(var);
        }
        if newly {
            host.on_became_decidable(var);
        }
    }

    fn insert_var_order(&mut self, var: Variable) {
        if !self.order.in_heap(var) && self.decidable[var.index()] {
            self.order.insert(var);
        }
    }

    // ======================================================================
    // Clause intake
    // ======================================================================

    /// Add a clause over existing variables.
    ///
    /// At a non-root level the clause must have two non-false literals or the
    /// solver backtracks to the root first. Root intake simplifies: satisfied
    /// clauses and tautologies are dropped, false and duplicate literals are
    /// removed. Returns `false` once the database is unconditionally
    /// unsatisfiable.
    pub fn add_clause(&mut self, host: &mut dyn PropagatorHost, lits: &[Literal]) -> bool {
        if !self.ok {
            return false;
        }

        let mut ps: Vec<Literal> = lits.to_vec();

        if self.decision_level() > 0 {
            let nonfalse = ps
                .iter()
                .filter(|&&l| self.lit_value(l) != Some(false))
                .take(2)
                .count();
            if nonfalse < 2 {
                self.cancel_until(host, 0);
            }
        }

        ps.sort();

        if self.decision_level() == 0 {
            // Drop satisfied clauses and tautologies, strip false and
            // duplicate literals. Sorting put complementary pairs adjacent.
            let mut j = 0;
            let mut prev: Option<Literal> = None;
            for i in 0..ps.len() {
                let l = ps[i];
                if self.lit_value(l) == Some(true) || prev == Some(!l) {
                    return true;
                }
                if self.lit_value(l) != Some(false) && prev != Some(l) {
                    ps[j] = l;
                    j += 1;
                    prev = Some(l);
                }
            }
            ps.truncate(j);
        }

        // Permute so downstream search is insensitive to the literal order
        // the caller happened to produce.
        self.permute_randomly(&mut ps);

        if ps.is_empty() {
            self.ok = false;
            false
        } else if ps.len() == 1 {
            debug_assert_eq!(self.decision_level(), 0);
            self.unchecked_enqueue(host, ps[0], None);
            self.ok = self.propagate(host).is_none();
            self.ok
        } else {
            if self.decision_level() > 0 {
                if let Some(k) = ps.iter().position(|&l| self.lit_value(l) != Some(false)) {
                    ps.swap(1, k);
                }
            }
            let cref = self.arena.alloc(&ps, false);
            self.add_to_clauses(host, cref, false);
            self.attach_clause(host, cref);
            true
        }
    }

    /// Install a clause the host derived, already allocated in the arena.
    ///
    /// Unit clauses re-enter through root intake; larger ones are attached as
    /// learned and activity-bumped.
    pub fn add_learned_clause(&mut self, host: &mut dyn PropagatorHost, cref: ClauseRef) {
        if self.arena.len(cref) > 1 {
            self.add_to_clauses(host, cref, true);
            self.attach_clause(host, cref);
            self.cla_bump_activity(cref);
            trace!("host learned clause attached ({} literals)", self.arena.len(cref));
        } else {
            debug_assert_eq!(self.arena.len(cref), 1);
            self.cancel_until(host, 0);
            let unit = self.arena.lit(cref, 0);
            self.add_clause(host, &[unit]);
        }
    }

    /// Allocate a clause in the arena without attaching it. Used by hosts to
    /// materialize explanation clauses; `learned` controls whether analysis
    /// bumps its activity before freeing it.
    pub fn alloc_reason_clause(&mut self, lits: &[Literal], learned: bool) -> ClauseRef {
        self.arena.alloc(lits, learned)
    }

    fn permute_randomly(&mut self, ps: &mut [Literal]) {
        for i in (1..ps.len()).rev() {
            let j = self.rng.next_below(i + 1);
            ps.swap(i, j);
        }
    }

    fn add_to_clauses(&mut self, host: &mut dyn PropagatorHost, cref: ClauseRef, learned: bool) {
        host.on_clause_added(cref);
        if learned {
            self.learnts.push(cref);
        } else {
            self.clauses.push(cref);
        }
    }

    fn attach_clause(&mut self, host: &mut dyn PropagatorHost, cref: ClauseRef) {
        debug_assert!(self.arena.len(cref) > 1);
        let c0 = self.arena.lit(cref, 0);
        let c1 = self.arena.lit(cref, 1);
        let learned = self.arena.is_learned(cref);
        if !learned {
            debug_assert!(
                self.lit_value(c0) != Some(false) || self.lit_value(c1) != Some(false)
            );
        }
        self.watches.push(!c0, Watcher::new(cref, c1));
        self.watches.push(!c1, Watcher::new(cref, c0));
        let len = self.arena.len(cref) as u64;
        if learned {
            self.stats.learnts_literals += len;
        } else {
            self.stats.clauses_literals += len;
        }
        if !learned || self.lit_value(c0) != Some(false) || self.lit_value(c1) != Some(false) {
            self.check_decision_vars(host, cref);
        }
    }

    fn detach_clause(&mut self, cref: ClauseRef, strict: bool) {
        debug_assert!(self.arena.len(cref) > 1);
        let c0 = self.arena.lit(cref, 0);
        let c1 = self.arena.lit(cref, 1);
        if strict {
            self.watches.remove(!c0, cref);
            self.watches.remove(!c1, cref);
        } else {
            self.watches.smudge(!c0);
            self.watches.smudge(!c1);
        }
        let len = self.arena.len(cref) as u64;
        if self.arena.is_learned(cref) {
            self.stats.learnts_literals -= len;
        } else {
            self.stats.clauses_literals -= len;
        }
    }

    fn remove_clause(&mut self, cref: ClauseRef) {
        self.detach_clause(cref, false);
        if self.locked(cref) {
            self.reason[self.arena.lit(cref, 0).var().index()] = None;
        }
        self.arena.free(cref);
    }

    fn locked(&self, cref: ClauseRef) -> bool {
        let c0 = self.arena.lit(cref, 0);
        self.lit_value(c0) == Some(true) && self.reason[c0.var().index()] == Some(cref)
    }

    /// Ensure at least one watched literal is decidable and not false, so a
    /// total assignment over decidable variables cannot miss this clause.
    fn check_decision_vars(&mut self, host: &mut dyn PropagatorHost, cref: ClauseRef) {
        let c0 = self.arena.lit(cref, 0);
        let c1 = self.arena.lit(cref, 1);
        debug_assert!(self.lit_value(c0) != Some(false) || self.lit_value(c1) != Some(false));
        if self.lit_value(c0) == Some(false) {
            self.set_decidable(host, c1.var(), true);
        } else if self.lit_value(c1) == Some(false) {
            self.set_decidable(host, c0.var(), true);
        } else if !self.decidable[c0.var().index()] && !self.decidable[c1.var().index()] {
            let pick = if self.rng.next_below(2) == 0 { c0 } else { c1 };
            self.set_decidable(host, pick.var(), true);
        }
    }

    // ======================================================================
    // Trail
    // ======================================================================

    /// Put a literal on the trail. Requires it to be unassigned; `from` is
    /// its reason clause, `None` for decisions, assumptions, and host
    /// propagations awaiting a lazy explanation.
    pub fn unchecked_enqueue(
        &mut self,
        host: &mut dyn PropagatorHost,
        p: Literal,
        from: Option<ClauseRef>,
    ) {
        debug_assert!(self.lit_value(p).is_none());
        let v = p.var();
        self.assigns[v.index()] = Some(p.is_positive());
        self.level[v.index()] = self.decision_level();
        self.reason[v.index()] = from;
        self.trail.push(p);
        // An assigned variable must count as decidable or the watch guard
        // invariant is unsatisfiable for clauses watching it.
        if !self.decidable[v.index()] {
            self.set_decidable(host, v, true);
        }
        host.on_literal_set(p);
    }

    fn new_decision_level(&mut self, host: &mut dyn PropagatorHost) {
        self.trail_lim.push(self.trail.len());
        host.on_new_decision_level();
    }

    /// Undo every assignment above `target_level`.
    pub fn cancel_until(&mut self, host: &mut dyn PropagatorHost, target_level: u32) {
        if self.decision_level() <= target_level {
            return;
        }
        let lim = self.trail_lim[target_level as usize];
        let opening_decision = self.trail[lim];
        let last_lim = *self.trail_lim.last().expect("levels are open");
        for c in (lim..self.trail.len()).rev() {
            let p = self.trail[c];
            let x = p.var();
            self.assigns[x.index()] = None;
            let save = match self.config.phase_saving {
                PhaseSaving::Full => true,
                PhaseSaving::Limited => c > last_lim,
                PhaseSaving::None => false,
            };
            if save {
                self.saved_phase[x.index()] = p.sign();
            }
            self.insert_var_order(x);
        }
        self.qhead = lim;
        self.trail.truncate(lim);
        self.trail_lim.truncate(target_level as usize);
        host.on_backtrack(target_level, opening_decision);
    }

    // ======================================================================
    // Propagation
    // ======================================================================

    /// Propagate every enqueued fact, then give the host's propagators a
    /// turn, repeating until a shared fixpoint or a conflict.
    pub fn propagate(&mut self, host: &mut dyn PropagatorHost) -> Option<ClauseRef> {
        loop {
            if let Some(confl) = self.propagate_watches(host) {
                return Some(confl);
            }
            let fixpoint = self.trail.len();
            if let Some(confl) = host.propagate(self) {
                return Some(confl);
            }
            if self.trail.len() == fixpoint && self.qhead == self.trail.len() {
                return None;
            }
        }
    }

    /// One watched-literal pass over the propagation queue.
    fn propagate_watches(&mut self, host: &mut dyn PropagatorHost) -> Option<ClauseRef> {
        let mut confl: Option<ClauseRef> = None;
        let mut num_props: u64 = 0;
        self.watches.clean_all(&self.arena);

        while self.qhead < self.trail.len() {
            let p = self.trail[self.qhead];
            self.qhead += 1;
            num_props += 1;
            let false_lit = !p;

            // In-place two-index sweep. Re-watching a clause appends to some
            // other literal's list, never to this one, so the buffer behind
            // `ws` is stable for the whole sweep.
            let (ws, len) = self.watches.list_raw(p);
            let mut i = 0usize;
            let mut j = 0usize;

            while i < len {
                // SAFETY: i < len and the buffer is not reallocated (above).
                let w = unsafe { *ws.add(i) };
                i += 1;

                // Blocker short-circuit: clause already satisfied.
                if self.lit_value(w.blocker) == Some(true) {
                    self.set_decidable(host, w.blocker.var(), true);
                    // SAFETY: j < i <= len.
                    unsafe { *ws.add(j) = w };
                    j += 1;
                    continue;
                }

                let cref = w.cref;
                debug_assert!(
                    self.decidable[self.arena.lit(cref, 0).var().index()]
                        || self.decidable[self.arena.lit(cref, 1).var().index()]
                );

                // Normalize: the falsified literal sits at position 1.
                if self.arena.lit(cref, 0) == false_lit {
                    self.arena.swap_lits(cref, 0, 1);
                }
                debug_assert_eq!(self.arena.lit(cref, 1), false_lit);

                let first = self.arena.lit(cref, 0);
                let w_new = Watcher::new(cref, first);
                if first != w.blocker && self.lit_value(first) == Some(true) {
                    // SAFETY: j < i <= len.
                    unsafe { *ws.add(j) = w_new };
                    j += 1;
                    self.check_decision_vars(host, cref);
                    continue;
                }

                // Look for a replacement watch.
                let clause_len = self.arena.len(cref);
                let mut rewatched = false;
                for k in 2..clause_len {
                    let lk = self.arena.lit(cref, k);
                    if self.lit_value(lk) != Some(false) {
                        self.arena.set_lit(cref, 1, lk);
                        self.arena.set_lit(cref, k, false_lit);
                        let new_watch = !self.arena.lit(cref, 1);
                        debug_assert_ne!(new_watch, p);
                        self.watches.push(new_watch, w_new);
                        self.check_decision_vars(host, cref);
                        rewatched = true;
                        break;
                    }
                }
                if rewatched {
                    continue;
                }

                // Clause is unit under the current assignment.
                // SAFETY: j < i <= len.
                unsafe { *ws.add(j) = w_new };
                j += 1;
                if self.lit_value(first) == Some(false) {
                    confl = Some(cref);
                    self.qhead = self.trail.len();
                    // Keep the remaining watchers untouched.
                    while i < len {
                        // SAFETY: j <= i < len.
                        unsafe { *ws.add(j) = *ws.add(i) };
                        i += 1;
                        j += 1;
                    }
                } else {
                    self.unchecked_enqueue(host, first, Some(cref));
                    self.check_decision_vars(host, cref);
                }
            }
            self.watches.truncate(p, j);
        }

        self.stats.propagations += num_props;
        self.simp_db_props -= num_props as i64;
        confl
    }

    // ======================================================================
    // Conflict analysis
    // ======================================================================

    /// Derive the first-UIP clause for `confl` into `out_learnt` and return
    /// the backjump level. `out_learnt[0]` ends up as the asserting literal.
    fn analyze(
        &mut self,
        host: &mut dyn PropagatorHost,
        mut confl: ClauseRef,
        out_learnt: &mut Vec<Literal>,
    ) -> u32 {
        // The conflict may live below the current decision level when the
        // host injected it; resolution happens at the highest level actually
        // present in the clause.
        let mut align = 0;
        for &l in self.arena.lits(confl) {
            align = align.max(self.level[l.var().index()]);
        }
        debug_assert!(align <= self.decision_level());
        debug_assert!(align > 0, "conflict clause must involve a non-root level");
        self.cancel_until(host, align);

        out_learnt.clear();
        out_learnt.push(Literal(0)); // placeholder for the asserting literal

        let mut path_count: u32 = 0;
        let mut resolved: Option<Literal> = None;
        let mut index = self.trail.len();
        let mut free_implicit = false;

        loop {
            if self.arena.is_learned(confl) {
                self.cla_bump_activity(confl);
            }

            let start = if resolved.is_none() { 0 } else { 1 };
            for k in start..self.arena.len(confl) {
                let q = self.arena.lit(confl, k);
                let v = q.var();
                if !self.analyzer.is_seen(v) && self.level[v.index()] > 0 {
                    self.order.bump(v);
                    self.analyzer.mark(v);
                    if self.level[v.index()] >= self.decision_level() {
                        path_count += 1;
                    } else {
                        out_learnt.push(q);
                    }
                }
            }

            // An explanation clause is owned for exactly one resolution step.
            if free_implicit {
                self.arena.free(confl);
                free_implicit = false;
            }

            // Next literal to resolve on.
            loop {
                index -= 1;
                if self.analyzer.is_seen(self.trail[index].var()) {
                    break;
                }
            }
            let p = self.trail[index];
            resolved = Some(p);
            let mut next = self.reason[p.var().index()];
            if next.is_none() && path_count > 1 {
                // The host enqueued this literal; materialize its reason now.
                let cref = host.explanation(self, p);
                debug_assert_eq!(self.arena.lit(cref, 0), p);
                next = Some(cref);
                free_implicit = true;
            }

            self.analyzer.unmark(p.var());
            path_count -= 1;
            if path_count == 0 {
                break;
            }
            confl = next.expect("every non-UIP trail literal has a reason");
        }
        let uip = resolved.expect("conflict analysis resolved at least once");
        out_learnt[0] = !uip;

        // Minimize, then record which marks need clearing.
        self.analyzer.to_clear.clear();
        self.analyzer.to_clear.extend_from_slice(out_learnt);
        self.stats.max_literals += out_learnt.len() as u64;
        match self.config.ccmin_mode {
            CcMin::Deep => {
                let mut abstract_levels: u32 = 0;
                for &l in out_learnt[1..].iter() {
                    abstract_levels |= self.abstract_level(l.var());
                }
                let mut j = 1;
                for i in 1..out_learnt.len() {
                    let l = out_learnt[i];
                    if self.reason[l.var().index()].is_none()
                        || !self.lit_redundant(l, abstract_levels)
                    {
                        out_learnt[j] = l;
                        j += 1;
                    }
                }
                out_learnt.truncate(j);
            }
            CcMin::Basic => {
                let mut j = 1;
                for i in 1..out_learnt.len() {
                    let l = out_learnt[i];
                    match self.reason[l.var().index()] {
                        None => {
                            out_learnt[j] = l;
                            j += 1;
                        }
                        Some(cref) => {
                            for k in 1..self.arena.len(cref) {
                                let q = self.arena.lit(cref, k);
                                if !self.analyzer.is_seen(q.var())
                                    && self.level[q.var().index()] > 0
                                {
                                    out_learnt[j] = l;
                                    j += 1;
                                    break;
                                }
                            }
                        }
                    }
                }
                out_learnt.truncate(j);
            }
            CcMin::None => {}
        }
        self.stats.tot_literals += out_learnt.len() as u64;

        // Backjump level: second-highest level in the clause, moved to the
        // watch position.
        let backtrack_level = if out_learnt.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            for i in 2..out_learnt.len() {
                if self.level[out_learnt[i].var().index()]
                    > self.level[out_learnt[max_i].var().index()]
                {
                    max_i = i;
                }
            }
            out_learnt.swap(1, max_i);
            self.level[out_learnt[1].var().index()]
        };

        self.analyzer.clear_marks();
        backtrack_level
    }

    #[inline]
    fn abstract_level(&self, var: Variable) -> u32 {
        1 << (self.level[var.index()] & 31)
    }

    /// Whether `p` is implied by the rest of the learned clause together with
    /// root facts, abstracted over the clause's decision levels.
    fn lit_redundant(&mut self, p: Literal, abstract_levels: u32) -> bool {
        self.analyzer.stack.clear();
        self.analyzer.stack.push(p);
        let top = self.analyzer.to_clear.len();
        while let Some(l) = self.analyzer.stack.pop() {
            let cref = self.reason[l.var().index()].expect("redundancy candidates have reasons");
            for k in 1..self.arena.len(cref) {
                let q = self.arena.lit(cref, k);
                let v = q.var();
                if !self.analyzer.is_seen(v) && self.level[v.index()] > 0 {
                    if self.reason[v.index()].is_some()
                        && (self.abstract_level(v) & abstract_levels) != 0
                    {
                        self.analyzer.mark(v);
                        self.analyzer.stack.push(q);
                        self.analyzer.to_clear.push(q);
                    } else {
                        // Reached a literal that cannot be resolved away;
                        // undo the speculative marks.
                        for idx in top..self.analyzer.to_clear.len() {
                            let undo = self.analyzer.to_clear[idx];
                            self.analyzer.unmark(undo.var());
                        }
                        self.analyzer.to_clear.truncate(top);
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Express the current root-bound contradiction of `p` as the set of
    /// assumptions implying it.
    fn analyze_final(&mut self, p: Literal, out_conflict: &mut Vec<Literal>) {
        out_conflict.clear();
        out_conflict.push(p);

        if self.decision_level() == 0 {
            return;
        }
        self.analyzer.mark(p.var());

        for i in (self.trail_lim[0]..self.trail.len()).rev() {
            let x = self.trail[i].var();
            if !self.analyzer.is_seen(x) {
                continue;
            }
            match self.reason[x.index()] {
                None => {
                    debug_assert!(self.level[x.index()] > 0);
                    out_conflict.push(!self.trail[i]);
                }
                Some(cref) => {
                    for k in 1..self.arena.len(cref) {
                        let q = self.arena.lit(cref, k);
                        if self.level[q.var().index()] > 0 {
                            self.analyzer.mark(q.var());
                        }
                    }
                }
            }
            self.analyzer.unmark(x);
        }
        self.analyzer.unmark(p.var());
    }

    fn cla_bump_activity(&mut self, cref: ClauseRef) {
        let act = self.arena.activity(cref) + self.cla_inc as f32;
        self.arena.set_activity(cref, act);
        if act > 1e20 {
            for i in 0..self.learnts.len() {
                let c = self.learnts[i];
                let scaled = self.arena.activity(c) * 1e-20;
                self.arena.set_activity(c, scaled);
            }
            self.cla_inc *= 1e-20;
        }
    }

    fn cla_decay_activity(&mut self) {
        self.cla_inc /= self.config.clause_decay;
    }

    // ======================================================================
    // Branching
    // ======================================================================

    fn pick_branch_lit(&mut self, host: &mut dyn PropagatorHost) -> Option<Literal> {
        let mut next: Option<Variable> = None;

        // Random decision.
        if self.rng.next_f64() < self.config.random_var_freq && !self.order.is_empty() {
            let v = self.order.get(self.rng.next_below(self.order.len()));
            next = Some(v);
            if self.value(v).is_none() && self.decidable[v.index()] {
                self.stats.rnd_decisions += 1;
            }
        }

        // Activity-based decision: peek past entries that were assigned
        // since insertion, popping them as they are found stale.
        let mut start = true;
        while next.map_or(true, |v| self.value(v).is_some() || !self.decidable[v.index()]) {
            if !start {
                self.order.remove_min();
            }
            start = false;
            match self.order.peek() {
                None => {
                    next = None;
                    break;
                }
                Some(v) => next = Some(v),
            }
        }

        let mut next = next?;
        if self.config.use_custom_heuristic {
            if self.rng.next_f64() < self.custom_heur_freq {
                if self.custom_heur_freq > 0.25 {
                    self.custom_heur_freq -= 0.01;
                }
                next = host.change_branch_choice(self, next);
            }
        } else if !start {
            // The chosen top is consumed from the heap.
            self.order.remove_min();
        }

        Some(match self.user_pol[next.index()] {
            Some(pol) => Literal::signed(next, pol),
            None if self.config.rnd_pol => Literal::signed(next, self.rng.next_f64() < 0.5),
            None => Literal::signed(next, self.saved_phase[next.index()]),
        })
    }

    // ======================================================================
    // Database maintenance
    // ======================================================================

    /// Simplify the clause database against the root assignment. Must be
    /// called at level 0. Returns `false` on a root contradiction.
    pub fn simplify(&mut self, host: &mut dyn PropagatorHost) -> bool {
        debug_assert_eq!(self.decision_level(), 0);

        if !self.ok || self.propagate(host).is_some() {
            self.ok = false;
            return false;
        }

        if self.num_assigns() as i64 == self.simp_db_assigns || self.simp_db_props > 0 {
            return true;
        }

        let before = self.learnts.len() + self.clauses.len();
        self.remove_satisfied_learnts();
        if self.remove_satisfied {
            self.remove_satisfied_originals();
        }
        self.check_garbage();
        self.rebuild_order_heap();
        let after = self.learnts.len() + self.clauses.len();
        if before != after {
            debug!("simplify removed {} root-satisfied clauses", before - after);
        }

        self.simp_db_assigns = self.num_assigns() as i64;
        self.simp_db_props = (self.stats.clauses_literals + self.stats.learnts_literals) as i64;

        true
    }

    fn remove_satisfied_learnts(&mut self) {
        let mut list = std::mem::take(&mut self.learnts);
        list.retain(|&cref| {
            if self.is_satisfied(cref) {
                self.remove_clause(cref);
                false
            } else {
                true
            }
        });
        self.learnts = list;
    }

    fn remove_satisfied_originals(&mut self) {
        let mut list = std::mem::take(&mut self.clauses);
        list.retain(|&cref| {
            if self.is_satisfied(cref) {
                self.remove_clause(cref);
                false
            } else {
                true
            }
        });
        self.clauses = list;
    }

    fn rebuild_order_heap(&mut self) {
        let vars: Vec<Variable> = (0..self.num_vars() as u32)
            .map(Variable)
            .filter(|&v| self.decidable[v.index()] && self.value(v).is_none())
            .collect();
        self.order.rebuild(vars);
    }

    /// Prune roughly half of the learned clauses, keeping binary, locked,
    /// and high-activity ones.
    fn reduce_db(&mut self) {
        let extra_lim = self.cla_inc / self.learnts.len() as f64;

        // Most deletable first: long clauses before binary, low activity
        // before high.
        let arena = &self.arena;
        let deletable_before = |x: ClauseRef, y: ClauseRef| {
            arena.len(x) > 2 && (arena.len(y) == 2 || arena.activity(x) < arena.activity(y))
        };
        self.learnts.sort_by(|&x, &y| {
            if deletable_before(x, y) {
                std::cmp::Ordering::Less
            } else if deletable_before(y, x) {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        });

        let half = self.learnts.len() / 2;
        let mut j = 0;
        for i in 0..self.learnts.len() {
            let cref = self.learnts[i];
            if self.arena.len(cref) > 2
                && !self.locked(cref)
                && (i < half || (self.arena.activity(cref) as f64) < extra_lim)
            {
                self.remove_clause(cref);
            } else {
                self.learnts[j] = cref;
                j += 1;
            }
        }
        let removed = self.learnts.len() - j;
        self.learnts.truncate(j);
        trace!("reduce_db removed {} learned clauses, {} kept", removed, j);
        self.check_garbage();
    }

    // ======================================================================
    // Garbage collection
    // ======================================================================

    fn check_garbage(&mut self) {
        if self.arena.wasted() as f64 > self.arena.size() as f64 * self.config.garbage_frac {
            self.garbage_collect();
        }
    }

    fn garbage_collect(&mut self) {
        // Size the fresh arena to the live payload so relocation does not
        // itself trigger growth.
        let mut to = ClauseArena::with_capacity(self.arena.size() - self.arena.wasted());
        self.reloc_all(&mut to);
        debug!(
            "garbage collected clause arena: {} -> {} words",
            self.arena.size(),
            to.size()
        );
        self.arena = to;
    }

    fn reloc_all(&mut self, to: &mut ClauseArena) {
        // Watcher lists must not refer to dead clauses while relocating.
        self.watches.clean_all(&self.arena);
        let arena = &mut self.arena;
        self.watches.for_each_watcher_mut(|w| {
            w.cref = arena.reloc(w.cref, to);
        });

        // Reasons: only those still justifying an assignment. The reloced
        // test must come first, the forwarding ref has overwritten the
        // literal `locked` would read.
        for i in 0..self.trail.len() {
            let v = self.trail[i].var();
            if let Some(cref) = self.reason[v.index()] {
                if self.arena.is_reloced(cref) || self.locked(cref) {
                    self.reason[v.index()] = Some(self.arena.reloc(cref, to));
                }
            }
        }

        for i in 0..self.learnts.len() {
            let cref = self.learnts[i];
            self.learnts[i] = self.arena.reloc(cref, to);
        }
        for i in 0..self.clauses.len() {
            let cref = self.clauses[i];
            self.clauses[i] = self.arena.reloc(cref, to);
        }
    }

    // ======================================================================
    // Search
    // ======================================================================

    /// Search until `nof_conflicts` conflicts (negative for unlimited), a
    /// model, or unsatisfiability. `Some(true)`: every decidable variable is
    /// assigned and the host accepted the assignment. `None`: budget reached.
    fn search(
        &mut self,
        host: &mut dyn PropagatorHost,
        nof_conflicts: i64,
        nosearch: bool,
    ) -> Option<bool> {
        debug_assert!(self.ok);
        let mut conflict_count: i64 = 0;
        let mut learnt_clause: Vec<Literal> = Vec::new();
        let mut carried_conflict: Option<ClauseRef> = None;
        self.stats.starts += 1;

        loop {
            if self.interrupt_requested {
                return None;
            }
            if !self.ok {
                return Some(false);
            }
            let confl = match carried_conflict.take() {
                Some(cref) => Some(cref),
                None => self.propagate(host),
            };
            if !self.ok {
                return Some(false);
            }

            if let Some(confl) = confl {
                // CONFLICT
                self.stats.conflicts += 1;
                conflict_count += 1;
                if self.decision_level() == 0 {
                    return Some(false);
                }

                let backtrack_level = self.analyze(host, confl, &mut learnt_clause);
                self.cancel_until(host, backtrack_level);

                if learnt_clause.len() == 1 {
                    self.unchecked_enqueue(host, learnt_clause[0], None);
                } else {
                    let cref = self.arena.alloc(&learnt_clause, true);
                    self.add_to_clauses(host, cref, true);
                    self.attach_clause(host, cref);
                    self.cla_bump_activity(cref);
                    self.unchecked_enqueue(host, learnt_clause[0], Some(cref));
                }

                self.order.decay();
                self.cla_decay_activity();

                self.learntsize_adjust_cnt -= 1;
                if self.learntsize_adjust_cnt == 0 {
                    self.learntsize_adjust_confl *= self.config.learntsize_adjust_inc;
                    self.learntsize_adjust_cnt = self.learntsize_adjust_confl as i64;
                    self.max_learnts *= self.config.learntsize_inc;
                    debug!(
                        "{} conflicts, {} learned clauses, limit {:.0}",
                        self.stats.conflicts,
                        self.learnts.len(),
                        self.max_learnts
                    );
                }
            } else {
                // NO CONFLICT
                if (nof_conflicts >= 0 && conflict_count >= nof_conflicts) || !self.within_budget()
                {
                    self.progress = self.compute_progress();
                    self.cancel_until(host, 0);
                    return None;
                }

                if self.decision_level() == 0 && !self.simplify(host) {
                    return Some(false);
                }

                if self.learnts.len() as f64 - self.num_assigns() as f64 >= self.max_learnts {
                    self.reduce_db();
                }

                let mut next: Option<Literal> = None;
                while (self.decision_level() as usize) < self.assumptions.len() {
                    let p = self.assumptions[self.decision_level() as usize];
                    match self.lit_value(p) {
                        Some(true) => {
                            // Already satisfied: open a dummy level.
                            self.new_decision_level(host);
                        }
                        Some(false) => {
                            let mut conflict = std::mem::take(&mut self.conflict);
                            self.analyze_final(!p, &mut conflict);
                            self.conflict = conflict;
                            return Some(false);
                        }
                        None => {
                            next = Some(p);
                            break;
                        }
                    }
                }

                if next.is_none() {
                    if nosearch {
                        return Some(true);
                    }
                    self.stats.decisions += 1;
                    next = self.pick_branch_lit(host);
                    if next.is_none() {
                        // Total over decidable variables; let the host judge.
                        let host_confl = host.check_full_assignment(self);
                        if !self.order.is_empty() || self.qhead != self.trail.len() {
                            // The host backtracked or enqueued; resume the
                            // loop and drop its conflict, propagation will
                            // rediscover anything real.
                            continue;
                        }
                        match host_confl {
                            None => return Some(true),
                            Some(cref) => {
                                carried_conflict = Some(cref);
                                continue;
                            }
                        }
                    }
                }

                let next = next.expect("a branching literal was selected");
                self.new_decision_level(host);
                self.unchecked_enqueue(host, next, None);
            }
        }
    }

    /// Run the restart loop under the given assumptions.
    ///
    /// With `nosearch`, return right after initial propagation and root
    /// simplification without branching; a `Sat` outcome then only means "no
    /// contradiction yet" and carries the partial root assignment.
    pub fn solve(
        &mut self,
        host: &mut dyn PropagatorHost,
        assumptions: &[Literal],
        nosearch: bool,
    ) -> SolveResult {
        self.conflict.clear();
        if !self.ok {
            return SolveResult::Unsat(Vec::new());
        }
        self.cancel_until(host, 0);
        self.assumptions = assumptions.to_vec();
        self.stats.solves += 1;

        self.max_learnts = self.clauses.len() as f64 * self.config.learntsize_factor;
        self.learntsize_adjust_confl = self.config.learntsize_adjust_start;
        self.learntsize_adjust_cnt = self.learntsize_adjust_confl as i64;

        let mut status: Option<bool> = None;
        let mut curr_restarts: u32 = 0;
        while status.is_none() {
            if self.interrupt_requested {
                return SolveResult::Undef;
            }
            let rest_base = if self.config.luby_restart {
                luby(self.config.restart_inc, curr_restarts as i32)
            } else {
                self.config.restart_inc.powi(curr_restarts as i32)
            };
            let budget = (rest_base * self.config.restart_first as f64) as i64;
            status = self.search(host, budget, nosearch);
            if self.interrupt_requested {
                return SolveResult::Undef;
            }
            if nosearch {
                break;
            }
            if !self.within_budget() {
                break;
            }
            curr_restarts += 1;
        }

        let result = match status {
            Some(true) => {
                debug_assert!(nosearch || self.full_model_is_consistent());
                SolveResult::Sat(self.assigns.clone())
            }
            Some(false) => {
                if self.conflict.is_empty() {
                    self.ok = false;
                }
                SolveResult::Unsat(self.conflict.clone())
            }
            None => SolveResult::Undef,
        };
        debug!(
            "solve finished: {} after {} conflicts, {} restarts",
            match &result {
                SolveResult::Sat(_) => "SAT",
                SolveResult::Unsat(_) => "UNSAT",
                SolveResult::Undef => "UNDEF",
            },
            self.stats.conflicts,
            self.stats.starts
        );
        result
    }

    /// Run root propagation and simplification after intake, then notify the
    /// host. Returns `false` if the database is already contradictory.
    pub fn finish_parsing(&mut self, host: &mut dyn PropagatorHost) -> bool {
        debug_assert_eq!(self.decision_level(), 0);
        let ok = self.simplify(host);
        host.on_finish_parsing();
        ok
    }

    /// Every original clause is satisfied and carries a non-false decidable
    /// literal among its watches.
    fn full_model_is_consistent(&self) -> bool {
        self.clauses.iter().all(|&cref| {
            let satisfied = self.is_satisfied(cref);
            let witnessed = self.arena.lits(cref).iter().any(|&l| {
                self.lit_value(l) != Some(false) && self.decidable[l.var().index()]
            });
            satisfied && witnessed
        })
    }

    fn compute_progress(&self) -> f64 {
        let n = self.num_vars() as f64;
        if n == 0.0 {
            return 0.0;
        }
        let f = 1.0 / n;
        let mut progress = 0.0;
        for i in 0..=self.decision_level() as usize {
            let beg = if i == 0 { 0 } else { self.trail_lim[i - 1] };
            let end = if i == self.decision_level() as usize {
                self.trail.len()
            } else {
                self.trail_lim[i]
            };
            progress += f.powi(i as i32) * (end - beg) as f64;
        }
        progress / n
    }

    // ======================================================================
    // Root-state snapshots
    // ======================================================================

    /// Snapshot the root-level state so intake-phase changes can be rolled
    /// back with [`Solver::reset_state`]. Disables satisfied-clause removal
    /// while the snapshot is outstanding, since removed clauses could not be
    /// restored.
    pub fn save_state(&mut self) {
        self.saved = Some(SavedState {
            ok: self.ok,
            level: self.decision_level(),
            clauses_len: self.clauses.len(),
            qhead: self.qhead,
            trail: self.trail.clone(),
            trail_lim: self.trail_lim.clone(),
        });
        self.remove_satisfied = false;
    }

    /// Roll back to the last [`Solver::save_state`] snapshot: undo newer
    /// assignments, drop clauses added since, and forget all learned clauses.
    pub fn reset_state(&mut self, host: &mut dyn PropagatorHost) {
        let Some(saved) = self.saved.clone() else {
            return;
        };
        self.ok = saved.ok;
        self.cancel_until(host, saved.level);

        // Root enqueues made after the snapshot are not covered by the
        // cancellation; undo them explicitly.
        while self.trail.len() > saved.trail.len() {
            let p = self.trail.pop().expect("trail is longer than the snapshot");
            let v = p.var();
            self.assigns[v.index()] = None;
            self.reason[v.index()] = None;
            self.insert_var_order(v);
        }
        self.qhead = saved.qhead.min(self.trail.len());
        self.trail_lim = saved.trail_lim.clone();

        while self.clauses.len() > saved.clauses_len {
            let cref = self.clauses.pop().expect("clauses added since snapshot");
            self.remove_clause(cref);
        }
        while let Some(cref) = self.learnts.pop() {
            self.remove_clause(cref);
        }
    }
}

/// Luby restart sequence element `x`, scaled by `y^k`:
/// 1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8, ...
fn luby(y: f64, x: i32) -> f64 {
    // Find the finite subsequence containing x and its size.
    let mut size = 1i32;
    let mut seq = 0i32;
    while size < x + 1 {
        seq += 1;
        size = 2 * size + 1;
    }
    let mut x = x;
    while size - 1 != x {
        size = (size - 1) >> 1;
        seq -= 1;
        x %= size;
    }
    y.powi(seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::SolitaryHost;
    use proptest::prelude::*;

    /// Build a solver with `n` decidable variables.
    fn solver_with_vars(n: usize) -> (Solver, SolitaryHost) {
        let mut host = SolitaryHost;
        let mut solver = Solver::new(SolverConfig::default());
        for _ in 0..n {
            solver.new_var(&mut host, None, true);
        }
        (solver, host)
    }

    /// DIMACS-style clause entry: positive n is variable n-1, negative is its
    /// negation.
    fn add(solver: &mut Solver, host: &mut SolitaryHost, lits: &[i32]) -> bool {
        let lits: Vec<Literal> = lits
            .iter()
            .map(|&i| Literal::signed(Variable(i.unsigned_abs() - 1), i < 0))
            .collect();
        solver.add_clause(host, &lits)
    }

    fn lit(i: i32) -> Literal {
        Literal::signed(Variable(i.unsigned_abs() - 1), i < 0)
    }

    #[test]
    fn luby_first_values() {
        let expected = [1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 4.0, 1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 4.0, 8.0];
        for (x, &want) in expected.iter().enumerate() {
            assert_eq!(luby(2.0, x as i32), want, "luby(2, {})", x);
        }
    }

    #[test]
    fn unit_intake_contradiction() {
        let (mut solver, mut host) = solver_with_vars(1);
        assert!(add(&mut solver, &mut host, &[1]));
        assert!(!add(&mut solver, &mut host, &[-1]));
        assert!(!solver.okay());
        let result = solver.solve(&mut host, &[], false);
        assert_eq!(result, SolveResult::Unsat(Vec::new()));
    }

    #[test]
    fn chain_propagation_model() {
        let (mut solver, mut host) = solver_with_vars(3);
        add(&mut solver, &mut host, &[1, 2]);
        add(&mut solver, &mut host, &[-1, 3]);
        add(&mut solver, &mut host, &[-2, -3]);
        add(&mut solver, &mut host, &[-3]);
        match solver.solve(&mut host, &[], false) {
            SolveResult::Sat(model) => {
                assert_eq!(model[0], Some(false));
                assert_eq!(model[1], Some(true));
                assert_eq!(model[2], Some(false));
            }
            other => panic!("expected SAT, got {:?}", other),
        }
    }

    #[test]
    fn conflict_learning_solves_parity() {
        // All four sign combinations over two variables: unsatisfiable, but
        // only after at least one conflict and one learned clause.
        let (mut solver, mut host) = solver_with_vars(2);
        add(&mut solver, &mut host, &[1, 2]);
        add(&mut solver, &mut host, &[1, -2]);
        add(&mut solver, &mut host, &[-1, 2]);
        add(&mut solver, &mut host, &[-1, -2]);
        let result = solver.solve(&mut host, &[], false);
        assert!(result.is_unsat());
        assert!(solver.stats().conflicts > 0);
    }

    #[test]
    fn assumption_only_unsat_reports_core() {
        let (mut solver, mut host) = solver_with_vars(3);
        add(&mut solver, &mut host, &[-1, 2]);
        add(&mut solver, &mut host, &[-2, 3]);
        match solver.solve(&mut host, &[lit(1), lit(-3)], false) {
            SolveResult::Unsat(conflict) => {
                assert!(!conflict.is_empty());
                for l in &conflict {
                    assert!(
                        *l == lit(-1) || *l == lit(3),
                        "unexpected conflict literal {}",
                        l
                    );
                }
                // The formula itself is satisfiable.
                assert!(solver.okay());
            }
            other => panic!("expected UNSAT under assumptions, got {:?}", other),
        }
        // Without the assumptions the formula remains satisfiable.
        assert!(solver.solve(&mut host, &[], false).is_sat());
    }

    #[test]
    fn assumption_already_true_short_circuits() {
        let (mut solver, mut host) = solver_with_vars(1);
        add(&mut solver, &mut host, &[1]);
        match solver.solve(&mut host, &[lit(1)], false) {
            SolveResult::Sat(model) => assert_eq!(model[0], Some(true)),
            other => panic!("expected SAT, got {:?}", other),
        }
    }

    #[test]
    fn zero_conflict_budget_returns_undef() {
        let (mut solver, mut host) = solver_with_vars(2);
        add(&mut solver, &mut host, &[1, 2]);
        add(&mut solver, &mut host, &[1, -2]);
        add(&mut solver, &mut host, &[-1, 2]);
        add(&mut solver, &mut host, &[-1, -2]);
        solver.set_conflict_budget(0);
        let result = solver.solve(&mut host, &[], false);
        assert_eq!(result, SolveResult::Undef);
        assert!(solver.okay());
        // Lifting the budget solves the instance.
        solver.budget_off();
        assert!(solver.solve(&mut host, &[], false).is_unsat());
    }

    #[test]
    fn interrupt_returns_undef_and_is_clearable() {
        let (mut solver, mut host) = solver_with_vars(2);
        add(&mut solver, &mut host, &[1, 2]);
        solver.interrupt();
        assert_eq!(solver.solve(&mut host, &[], false), SolveResult::Undef);
        solver.clear_interrupt();
        assert!(solver.solve(&mut host, &[], false).is_sat());
    }

    #[test]
    fn user_polarity_pins_branching_sign() {
        let mut host = SolitaryHost;
        let mut solver = Solver::new(SolverConfig::default());
        // Sign false prefers the positive literal, sign true the negative.
        let a = solver.new_var(&mut host, Some(false), true);
        let b = solver.new_var(&mut host, Some(true), true);
        match solver.solve(&mut host, &[], false) {
            SolveResult::Sat(model) => {
                assert_eq!(model[a.index()], Some(true));
                assert_eq!(model[b.index()], Some(false));
            }
            other => panic!("expected SAT, got {:?}", other),
        }
    }

    #[test]
    fn default_phase_branches_negative() {
        let (mut solver, mut host) = solver_with_vars(1);
        add(&mut solver, &mut host, &[1, -1]);
        match solver.solve(&mut host, &[], false) {
            SolveResult::Sat(model) => assert_eq!(model[0], Some(false)),
            other => panic!("expected SAT, got {:?}", other),
        }
    }

    #[test]
    fn undecidable_watch_is_promoted() {
        // Both variables start undecidable; the guard must promote one, or
        // search would declare a model without looking at the clause.
        let mut host = SolitaryHost;
        let mut solver = Solver::new(SolverConfig::default());
        let a = solver.new_var(&mut host, None, false);
        let b = solver.new_var(&mut host, None, false);
        assert!(solver.add_clause(
            &mut host,
            &[Literal::positive(a), Literal::positive(b)]
        ));
        assert!(solver.is_decidable(a) || solver.is_decidable(b));
        match solver.solve(&mut host, &[], false) {
            SolveResult::Sat(model) => {
                assert!(model[a.index()] == Some(true) || model[b.index()] == Some(true));
            }
            other => panic!("expected SAT, got {:?}", other),
        }
    }

    #[test]
    fn nosearch_stops_before_branching() {
        let (mut solver, mut host) = solver_with_vars(2);
        add(&mut solver, &mut host, &[1, 2]);
        let result = solver.solve(&mut host, &[], true);
        assert!(result.is_sat());
        assert_eq!(solver.stats().decisions, 0);
        assert_eq!(solver.value(Variable(0)), None);
        assert_eq!(solver.value(Variable(1)), None);
    }

    #[test]
    fn save_and_reset_state_roll_back_intake() {
        let (mut solver, mut host) = solver_with_vars(2);
        add(&mut solver, &mut host, &[1, 2]);
        solver.save_state();
        add(&mut solver, &mut host, &[-1]);
        add(&mut solver, &mut host, &[-2]);
        assert!(!solver.okay());
        solver.reset_state(&mut host);
        assert!(solver.okay());
        assert_eq!(solver.num_clauses(), 1);
        assert!(solver.solve(&mut host, &[], false).is_sat());
    }

    #[test]
    fn simplify_watermarks_make_second_pass_a_noop() {
        let (mut solver, mut host) = solver_with_vars(3);
        add(&mut solver, &mut host, &[1]);
        add(&mut solver, &mut host, &[1, 2, 3]);
        assert!(solver.simplify(&mut host));
        let clauses_after_first = solver.num_clauses();
        let props_after_first = solver.stats().propagations;
        assert!(solver.simplify(&mut host));
        assert_eq!(solver.num_clauses(), clauses_after_first);
        assert_eq!(solver.stats().propagations, props_after_first);
    }

    #[test]
    fn decisions_lists_open_levels() {
        let (mut solver, mut host) = solver_with_vars(3);
        add(&mut solver, &mut host, &[1, 2, 3]);
        // Assumptions open one level each.
        let result = solver.solve(&mut host, &[lit(1), lit(2)], false);
        assert!(result.is_sat());
        let decisions = solver.decisions();
        assert!(decisions.contains(&lit(1)));
        assert!(decisions.contains(&lit(2)));
    }

    /// Deterministic pseudo-random CNF; the same seed yields the same formula.
    fn random_formula(num_vars: u32, num_clauses: usize, seed: u64) -> Vec<Vec<i32>> {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };
        let mut formula = Vec::with_capacity(num_clauses);
        for _ in 0..num_clauses {
            let mut clause = Vec::with_capacity(3);
            for _ in 0..3 {
                let v = (next() % num_vars as u64) as i32 + 1;
                let neg = next() % 2 == 0;
                clause.push(if neg { -v } else { v });
            }
            formula.push(clause);
        }
        formula
    }

    fn solve_formula(formula: &[Vec<i32>], num_vars: usize, config: SolverConfig) -> (SolveResult, Stats) {
        let mut host = SolitaryHost;
        let mut solver = Solver::new(config);
        for _ in 0..num_vars {
            solver.new_var(&mut host, None, true);
        }
        for clause in formula {
            if !add(&mut solver, &mut host, clause) {
                break;
            }
        }
        let result = solver.solve(&mut host, &[], false);
        (result, solver.stats().clone())
    }

    proptest! {
        /// A SAT answer is backed by a model satisfying every clause.
        #[test]
        fn prop_sat_models_are_sound(seed in 0u64..400) {
            let formula = random_formula(12, 40, seed);
            let (result, _) = solve_formula(&formula, 12, SolverConfig::default());
            if let SolveResult::Sat(model) = result {
                for clause in &formula {
                    let satisfied = clause.iter().any(|&i| {
                        let value = model[(i.unsigned_abs() - 1) as usize];
                        if i > 0 { value == Some(true) } else { value == Some(false) }
                    });
                    prop_assert!(satisfied, "clause {:?} unsatisfied", clause);
                }
            }
        }

        /// Identical runs are bit-for-bit identical in outcome and effort.
        #[test]
        fn prop_fixed_seed_is_deterministic(seed in 0u64..100) {
            let formula = random_formula(10, 35, seed);
            let mut config = SolverConfig::default();
            config.random_var_freq = 0.2;
            let (r1, s1) = solve_formula(&formula, 10, config.clone());
            let (r2, s2) = solve_formula(&formula, 10, config);
            prop_assert_eq!(r1, r2);
            prop_assert_eq!(s1.conflicts, s2.conflicts);
            prop_assert_eq!(s1.decisions, s2.decisions);
            prop_assert_eq!(s1.propagations, s2.propagations);
        }

        /// Forcing a garbage collection on every sweep never changes the
        /// outcome.
        #[test]
        fn prop_gc_preserves_outcome(seed in 0u64..60) {
            let formula = random_formula(10, 42, seed);
            let (r1, _) = solve_formula(&formula, 10, SolverConfig::default());
            let mut config = SolverConfig::default();
            config.garbage_frac = 0.0;
            let (r2, _) = solve_formula(&formula, 10, config);
            prop_assert_eq!(r1.is_sat(), r2.is_sat());
            prop_assert_eq!(r1.is_unsat(), r2.is_unsat());
        }

        /// Unit clauses always survive into the model.
        #[test]
        fn prop_unit_clause_respected(var_idx in 0u32..8) {
            let (mut solver, mut host) = solver_with_vars(8);
            let unit = Literal::positive(Variable(var_idx));
            solver.add_clause(&mut host, &[unit]);
            add(&mut solver, &mut host, &[1, 2, 3]);
            if let SolveResult::Sat(model) = solver.solve(&mut host, &[], false) {
                prop_assert_eq!(model[var_idx as usize], Some(true));
            }
        }
    }

    #[test]
    fn ccmin_modes_agree_on_outcome() {
        for seed in [3u64, 17, 41] {
            let formula = random_formula(14, 58, seed);
            let mut outcomes = Vec::new();
            for mode in [CcMin::None, CcMin::Basic, CcMin::Deep] {
                let mut config = SolverConfig::default();
                config.ccmin_mode = mode;
                let (result, _) = solve_formula(&formula, 14, config);
                outcomes.push(result.is_sat());
            }
            assert_eq!(outcomes[0], outcomes[1]);
            assert_eq!(outcomes[1], outcomes[2]);
        }
    }

    #[test]
    fn minimization_never_grows_clauses() {
        let formula = random_formula(16, 70, 5);
        let (_, stats) = solve_formula(&formula, 16, SolverConfig::default());
        assert!(stats.tot_literals <= stats.max_literals);
    }

    #[test]
    fn geometric_restarts_reach_same_outcome() {
        let formula = random_formula(12, 50, 9);
        let (luby_result, _) = solve_formula(&formula, 12, SolverConfig::default());
        let mut config = SolverConfig::default();
        config.luby_restart = false;
        let (geo_result, _) = solve_formula(&formula, 12, config);
        assert_eq!(luby_result.is_sat(), geo_result.is_sat());
    }

    #[test]
    fn stats_display_is_humane() {
        let (mut solver, mut host) = solver_with_vars(2);
        add(&mut solver, &mut host, &[1, 2]);
        solver.solve(&mut host, &[], false);
        let text = solver.stats().to_string();
        assert!(text.contains("conflicts"));
        assert!(text.contains("decisions"));
    }
}
