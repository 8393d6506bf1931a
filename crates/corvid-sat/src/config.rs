//! Solver configuration

/// Conflict-clause minimization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcMin {
    /// Keep the first-UIP clause as derived.
    None,
    /// Drop literals whose whole reason is already in the clause or at root.
    Basic,
    /// Recursive self-subsuming resolution with level-set abstraction.
    Deep,
}

/// Phase-saving policy applied when assignments are undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseSaving {
    /// Never save polarities.
    None,
    /// Save only across the most recently opened level.
    Limited,
    /// Save every undone polarity.
    Full,
}

/// Tunable parameters of the search.
///
/// The defaults are the classic CDCL values; hosts normally override only the
/// budgets and the custom-heuristic toggle.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Inverse growth rate of the variable activity increment.
    pub var_decay: f64,
    /// Inverse growth rate of the clause activity increment.
    pub clause_decay: f64,
    /// Probability that a decision picks a random heap entry first.
    pub random_var_freq: f64,
    /// Seed for the deterministic PRNG.
    pub random_seed: f64,
    /// Conflict-clause minimization mode.
    pub ccmin_mode: CcMin,
    /// Phase-saving policy.
    pub phase_saving: PhaseSaving,
    /// Pick decision polarities at random.
    pub rnd_pol: bool,
    /// Give fresh variables a small random initial activity.
    pub rnd_init_act: bool,
    /// Wasted-fraction of the clause arena that triggers garbage collection.
    pub garbage_frac: f64,
    /// Use the Luby restart schedule instead of the geometric one.
    pub luby_restart: bool,
    /// Base restart interval in conflicts.
    pub restart_first: u32,
    /// Restart interval growth factor.
    pub restart_inc: f64,
    /// Initial learned-clause limit as a fraction of the formula size.
    pub learntsize_factor: f64,
    /// Growth factor of the learned-clause limit.
    pub learntsize_inc: f64,
    /// Conflicts before the learned-clause limit first grows.
    pub learntsize_adjust_start: f64,
    /// Growth factor of the adjustment interval itself.
    pub learntsize_adjust_inc: f64,
    /// Consult the host for branching overrides.
    pub use_custom_heuristic: bool,
    /// Initial probability of consulting the host override; decays in use.
    pub custom_heur_freq: f64,
    /// Allow simplification to drop root-satisfied original clauses.
    pub remove_satisfied: bool,
    /// Total conflicts before search surrenders; negative means unlimited.
    pub conflict_budget: i64,
    /// Total propagations before search surrenders; negative means unlimited.
    pub propagation_budget: i64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            var_decay: 0.95,
            clause_decay: 0.999,
            random_var_freq: 0.0,
            random_seed: 91648253.0,
            ccmin_mode: CcMin::Deep,
            phase_saving: PhaseSaving::Full,
            rnd_pol: false,
            rnd_init_act: false,
            garbage_frac: 0.20,
            luby_restart: true,
            restart_first: 100,
            restart_inc: 2.0,
            learntsize_factor: 1.0 / 3.0,
            learntsize_inc: 1.1,
            learntsize_adjust_start: 100.0,
            learntsize_adjust_inc: 1.5,
            use_custom_heuristic: false,
            custom_heur_freq: 0.75,
            remove_satisfied: true,
            conflict_budget: -1,
            propagation_budget: -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = SolverConfig::default();
        assert_eq!(cfg.var_decay, 0.95);
        assert_eq!(cfg.clause_decay, 0.999);
        assert_eq!(cfg.random_var_freq, 0.0);
        assert_eq!(cfg.random_seed, 91648253.0);
        assert_eq!(cfg.ccmin_mode, CcMin::Deep);
        assert_eq!(cfg.phase_saving, PhaseSaving::Full);
        assert!(!cfg.rnd_pol);
        assert!(!cfg.rnd_init_act);
        assert_eq!(cfg.garbage_frac, 0.20);
        assert!(cfg.luby_restart);
        assert_eq!(cfg.restart_first, 100);
        assert_eq!(cfg.restart_inc, 2.0);
        assert_eq!(cfg.conflict_budget, -1);
        assert_eq!(cfg.propagation_budget, -1);
    }
}
