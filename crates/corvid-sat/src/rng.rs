//! Deterministic pseudo-random numbers for search decisions
//!
//! Clause intake permutes literal order, branching occasionally picks a random
//! variable, and the decision-variable guard breaks ties randomly. All of
//! these must be reproducible run-to-run under a fixed seed, so the generator
//! is a small hand-rolled Lehmer-style recurrence rather than a system RNG.

/// Multiplicative congruential generator over a floating-point state.
///
/// The recurrence and constants follow the classic SAT-solver `drand`:
/// `seed = (seed * 1389796) mod 2147483647`, scaled into `[0, 1)`.
#[derive(Debug, Clone)]
pub struct SeedRng {
    seed: f64,
}

impl SeedRng {
    /// Create a generator from a non-zero seed.
    pub fn new(seed: f64) -> Self {
        debug_assert!(seed > 0.0, "seed must be positive");
        SeedRng { seed }
    }

    /// Next value in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.seed *= 1389796.0;
        let q = (self.seed / 2147483647.0) as i64;
        self.seed -= q as f64 * 2147483647.0;
        self.seed / 2147483647.0
    }

    /// Uniform integer in `[0, bound)`.
    #[inline]
    pub fn next_below(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0);
        (self.next_f64() * bound as f64) as usize
    }
}
