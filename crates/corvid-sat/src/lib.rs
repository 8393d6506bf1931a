//! Corvid SAT - the CDCL core of the corvid propagator framework
//!
//! A Conflict-Driven Clause Learning engine designed to run embedded inside a
//! larger propagator framework. The enclosing framework may own further
//! propagators; it talks to this core exclusively through the
//! [`PropagatorHost`] callback surface.
//!
//! ## Core features
//! - 2-watched literal scheme with blocker literals for unit propagation
//! - Activity-based (VSIDS) branching with decay and phase saving
//! - First-UIP conflict analysis with self-subsuming clause minimization
//! - Luby and geometric restart schedules
//! - Periodic learned-clause database reduction
//! - Packed clause arena with relocating garbage collection
//! - Assumption-based solving with final-conflict extraction
//!
//! ## Host integration
//! - Decision-variable guard: every clause keeps a decidable, non-false
//!   watched literal so a total assignment over decidable variables is a model
//! - Lazy explanations for literals propagated by the host
//! - Full-assignment check before a model is reported
//! - Optional host override of the branching choice

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arena;
pub mod conflict;
pub mod config;
pub mod dimacs;
pub mod hooks;
pub mod literal;
pub mod order;
pub mod rng;
pub mod solver;
pub mod watch;

pub use arena::{ClauseArena, ClauseRef};
pub use config::{CcMin, PhaseSaving, SolverConfig};
pub use dimacs::DimacsError;
pub use hooks::{PropagatorHost, SolitaryHost};
pub use literal::{Literal, Variable};
pub use solver::{SolveResult, Solver, Stats};
