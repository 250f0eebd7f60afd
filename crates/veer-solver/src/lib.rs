#![forbid(unsafe_code)]

//! Incremental linear-constraint solving for gesture-driven layout.
//!
//! [`ConstraintSystem`] wraps the `cassowary` solver with named variables, a
//! solved-value cache, stay emulation and a single-slot edit batch.
//! [`MultiEditSession`] multiplexes that single slot so any number of
//! independent callers can each hold an edit on a distinct variable at the
//! same time — the session tears the batch down and replays every recorded
//! suggestion whenever the set of edited variables changes.
//!
//! The solver re-solves incrementally on every suggestion; a full rebuild
//! only happens when edit membership changes, never on ordinary moves.

pub mod error;
pub mod session;
pub mod system;

pub use error::SolverError;
pub use session::{EditRecord, MultiEditSession};
pub use system::{ConstraintId, ConstraintSystem, LinExpr, Rel, Strength, Variable};
