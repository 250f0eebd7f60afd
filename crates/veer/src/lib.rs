#![forbid(unsafe_code)]

//! Veer public facade crate.
//!
//! Lays an interactive surface out with a declarative linear-constraint
//! system while letting individual coordinates be driven by physically
//! modeled motion — springs, friction, gravity — in response to gestures,
//! with physically plausible recovery when a motion constraint is violated.
//!
//! This crate re-exports the common surface from the internal crates; most
//! scenes only need [`MotionContext`], [`Manipulator`], [`MotionConstraint`]
//! and a handful of physics models.
//!
//! # A bounded, draggable value
//!
//! ```
//! use veer::{Axis, Manipulator, MotionConstraint, MotionContext, Op, Velocity};
//!
//! let mut context = MotionContext::new();
//! let x = context.system_mut().variable("x");
//! context.add_motion_constraint(MotionConstraint::new(x, Op::GreaterEq(0.0)));
//! context.add_motion_constraint(MotionConstraint::new(x, Op::LessEq(300.0)));
//! let handle = context.add_manipulator(Manipulator::new(x, Axis::X)).unwrap();
//!
//! // Host input loop: route pointer events, advance once per frame.
//! context.pointer_start(handle);
//! context.pointer_move(handle, -40.0, 0.0);
//! context.pointer_end(handle, Velocity::default());
//! while !context.is_settled() {
//!     context.advance(1.0 / 60.0);
//! }
//! assert!(context.system().value(x).abs() < 0.01);
//! ```

// --- Solver re-exports -----------------------------------------------------

pub use veer_solver::{
    ConstraintId, ConstraintSystem, EditRecord, LinExpr, MultiEditSession, Rel, SolverError,
    Strength, Variable,
};

// --- Physics re-exports ----------------------------------------------------

pub use veer_physics::{
    Fall, FrameDriver, Friction, Gravity, GravityWithBounce, Motion, ParamSpec, Sample, Spring,
    Timeline, Tunable,
};

// --- Motion re-exports -----------------------------------------------------

pub use veer_motion::{
    Anchor, Axis, Frame, Manipulator, ManipulatorId, MotionConstraint, MotionConstraintId,
    MotionContext, Op, Pane, PaneId, PointerTracker, RenderTarget, Velocity, Violation,
};
