#![forbid(unsafe_code)]

//! Motion constraints, manipulators and the per-frame motion context.
//!
//! This crate ties the other two together: solver variables laid out by
//! linear constraints ([`veer_solver`]) get physically plausible behavior
//! ([`veer_physics`]) in response to gestures.
//!
//! - A [`MotionConstraint`](constraint::MotionConstraint) is a *soft runtime
//!   bound* on one variable — unlike a layout constraint it is allowed to be
//!   violated, and a violation triggers corrective motion instead of a snap.
//! - A [`Manipulator`](manipulator::Manipulator) owns one variable's gesture
//!   life cycle: drag edits, momentum after release, recovery animation when
//!   a motion constraint is hit.
//! - The [`MotionContext`](context::MotionContext) runs the show once per
//!   frame: evaluate constraints, attribute each violation to the gestures
//!   that caused it, dispatch, then refresh every registered pane.
//!
//! Everything is single-threaded and frame-synchronous; the host calls
//! [`MotionContext::advance`](context::MotionContext::advance) from its
//! next-frame callback and routes pointer input through the context.

pub mod constraint;
pub mod context;
pub mod gesture;
pub mod manipulator;
pub mod pane;

pub use constraint::{MotionConstraint, MotionConstraintId, Op};
pub use context::{ManipulatorId, MotionContext, PaneId};
pub use gesture::{PointerTracker, Velocity};
pub use manipulator::{Axis, Manipulator, Violation};
pub use pane::{Anchor, Frame, Pane, RenderTarget};
