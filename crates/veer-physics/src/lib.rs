#![forbid(unsafe_code)]

//! Closed-form physics models for gesture-driven motion.
//!
//! Every model in this crate is deterministic and time-parameterized: position
//! and velocity are exact symbolic solutions sampled at a timeline instant,
//! never the output of a numerical integrator. That keeps long animations free
//! of accumulated error and makes mid-flight reconfiguration cheap — a model
//! re-derives its coefficients from the state it is currently showing, so a
//! parameter change or retarget never causes a visible jump.
//!
//! # Crate layout
//!
//! - [`motion`] — the [`Motion`](motion::Motion) sampling trait shared by all
//!   models.
//! - [`spring`] — damped harmonic oscillator around a movable equilibrium.
//! - [`friction`] — exponential velocity decay (momentum coasting).
//! - [`gravity`] — constant acceleration, with and without a bouncing floor.
//! - [`fall`] — gravity that hands off to a spring at ground level.
//! - [`driver`] — the per-frame sampling loop ([`FrameDriver`](driver::FrameDriver))
//!   and the pull-based [`Timeline`](driver::Timeline) clock.
//! - [`tune`] — the uniform live-tuning surface every model exposes.

pub mod driver;
pub mod fall;
pub mod friction;
pub mod gravity;
pub mod motion;
pub mod spring;
pub mod tune;

pub use driver::{FrameDriver, Sample, Timeline};
pub use fall::Fall;
pub use friction::Friction;
pub use gravity::{Gravity, GravityWithBounce};
pub use motion::Motion;
pub use spring::Spring;
pub use tune::{ParamSpec, Tunable};
