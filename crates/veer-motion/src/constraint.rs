#![forbid(unsafe_code)]

//! Motion constraints: soft runtime bounds with physical recovery.
//!
//! A motion constraint declares where a variable is *allowed to rest* — not
//! where the solver must keep it. Gestures and momentum may carry the value
//! past the bound; [`delta`](MotionConstraint::delta) then reports the
//! signed amount the variable has to move to satisfy it again, and the
//! constraint's physics model shapes the recovery.
//!
//! # Operators
//!
//! Comparison operators ([`Op::GreaterEq`], [`Op::LessEq`], [`Op::Equal`],
//! [`Op::Range`]) evaluate the live value — they describe edges that resist
//! while you are past them. Snapping operators ([`Op::Modulo`],
//! [`Op::AdjacentModulo`], [`Op::OneOf`]) evaluate the *natural resting
//! position* — where the value would coast to under its current motion —
//! because a pager only cares where a flick will land, never where the
//! finger currently is. Snapping operators are animation-only: they rank
//! ahead of comparisons when a release is resolved but never damp a live
//! drag.
//!
//! In every case `delta()` is 0 exactly when the bound is satisfied, and
//! otherwise its sign points from the current value toward the nearest
//! satisfying one.

use std::fmt;

use tracing::warn;
use veer_physics::{Motion, Spring};
use veer_solver::Variable;

/// Stable handle to a constraint registered with a
/// [`MotionContext`](crate::context::MotionContext).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotionConstraintId(pub(crate) usize);

impl MotionConstraintId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Signature for [`Op::Custom`]: `(value, natural_end, gesture_start)` to
/// signed correction delta.
pub type CustomOp = Box<dyn Fn(f64, Option<f64>, Option<f64>) -> f64>;

/// The bound a motion constraint enforces.
pub enum Op {
    /// Value must be at least this.
    GreaterEq(f64),
    /// Value must be at most this.
    LessEq(f64),
    /// Value must equal this.
    Equal(f64),
    /// Value must come to rest on a multiple of the period.
    Modulo(f64),
    /// Like [`Op::Modulo`], but at most one period step away from the
    /// multiple nearest the gesture start — a fast flick cannot skip pages.
    AdjacentModulo(f64),
    /// Value must come to rest on one of these candidates.
    OneOf(Vec<f64>),
    /// Value must lie inside one of these closed `(low, high)` intervals.
    Range(Vec<(f64, f64)>),
    /// Caller-supplied evaluation.
    Custom(CustomOp),
}

impl Op {
    /// Snapping operators act only when motion is being resolved, never on a
    /// live drag.
    #[must_use]
    pub fn animation_only(&self) -> bool {
        matches!(self, Self::Modulo(_) | Self::AdjacentModulo(_) | Self::OneOf(_))
    }

    fn delta(&self, value: f64, natural_end: Option<f64>, gesture_start: Option<f64>) -> f64 {
        match self {
            Self::GreaterEq(bound) => {
                if value >= *bound {
                    0.0
                } else {
                    bound - value
                }
            }
            Self::LessEq(bound) => {
                if value <= *bound {
                    0.0
                } else {
                    bound - value
                }
            }
            Self::Equal(target) => target - value,
            Self::Modulo(period) => {
                let rest = natural_end.unwrap_or(value);
                (rest / period).round() * period - value
            }
            Self::AdjacentModulo(period) => {
                let rest = natural_end.unwrap_or(value);
                let mut steps = (rest / period).round();
                if let Some(start) = gesture_start {
                    let base = (start / period).round();
                    steps = steps.clamp(base - 1.0, base + 1.0);
                }
                steps * period - value
            }
            Self::OneOf(candidates) => {
                let rest = natural_end.unwrap_or(value);
                let nearest = candidates.iter().copied().min_by(|a, b| {
                    (a - rest)
                        .abs()
                        .partial_cmp(&(b - rest).abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                match nearest {
                    Some(c) => c - value,
                    None => {
                        warn!("one-of constraint with no candidates");
                        0.0
                    }
                }
            }
            Self::Range(intervals) => {
                let mut best = 0.0;
                let mut best_distance = f64::INFINITY;
                for &(low, high) in intervals {
                    if value >= low && value <= high {
                        return 0.0;
                    }
                    let clamped = value.clamp(low, high);
                    let distance = (clamped - value).abs();
                    if distance < best_distance {
                        best_distance = distance;
                        best = clamped;
                    }
                }
                if best_distance.is_finite() { best - value } else { 0.0 }
            }
            Self::Custom(f) => f(value, natural_end, gesture_start),
        }
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GreaterEq(b) => write!(f, "GreaterEq({b})"),
            Self::LessEq(b) => write!(f, "LessEq({b})"),
            Self::Equal(b) => write!(f, "Equal({b})"),
            Self::Modulo(p) => write!(f, "Modulo({p})"),
            Self::AdjacentModulo(p) => write!(f, "AdjacentModulo({p})"),
            Self::OneOf(c) => write!(f, "OneOf({c:?})"),
            Self::Range(r) => write!(f, "Range({r:?})"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Factory producing the physics model that resolves a violation of this
/// constraint.
pub type ModelFactory = Box<dyn Fn() -> Box<dyn Motion>>;

/// Default fraction of a live violation a drag may still express.
const DEFAULT_OVERDRAG: f64 = 0.75;

/// A soft bound on one solver variable.
pub struct MotionConstraint {
    variable: Variable,
    op: Op,
    overdrag: f64,
    captive: bool,
    model: ModelFactory,
}

impl MotionConstraint {
    /// A constraint on `variable` with the default recovery spring, an
    /// overdrag coefficient of 0.75 and captivity off.
    #[must_use]
    pub fn new(variable: Variable, op: Op) -> Self {
        Self {
            variable,
            op,
            overdrag: DEFAULT_OVERDRAG,
            captive: false,
            model: Box::new(|| Box::new(Spring::underdamped())),
        }
    }

    /// Set how much of a live violation a drag may express:
    /// 0 is rigid, 1 fully compliant.
    #[must_use]
    pub fn with_overdrag(mut self, overdrag: f64) -> Self {
        self.overdrag = overdrag.clamp(0.0, 1.0);
        self
    }

    /// Captive constraints are obeyed even mid-flight: fast motion may not
    /// shoot through them.
    #[must_use]
    pub fn with_captive(mut self, captive: bool) -> Self {
        self.captive = captive;
        self
    }

    /// Replace the recovery-model factory.
    #[must_use]
    pub fn with_model(mut self, model: ModelFactory) -> Self {
        self.model = model;
        self
    }

    /// Use a critically damped recovery spring — edges that push back
    /// without wobble.
    #[must_use]
    pub fn with_critically_damped_model(self) -> Self {
        self.with_model(Box::new(|| Box::new(Spring::critically_damped())))
    }

    /// The constrained variable.
    #[must_use]
    pub fn variable(&self) -> Variable {
        self.variable
    }

    /// Fraction of a live violation a drag may still express.
    #[must_use]
    pub fn overdrag(&self) -> f64 {
        self.overdrag
    }

    /// Whether the constraint holds even during fast motion.
    #[must_use]
    pub fn captive(&self) -> bool {
        self.captive
    }

    /// Whether the operator only acts when motion is resolved.
    #[must_use]
    pub fn animation_only(&self) -> bool {
        self.op.animation_only()
    }

    /// Signed correction for an explicit value and optional motion hints.
    ///
    /// `natural_end` is where the value would coast to; `gesture_start` is
    /// where the current gesture began. Both default sensibly when absent.
    #[must_use]
    pub fn delta(&self, value: f64, natural_end: Option<f64>, gesture_start: Option<f64>) -> f64 {
        self.op.delta(value, natural_end, gesture_start)
    }

    /// Build a fresh instance of the recovery model.
    #[must_use]
    pub fn build_model(&self) -> Box<dyn Motion> {
        (self.model)()
    }
}

impl fmt::Debug for MotionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionConstraint")
            .field("variable", &self.variable)
            .field("op", &self.op)
            .field("overdrag", &self.overdrag)
            .field("captive", &self.captive)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veer_solver::ConstraintSystem;

    fn var() -> Variable {
        ConstraintSystem::new().variable("v")
    }

    #[test]
    fn greater_eq_points_upward() {
        let mc = MotionConstraint::new(var(), Op::GreaterEq(0.0));
        assert_eq!(mc.delta(-50.0, None, None), 50.0);
        assert_eq!(mc.delta(0.0, None, None), 0.0);
        assert_eq!(mc.delta(10.0, None, None), 0.0);
    }

    #[test]
    fn less_eq_points_downward() {
        let mc = MotionConstraint::new(var(), Op::LessEq(300.0));
        assert_eq!(mc.delta(350.0, None, None), -50.0);
        assert_eq!(mc.delta(300.0, None, None), 0.0);
        assert_eq!(mc.delta(0.0, None, None), 0.0);
    }

    #[test]
    fn equal_always_points_home() {
        let mc = MotionConstraint::new(var(), Op::Equal(10.0));
        assert_eq!(mc.delta(4.0, None, None), 6.0);
        assert_eq!(mc.delta(16.0, None, None), -6.0);
        assert_eq!(mc.delta(10.0, None, None), 0.0);
    }

    #[test]
    fn modulo_snaps_the_natural_end() {
        let mc = MotionConstraint::new(var(), Op::Modulo(320.0));
        // Coasting from 150 toward a rest at 730: nearest multiple of the
        // rest is 640, so the value must move 640 - 150.
        assert_eq!(mc.delta(150.0, Some(730.0), None), 490.0);
        // At rest on a multiple: satisfied.
        assert_eq!(mc.delta(640.0, Some(640.0), None), 0.0);
        // No hint: the live value stands in for the natural end.
        assert_eq!(mc.delta(700.0, None, None), -60.0);
    }

    #[test]
    fn adjacent_modulo_cannot_skip_a_page() {
        let mc = MotionConstraint::new(var(), Op::AdjacentModulo(320.0));
        // Flick from page 0 coasting three pages out: clamped to page 1.
        assert_eq!(mc.delta(150.0, Some(1000.0), Some(0.0)), 320.0 - 150.0);
        // Coasting backward from page 2 far past page 0: clamped to page 1.
        assert_eq!(mc.delta(500.0, Some(-800.0), Some(640.0)), 320.0 - 500.0);
        // Without a gesture hint it behaves like plain modulo.
        assert_eq!(mc.delta(150.0, Some(1000.0), None), 960.0 - 150.0);
    }

    #[test]
    fn one_of_picks_nearest_candidate() {
        let mc = MotionConstraint::new(var(), Op::OneOf(vec![10.0, 250.0]));
        assert_eq!(mc.delta(40.0, Some(60.0), None), 10.0 - 40.0);
        assert_eq!(mc.delta(40.0, Some(200.0), None), 250.0 - 40.0);
    }

    #[test]
    fn empty_one_of_is_inert() {
        let mc = MotionConstraint::new(var(), Op::OneOf(Vec::new()));
        assert_eq!(mc.delta(40.0, None, None), 0.0);
    }

    #[test]
    fn range_reports_distance_to_nearest_interval() {
        let mc = MotionConstraint::new(
            var(),
            Op::Range(vec![(0.0, 100.0), (200.0, 300.0)]),
        );
        assert_eq!(mc.delta(50.0, None, None), 0.0);
        assert_eq!(mc.delta(130.0, None, None), -30.0);
        assert_eq!(mc.delta(180.0, None, None), 20.0);
        assert_eq!(mc.delta(350.0, None, None), -50.0);
    }

    #[test]
    fn custom_op_receives_hints() {
        let mc = MotionConstraint::new(
            var(),
            Op::Custom(Box::new(|value, natural, start| {
                assert_eq!(natural, Some(5.0));
                assert_eq!(start, Some(1.0));
                -value
            })),
        );
        assert_eq!(mc.delta(3.0, Some(5.0), Some(1.0)), -3.0);
    }

    #[test]
    fn animation_only_classification() {
        assert!(Op::Modulo(10.0).animation_only());
        assert!(Op::AdjacentModulo(10.0).animation_only());
        assert!(Op::OneOf(vec![1.0]).animation_only());
        assert!(!Op::GreaterEq(0.0).animation_only());
        assert!(!Op::Range(vec![(0.0, 1.0)]).animation_only());
    }

    #[test]
    fn overdrag_is_clamped_to_unit_interval() {
        let mc = MotionConstraint::new(var(), Op::LessEq(0.0)).with_overdrag(2.0);
        assert_eq!(mc.overdrag(), 1.0);
    }
}
