#![forbid(unsafe_code)]

//! Per-variable gesture state machine.
//!
//! A manipulator owns exactly one solver variable and walks it through:
//!
//! ```text
//! idle → dragging → (velocity animating | idle)
//!                 → constraint animating → (velocity animating | idle)
//! ```
//!
//! Dragging opens a strong edit and suggests a value per move; release with
//! residual velocity hands the value to a momentum model (friction by
//! default); a reported motion-constraint violation cancels whatever is
//! running and plays the constraint's own recovery model. Dragging can go
//! straight to constraint animation when the finger lifts with no speed
//! while past a bound.
//!
//! The manipulator never decides *which* violations concern it — the
//! [`MotionContext`](crate::context::MotionContext) attributes violations by
//! solver sensitivity and calls [`hit_constraints`](Manipulator::hit_constraints)
//! exactly once per tick, with an empty list when nothing is violated so
//! stale hit state clears itself.

use std::fmt;

use tracing::{debug, warn};
use veer_physics::motion::VELOCITY_REST;
use veer_physics::{FrameDriver, Friction, Motion};
use veer_solver::{MultiEditSession, Strength, Variable};

use crate::constraint::{MotionConstraint, MotionConstraintId};

/// Which pointer axis drives the variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal displacement.
    X,
    /// Vertical displacement.
    Y,
}

impl Axis {
    /// Project a 2-D displacement onto this axis.
    #[must_use]
    pub fn pick(self, dx: f64, dy: f64) -> f64 {
        match self {
            Self::X => dx,
            Self::Y => dy,
        }
    }
}

/// One attributed constraint violation, as delivered by the context.
#[derive(Debug, Clone, Copy)]
pub struct Violation {
    /// The violated constraint.
    pub constraint: MotionConstraintId,
    /// Signed correction in the constrained variable's space.
    pub delta: f64,
    /// Sensitivity of the constrained variable to this manipulator's edit.
    pub coefficient: f64,
}

/// Factory for the post-release momentum model: `(position, velocity, now)`.
pub type MomentumFactory = Box<dyn Fn(f64, f64, f64) -> Box<dyn Motion>>;

/// Default drag factor for post-release coasting.
const DEFAULT_DRAG: f64 = 0.001;

/// The manipulator's current mode.
#[derive(Debug)]
enum MotionState {
    Idle,
    Dragging { start: f64, delta: f64 },
    VelocityAnimating { driver: FrameDriver },
    ConstraintAnimating {
        driver: FrameDriver,
        constraint: MotionConstraintId,
    },
}

/// Gesture/animation state machine bound to one variable.
pub struct Manipulator {
    variable: Variable,
    axis: Axis,
    state: MotionState,
    last_position: f64,
    last_velocity: f64,
    gesture_start: Option<f64>,
    hit: Option<Violation>,
    momentum: MomentumFactory,
}

impl Manipulator {
    /// A manipulator for `variable`, driven by the given pointer axis,
    /// coasting under friction after release.
    #[must_use]
    pub fn new(variable: Variable, axis: Axis) -> Self {
        Self {
            variable,
            axis,
            state: MotionState::Idle,
            last_position: 0.0,
            last_velocity: 0.0,
            gesture_start: None,
            hit: None,
            momentum: Box::new(|x, v, now| {
                let mut model = Friction::new(DEFAULT_DRAG);
                model.set(x, v, now);
                Box::new(model)
            }),
        }
    }

    /// Replace the post-release momentum model.
    #[must_use]
    pub fn with_momentum(mut self, momentum: MomentumFactory) -> Self {
        self.momentum = momentum;
        self
    }

    /// The manipulated variable.
    #[must_use]
    pub fn variable(&self) -> Variable {
        self.variable
    }

    /// The pointer axis driving this manipulator.
    #[must_use]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Whether nothing is in flight: no drag, no animation.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self.state, MotionState::Idle)
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, MotionState::Dragging { .. })
    }

    /// Whether a momentum or recovery animation is running.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        matches!(
            self.state,
            MotionState::VelocityAnimating { .. } | MotionState::ConstraintAnimating { .. }
        )
    }

    /// The constraint currently flagged against this manipulator, if any.
    #[must_use]
    pub fn hit_constraint(&self) -> Option<MotionConstraintId> {
        self.hit.map(|h| h.constraint)
    }

    /// Last position suggested to the solver.
    #[must_use]
    pub fn last_position(&self) -> f64 {
        self.last_position
    }

    /// Where the in-flight motion would rest, if anywhere.
    #[must_use]
    pub fn natural_end(&self) -> Option<f64> {
        match &self.state {
            MotionState::Idle => None,
            MotionState::Dragging { .. } => Some(self.last_position),
            MotionState::VelocityAnimating { driver }
            | MotionState::ConstraintAnimating { driver, .. } => driver.model().natural_end(),
        }
    }

    /// Where the current gesture began, persisting through the animations
    /// it launched.
    #[must_use]
    pub fn gesture_start(&self) -> Option<f64> {
        self.gesture_start
    }

    /// Gesture-start: take over the variable and open an edit.
    pub(crate) fn start_drag(&mut self, session: &mut MultiEditSession) {
        self.hit = None;
        self.cancel_driver();
        if !session.is_editing(self.variable) {
            session.begin_edit(self.variable, Strength::Strong);
        }
        let start = session.system().value(self.variable);
        self.last_position = start;
        self.last_velocity = 0.0;
        self.gesture_start = Some(start);
        self.state = MotionState::Dragging { start, delta: 0.0 };
        debug!(variable = session.system().name(self.variable), start, "drag started");
    }

    /// Gesture-move: suggest `start + displacement`, damped by the hit
    /// constraint's overdrag when one is flagged.
    pub(crate) fn drag_by(
        &mut self,
        displacement: f64,
        session: &mut MultiEditSession,
        constraints: &[MotionConstraint],
    ) {
        let MotionState::Dragging { start, delta } = &mut self.state else {
            warn!("drag move with no active drag");
            return;
        };
        *delta = displacement;
        let start = *start;
        let candidate = start + displacement;
        let mut position = candidate;
        if let Some(hit) = self.hit {
            let mc = &constraints[hit.constraint.index()];
            if !mc.animation_only() && hit.coefficient != 0.0 {
                // Project the candidate into the constrained variable's
                // space, measure the violation there, and express only the
                // permitted fraction of it.
                let constrained = session.system().value(mc.variable());
                let projected = constrained + hit.coefficient * (candidate - self.last_position);
                let violation = mc.delta(projected, Some(projected), None);
                position = candidate + (violation / hit.coefficient) * (1.0 - mc.overdrag());
            }
        }
        self.last_position = position;
        self.last_velocity = 0.0;
        session.suggest_value(self.variable, position);
    }

    /// Gesture-end: momentum, direct recovery, or nothing.
    pub(crate) fn end_drag(
        &mut self,
        velocity: f64,
        now: f64,
        session: &mut MultiEditSession,
        constraints: &[MotionConstraint],
    ) {
        if !matches!(self.state, MotionState::Dragging { .. }) {
            warn!("drag end with no active drag");
            return;
        }
        if velocity.abs() < VELOCITY_REST {
            if let Some(hit) = self.hit {
                self.start_recovery(hit, now, constraints);
                return;
            }
            self.settle(session);
            return;
        }
        self.last_velocity = velocity;
        let model = (self.momentum)(self.last_position, velocity, now);
        self.state = MotionState::VelocityAnimating {
            driver: FrameDriver::new(model),
        };
        debug!(velocity, "coasting after release");
    }

    /// Advance any running animation by one frame.
    pub(crate) fn tick(
        &mut self,
        now: f64,
        session: &mut MultiEditSession,
        constraints: &[MotionConstraint],
    ) {
        let sample = match &mut self.state {
            MotionState::Idle | MotionState::Dragging { .. } => return,
            MotionState::VelocityAnimating { driver }
            | MotionState::ConstraintAnimating { driver, .. } => driver.tick(now),
        };
        let Some(sample) = sample else {
            // Cancelled out from under us; release the variable.
            self.settle(session);
            return;
        };
        self.last_position = sample.x;
        self.last_velocity = sample.dx;
        session.suggest_value(self.variable, sample.x);
        if !sample.done {
            return;
        }
        let resolving = match &self.state {
            MotionState::ConstraintAnimating { constraint, .. } => Some(*constraint),
            _ => None,
        };
        if let Some(constraint) = resolving {
            let captive = constraints[constraint.index()].captive();
            self.hit = None;
            if !captive && sample.dx.abs() >= VELOCITY_REST {
                // Recovery ended with speed to spare: let it coast.
                let model = (self.momentum)(sample.x, sample.dx, now);
                self.state = MotionState::VelocityAnimating {
                    driver: FrameDriver::new(model),
                };
            } else {
                self.settle(session);
            }
        } else {
            self.settle(session);
        }
    }

    /// Receive this tick's attributed violations (possibly none).
    ///
    /// Only the top-ranked violation is acted on: snapping constraints
    /// outrank comparisons, then larger overdrag, then larger magnitude.
    /// Resolving several violations against one variable at once is
    /// undefined here by design — rank and pick one.
    pub(crate) fn hit_constraints(
        &mut self,
        mut violations: Vec<Violation>,
        now: f64,
        constraints: &[MotionConstraint],
    ) {
        if violations.is_empty() {
            if !matches!(self.state, MotionState::ConstraintAnimating { .. }) {
                self.hit = None;
            }
            return;
        }
        violations.sort_by(|a, b| {
            let ka = rank_key(a, constraints);
            let kb = rank_key(b, constraints);
            kb.partial_cmp(&ka).unwrap_or(std::cmp::Ordering::Equal)
        });
        let top = violations[0];
        if matches!(self.state, MotionState::Dragging { .. }) {
            // Remember the strongest live violation for overdrag damping;
            // snapping constraints wait for the release.
            self.hit = violations
                .iter()
                .find(|v| !constraints[v.constraint.index()].animation_only())
                .copied();
            return;
        }
        let resolving = match &self.state {
            MotionState::ConstraintAnimating { constraint, .. } => Some(*constraint),
            MotionState::VelocityAnimating { .. } => None,
            // Idle: no edit is open, so the context should not have
            // attributed anything here.
            MotionState::Idle => return,
            // Dragging is already handled by the early return above.
            MotionState::Dragging { .. } => return,
        };
        if resolving == Some(top.constraint) {
            // Already resolving this one.
            return;
        }
        self.hit = Some(top);
        self.start_recovery(top, now, constraints);
    }

    /// Cancel whatever animation is running and release the variable.
    pub(crate) fn cancel_animations(&mut self, session: &mut MultiEditSession) {
        if self.is_animating() {
            self.cancel_driver();
            self.settle(session);
        }
    }

    /// Replace the current motion with the constraint's recovery model.
    fn start_recovery(
        &mut self,
        hit: Violation,
        now: f64,
        constraints: &[MotionConstraint],
    ) {
        self.cancel_driver();
        let mc = &constraints[hit.constraint.index()];
        let mut model = mc.build_model();
        model.snap(self.last_position, now);
        model.set_end(
            self.last_position + hit.delta / hit.coefficient,
            self.last_velocity,
            now,
        );
        debug!(
            constraint = ?hit.constraint,
            delta = hit.delta,
            coefficient = hit.coefficient,
            "resolving constraint violation"
        );
        self.state = MotionState::ConstraintAnimating {
            driver: FrameDriver::new(model),
            constraint: hit.constraint,
        };
    }

    fn cancel_driver(&mut self) {
        match &mut self.state {
            MotionState::VelocityAnimating { driver }
            | MotionState::ConstraintAnimating { driver, .. } => driver.cancel(),
            MotionState::Idle | MotionState::Dragging { .. } => {}
        }
    }

    /// Return to idle and close the edit.
    fn settle(&mut self, session: &mut MultiEditSession) {
        self.state = MotionState::Idle;
        self.gesture_start = None;
        if session.is_editing(self.variable) {
            session.end_edit(self.variable);
        }
    }
}

impl fmt::Debug for Manipulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manipulator")
            .field("variable", &self.variable)
            .field("axis", &self.axis)
            .field("state", &self.state)
            .field("last_position", &self.last_position)
            .field("hit", &self.hit)
            .finish_non_exhaustive()
    }
}

/// Ranking key: snapping first, then overdrag, then magnitude.
fn rank_key(v: &Violation, constraints: &[MotionConstraint]) -> (u8, f64, f64) {
    let mc = &constraints[v.constraint.index()];
    (
        u8::from(mc.animation_only()),
        mc.overdrag(),
        v.delta.abs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Op;
    use veer_solver::ConstraintSystem;

    fn setup() -> (MultiEditSession, Variable) {
        let mut sys = ConstraintSystem::new();
        let x = sys.variable("x");
        sys.add_stay(x, Strength::Medium).unwrap();
        (MultiEditSession::new(sys), x)
    }

    #[test]
    fn drag_suggests_displaced_position() {
        let (mut session, x) = setup();
        let mut m = Manipulator::new(x, Axis::X);
        m.start_drag(&mut session);
        assert!(m.is_dragging());
        m.drag_by(42.0, &mut session, &[]);
        assert_eq!(session.system().value(x), 42.0);
        assert_eq!(m.natural_end(), Some(42.0));
    }

    #[test]
    fn release_without_velocity_goes_idle() {
        let (mut session, x) = setup();
        let mut m = Manipulator::new(x, Axis::X);
        m.start_drag(&mut session);
        m.drag_by(10.0, &mut session, &[]);
        m.end_drag(0.0, 0.0, &mut session, &[]);
        assert!(m.is_idle());
        assert!(!session.is_editing(x));
    }

    #[test]
    fn release_with_velocity_coasts_to_rest() {
        let (mut session, x) = setup();
        let mut m = Manipulator::new(x, Axis::X);
        m.start_drag(&mut session);
        m.drag_by(10.0, &mut session, &[]);
        m.end_drag(500.0, 0.0, &mut session, &[]);
        assert!(m.is_animating());
        let mut now = 0.0;
        let mut guard = 0;
        while !m.is_idle() {
            now += 1.0 / 60.0;
            m.tick(now, &mut session, &[]);
            guard += 1;
            assert!(guard < 2000, "coast never settled");
        }
        // Coasting carried the value forward and the edit was closed.
        assert!(session.system().value(x) > 10.0);
        assert!(!session.is_editing(x));
    }

    #[test]
    fn overdrag_damps_a_flagged_violation() {
        let (mut session, x) = setup();
        let constraints = vec![
            MotionConstraint::new(x, Op::GreaterEq(0.0)).with_overdrag(0.5),
        ];
        let mut m = Manipulator::new(x, Axis::X);
        m.start_drag(&mut session);
        m.drag_by(-100.0, &mut session, &constraints);
        // First move is undamped (violation not flagged yet).
        assert_eq!(session.system().value(x), -100.0);
        m.hit_constraints(
            vec![Violation {
                constraint: MotionConstraintId(0),
                delta: 100.0,
                coefficient: 1.0,
            }],
            0.0,
            &constraints,
        );
        m.drag_by(-100.0, &mut session, &constraints);
        // Candidate -100 violates by 100; half of it is clawed back.
        assert_eq!(session.system().value(x), -50.0);
    }

    #[test]
    fn rigid_constraint_resists_fully() {
        let (mut session, x) = setup();
        let constraints = vec![
            MotionConstraint::new(x, Op::GreaterEq(0.0)).with_overdrag(0.0),
        ];
        let mut m = Manipulator::new(x, Axis::X);
        m.start_drag(&mut session);
        m.drag_by(-40.0, &mut session, &constraints);
        m.hit_constraints(
            vec![Violation {
                constraint: MotionConstraintId(0),
                delta: 40.0,
                coefficient: 1.0,
            }],
            0.0,
            &constraints,
        );
        m.drag_by(-40.0, &mut session, &constraints);
        assert_eq!(session.system().value(x), 0.0);
    }

    #[test]
    fn empty_violations_clear_hit_state() {
        let (mut session, x) = setup();
        let constraints = vec![MotionConstraint::new(x, Op::GreaterEq(0.0))];
        let mut m = Manipulator::new(x, Axis::X);
        m.start_drag(&mut session);
        m.hit_constraints(
            vec![Violation {
                constraint: MotionConstraintId(0),
                delta: 10.0,
                coefficient: 1.0,
            }],
            0.0,
            &constraints,
        );
        assert!(m.hit_constraint().is_some());
        m.hit_constraints(Vec::new(), 0.0, &constraints);
        assert!(m.hit_constraint().is_none());
    }

    #[test]
    fn snapping_constraints_do_not_damp_drags() {
        let (mut session, x) = setup();
        let constraints = vec![
            MotionConstraint::new(x, Op::Modulo(100.0)).with_overdrag(0.0),
        ];
        let mut m = Manipulator::new(x, Axis::X);
        m.start_drag(&mut session);
        m.hit_constraints(
            vec![Violation {
                constraint: MotionConstraintId(0),
                delta: 50.0,
                coefficient: 1.0,
            }],
            0.0,
            &constraints,
        );
        // Animation-only violations are not flagged against a live drag.
        assert!(m.hit_constraint().is_none());
        m.drag_by(-50.0, &mut session, &constraints);
        assert_eq!(session.system().value(x), -50.0);
    }

    #[test]
    fn violation_during_coast_switches_to_recovery() {
        let (mut session, x) = setup();
        let constraints = vec![MotionConstraint::new(x, Op::LessEq(0.0))];
        let mut m = Manipulator::new(x, Axis::X);
        m.start_drag(&mut session);
        m.end_drag(800.0, 0.0, &mut session, &constraints);
        assert!(m.is_animating());
        m.tick(0.1, &mut session, &constraints);
        let past = session.system().value(x);
        assert!(past > 0.0);
        m.hit_constraints(
            vec![Violation {
                constraint: MotionConstraintId(0),
                delta: -past,
                coefficient: 1.0,
            }],
            0.1,
            &constraints,
        );
        assert_eq!(m.hit_constraint(), Some(MotionConstraintId(0)));
        // The recovery spring pulls the value back to the bound.
        let mut now = 0.1;
        let mut guard = 0;
        while !m.is_idle() {
            now += 1.0 / 60.0;
            m.tick(now, &mut session, &constraints);
            guard += 1;
            assert!(guard < 2000, "recovery never settled");
        }
        assert!(session.system().value(x).abs() < 0.01);
    }

    #[test]
    fn ranking_prefers_snapping_then_overdrag_then_magnitude() {
        let (mut session, x) = setup();
        let constraints = vec![
            MotionConstraint::new(x, Op::LessEq(0.0)).with_overdrag(0.2),
            MotionConstraint::new(x, Op::Modulo(100.0)),
            MotionConstraint::new(x, Op::LessEq(10.0)).with_overdrag(0.9),
        ];
        let violations = vec![
            Violation {
                constraint: MotionConstraintId(0),
                delta: -500.0,
                coefficient: 1.0,
            },
            Violation {
                constraint: MotionConstraintId(1),
                delta: -20.0,
                coefficient: 1.0,
            },
            Violation {
                constraint: MotionConstraintId(2),
                delta: -490.0,
                coefficient: 1.0,
            },
        ];
        let mut m = Manipulator::new(x, Axis::X);
        m.start_drag(&mut session);
        m.end_drag(200.0, 0.0, &mut session, &constraints);
        m.hit_constraints(violations, 0.0, &constraints);
        // The snapping constraint wins despite its tiny delta.
        assert_eq!(m.hit_constraint(), Some(MotionConstraintId(1)));
    }
}
