#![forbid(unsafe_code)]

//! The per-frame orchestrator.
//!
//! [`MotionContext`] owns the whole scene: the multi-edit session over the
//! constraint system, every motion constraint, manipulator and pane, and
//! the timeline. Components refer to each other only through the integer
//! handles issued at registration, so nothing holds a cross-reference and
//! the context can hand out disjoint borrows freely.
//!
//! # The update pass
//!
//! Once per tick ([`update`](MotionContext::update)):
//!
//! 1. Evaluate every motion constraint against every manipulator's edit.
//!    The sensitivity of the constrained variable to the manipulator's
//!    variable is the *contribution coefficient*; a zero coefficient means
//!    the manipulator is unrelated and is never bothered.
//! 2. Deliver each manipulator its violations exactly once — including an
//!    empty delivery, so a manipulator that stopped violating can clear its
//!    hit state.
//! 3. Refresh every pane from the solved values.
//!
//! A violation handler may start an animation whose first suggestion wants
//! another update; the nested request is *dropped*, not queued (a boolean
//! guard). Updates coalesce — the next tick recomputes everything anyway —
//! and callers must not rely on nested updates taking effect.

use tracing::trace;
use veer_physics::Timeline;
use veer_solver::{ConstraintSystem, MultiEditSession, SolverError, Strength, Variable};

use crate::constraint::{MotionConstraint, MotionConstraintId};
use crate::gesture::Velocity;
use crate::manipulator::{Manipulator, Violation};
use crate::pane::Pane;

/// Stable handle to a registered manipulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManipulatorId(usize);

/// Stable handle to a registered pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaneId(usize);

/// Scene-wide coordinator for solver, constraints, manipulators and panes.
#[derive(Debug)]
pub struct MotionContext {
    session: MultiEditSession,
    timeline: Timeline,
    constraints: Vec<MotionConstraint>,
    manipulators: Vec<Manipulator>,
    panes: Vec<Pane>,
    updating: bool,
}

impl Default for MotionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionContext {
    /// An empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: MultiEditSession::new(ConstraintSystem::new()),
            timeline: Timeline::new(),
            constraints: Vec::new(),
            manipulators: Vec::new(),
            panes: Vec::new(),
            updating: false,
        }
    }

    /// The underlying constraint system (reading values, scene queries).
    #[must_use]
    pub fn system(&self) -> &ConstraintSystem {
        self.session.system()
    }

    /// Mutable access to the constraint system (scene authoring).
    pub fn system_mut(&mut self) -> &mut ConstraintSystem {
        self.session.system_mut()
    }

    /// The shared edit session, for callers editing variables directly.
    pub fn session_mut(&mut self) -> &mut MultiEditSession {
        &mut self.session
    }

    /// Current timeline instant in seconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.timeline.now()
    }

    /// Register a motion constraint.
    pub fn add_motion_constraint(&mut self, constraint: MotionConstraint) -> MotionConstraintId {
        self.constraints.push(constraint);
        MotionConstraintId(self.constraints.len() - 1)
    }

    /// A registered motion constraint.
    #[must_use]
    pub fn motion_constraint(&self, id: MotionConstraintId) -> &MotionConstraint {
        &self.constraints[id.index()]
    }

    /// Register a manipulator.
    ///
    /// The manipulated variable gets a medium-strength stay so it keeps its
    /// rest position whenever nothing is driving it.
    pub fn add_manipulator(&mut self, manipulator: Manipulator) -> Result<ManipulatorId, SolverError> {
        self.session
            .system_mut()
            .add_stay(manipulator.variable(), Strength::Medium)?;
        self.manipulators.push(manipulator);
        let id = ManipulatorId(self.manipulators.len() - 1);
        self.update();
        Ok(id)
    }

    /// A registered manipulator.
    #[must_use]
    pub fn manipulator(&self, id: ManipulatorId) -> &Manipulator {
        &self.manipulators[id.0]
    }

    /// Register a pane; it is refreshed at the end of every update.
    pub fn add_pane(&mut self, pane: Pane) -> PaneId {
        self.panes.push(pane);
        let id = PaneId(self.panes.len() - 1);
        self.update();
        id
    }

    /// A registered pane.
    #[must_use]
    pub fn pane(&self, id: PaneId) -> &Pane {
        &self.panes[id.0]
    }

    /// Whether every manipulator is idle — no frames need scheduling.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.manipulators.iter().all(Manipulator::is_idle)
    }

    /// Route a gesture start to a manipulator.
    ///
    /// A new touch is dominant: animations other manipulators are running
    /// against related variables are cancelled first.
    pub fn pointer_start(&mut self, id: ManipulatorId) {
        let variable = self.manipulators[id.0].variable();
        self.stop_others(variable, id);
        self.manipulators[id.0].start_drag(&mut self.session);
        self.update();
    }

    /// Route a gesture move; the displacement is projected onto the
    /// manipulator's axis.
    pub fn pointer_move(&mut self, id: ManipulatorId, dx: f64, dy: f64) {
        let manipulator = &mut self.manipulators[id.0];
        let displacement = manipulator.axis().pick(dx, dy);
        manipulator.drag_by(displacement, &mut self.session, &self.constraints);
        self.update();
    }

    /// Route a gesture end with the estimated release velocity.
    pub fn pointer_end(&mut self, id: ManipulatorId, velocity: Velocity) {
        let now = self.timeline.now();
        let manipulator = &mut self.manipulators[id.0];
        let v = manipulator.axis().pick(velocity.x, velocity.y);
        manipulator.end_drag(v, now, &mut self.session, &self.constraints);
        self.update();
    }

    /// Advance the timeline by `dt` seconds, sampling every active
    /// animation once, then run an update pass.
    ///
    /// The host's production adapter is one line: call this from each
    /// "next frame" callback with the elapsed time.
    pub fn advance(&mut self, dt: f64) {
        let now = self.timeline.advance(dt);
        for manipulator in &mut self.manipulators {
            manipulator.tick(now, &mut self.session, &self.constraints);
        }
        self.update();
    }

    /// Run one update pass (see module docs). Nested calls are dropped.
    pub fn update(&mut self) {
        if self.updating {
            trace!("nested update dropped (coalesced into the outer pass)");
            return;
        }
        self.updating = true;
        self.resolve_motion_constraints();
        self.refresh_panes();
        self.updating = false;
    }

    /// Evaluate constraints, attribute violations, dispatch.
    fn resolve_motion_constraints(&mut self) {
        let now = self.timeline.now();
        let mut per_manipulator: Vec<Vec<Violation>> =
            (0..self.manipulators.len()).map(|_| Vec::new()).collect();

        for (ci, constraint) in self.constraints.iter().enumerate() {
            let value = self.session.system().value(constraint.variable());
            for (mi, manipulator) in self.manipulators.iter().enumerate() {
                let coefficient = self
                    .session
                    .system_mut()
                    .sensitivity(manipulator.variable(), constraint.variable());
                if coefficient == 0.0 {
                    continue;
                }
                // Map the manipulator's motion hints into the constrained
                // variable's space through the same linear relation.
                let natural_end = manipulator
                    .natural_end()
                    .map(|end| value + coefficient * (end - manipulator.last_position()));
                let gesture_start = manipulator
                    .gesture_start()
                    .map(|start| value + coefficient * (start - manipulator.last_position()));
                let delta = constraint.delta(value, natural_end, gesture_start);
                if delta == 0.0 {
                    continue;
                }
                trace!(
                    constraint = ci,
                    manipulator = mi,
                    delta,
                    coefficient,
                    "violation attributed"
                );
                per_manipulator[mi].push(Violation {
                    constraint: MotionConstraintId(ci),
                    delta,
                    coefficient,
                });
            }
        }

        for (mi, violations) in per_manipulator.into_iter().enumerate() {
            self.manipulators[mi].hit_constraints(violations, now, &self.constraints);
        }
    }

    fn refresh_panes(&mut self) {
        let system = self.session.system();
        for pane in &mut self.panes {
            pane.refresh(system);
        }
    }

    /// Cancel animations on every other manipulator related to `variable`.
    fn stop_others(&mut self, variable: Variable, except: ManipulatorId) {
        for i in 0..self.manipulators.len() {
            if i == except.0 {
                continue;
            }
            let other = self.manipulators[i].variable();
            let coefficient = self.session.system_mut().sensitivity(other, variable);
            if coefficient != 0.0 {
                self.manipulators[i].cancel_animations(&mut self.session);
            }
        }
    }
}
