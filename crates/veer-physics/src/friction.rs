#![forbid(unsafe_code)]

//! Exponential velocity decay — the coasting model used after a flick.
//!
//! Friction is a power curve in disguise: with a drag factor `d ∈ (0, 1)`,
//! velocity decays as `v(t) = v0·dᵗ` and integrating gives the closed form
//!
//! ```text
//! x(t) = x0 + v0·dᵗ/ln(d) − v0/ln(d)
//! ```
//!
//! The natural resting position is the `t → ∞` limit, `x0 − v0/ln(d)`,
//! which pager/snapping logic uses to decide where a flick would land.

use crate::motion::{Motion, VELOCITY_REST};
use crate::tune::{ParamSpec, Tunable};

/// Smallest accepted drag factor; below this the curve is numerically inert.
const MIN_DRAG: f64 = 1e-6;
/// Largest accepted drag factor; `ln(1) = 0` would divide by zero.
const MAX_DRAG: f64 = 1.0 - 1e-6;

/// Momentum coasting under exponential drag.
#[derive(Debug, Clone)]
pub struct Friction {
    drag: f64,
    drag_log: f64,
    x0: f64,
    v0: f64,
    start_time: f64,
}

impl Friction {
    /// Create a friction model with the given drag factor, clamped to (0, 1).
    #[must_use]
    pub fn new(drag: f64) -> Self {
        let drag = drag.clamp(MIN_DRAG, MAX_DRAG);
        Self {
            drag,
            drag_log: drag.ln(),
            x0: 0.0,
            v0: 0.0,
            start_time: 0.0,
        }
    }

    /// Current drag factor.
    #[must_use]
    pub fn drag(&self) -> f64 {
        self.drag
    }

    /// Change the drag factor without disturbing the current motion.
    pub fn reconfigure(&mut self, drag: f64, now: f64) {
        let x = self.sample_x(now);
        let v = self.sample_dx(now);
        let drag = drag.clamp(MIN_DRAG, MAX_DRAG);
        self.drag = drag;
        self.drag_log = drag.ln();
        self.set(x, v, now);
    }

    fn sample_x(&self, now: f64) -> f64 {
        let dt = now - self.start_time;
        self.x0 + self.v0 * self.drag.powf(dt) / self.drag_log - self.v0 / self.drag_log
    }

    fn sample_dx(&self, now: f64) -> f64 {
        self.v0 * self.drag.powf(now - self.start_time)
    }
}

impl Motion for Friction {
    fn set(&mut self, x: f64, v: f64, now: f64) {
        self.x0 = x;
        self.v0 = v;
        self.start_time = now;
    }

    fn x(&mut self, now: f64) -> f64 {
        self.sample_x(now)
    }

    fn dx(&mut self, now: f64) -> f64 {
        self.sample_dx(now)
    }

    fn done(&mut self, now: f64) -> bool {
        self.sample_dx(now).abs() < VELOCITY_REST
    }

    fn natural_end(&self) -> Option<f64> {
        Some(self.x0 - self.v0 / self.drag_log)
    }
}

impl Tunable for Friction {
    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[ParamSpec {
            key: "drag",
            label: "Friction",
            min: 0.001,
            max: 0.1,
            step: 0.001,
        }];
        PARAMS
    }

    fn param(&self, key: &str) -> Option<f64> {
        (key == "drag").then_some(self.drag)
    }

    fn set_param(&mut self, key: &str, value: f64, now: f64) -> bool {
        if key == "drag" {
            self.reconfigure(value, now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_friction_reports_rest() {
        let mut f = Friction::new(0.001);
        assert_eq!(f.x(0.0), 0.0);
        assert_eq!(f.dx(0.0), 0.0);
        assert!(f.done(0.0));
    }

    #[test]
    fn velocity_decays_below_rest_threshold() {
        let mut f = Friction::new(0.001);
        f.set(0.0, 1000.0, 0.0);
        assert!(f.dx(5.0).abs() < 1.0);
        assert!(f.done(5.0));
        assert!(!f.done(0.5));
    }

    #[test]
    fn position_approaches_natural_end() {
        let mut f = Friction::new(0.001);
        f.set(100.0, 800.0, 0.0);
        let end = f.natural_end().unwrap();
        assert!((f.x(20.0) - end).abs() < 0.01);
        // Coasting moves in the direction of the initial velocity.
        assert!(end > 100.0);
    }

    #[test]
    fn set_is_relative_to_now() {
        let mut f = Friction::new(0.01);
        f.set(0.0, 500.0, 10.0);
        assert_eq!(f.x(10.0), 0.0);
        assert_eq!(f.dx(10.0), 500.0);
    }

    #[test]
    fn degenerate_drag_is_clamped() {
        let f = Friction::new(1.0);
        assert!(f.drag() < 1.0);
        let f = Friction::new(0.0);
        assert!(f.drag() > 0.0);
    }

    #[test]
    fn reconfigure_keeps_position_and_velocity() {
        let mut f = Friction::new(0.001);
        f.set(0.0, 1000.0, 0.0);
        let x = f.x(0.4);
        let v = f.dx(0.4);
        f.reconfigure(0.05, 0.4);
        assert!((f.x(0.4) - x).abs() < 1e-9);
        assert!((f.dx(0.4) - v).abs() < 1e-9);
    }

    #[test]
    fn lower_drag_factor_stops_sooner() {
        // The drag factor is the per-second velocity multiplier: 0.001
        // sheds speed much faster than 0.1.
        let mut grippy = Friction::new(0.001);
        let mut slippery = Friction::new(0.1);
        grippy.set(0.0, 1000.0, 0.0);
        slippery.set(0.0, 1000.0, 0.0);
        assert!(grippy.natural_end().unwrap() < slippery.natural_end().unwrap());
    }
}
