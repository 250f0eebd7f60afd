#![forbid(unsafe_code)]

//! Gravity that lands softly: a gravity → spring handoff composite.
//!
//! The value falls under constant acceleration; the first sample at or past
//! the ground level hands the motion to a spring seeded with the gravity
//! velocity at the moment of crossing, targeting the ground. The handoff is
//! one-way.
//!
//! Because the crossing is detected on a per-tick sample rather than solved
//! for analytically, the spring inherits the velocity the gravity model has
//! at the *sample* instant, not at the exact crossing. At display rates the
//! difference is invisible; with heavy frame drops the landing can carry
//! extra speed. That is an accepted property of the composite, matching its
//! sampling-based design.

use crate::gravity::Gravity;
use crate::motion::Motion;
use crate::spring::Spring;
use crate::tune::{ParamSpec, Tunable};

/// Default acceleration when none is given.
const DEFAULT_ACCEL: f64 = 5000.0;
/// Default landing-spring constant.
const DEFAULT_SPRING_K: f64 = 180.0;
/// Default landing-spring damping.
const DEFAULT_SPRING_DAMPING: f64 = 20.0;

/// A falling value that lands on a spring at `ground`.
#[derive(Debug, Clone)]
pub struct Fall {
    ground: f64,
    gravity: Gravity,
    spring: Spring,
    springing: bool,
}

impl Fall {
    /// Create a fall that lands at `ground` with the default acceleration
    /// and landing spring.
    #[must_use]
    pub fn new(ground: f64) -> Self {
        Self::with_params(ground, DEFAULT_ACCEL, DEFAULT_SPRING_K, DEFAULT_SPRING_DAMPING)
    }

    /// Create a fall with explicit acceleration and landing-spring params.
    #[must_use]
    pub fn with_params(ground: f64, accel: f64, spring_k: f64, spring_damping: f64) -> Self {
        Self {
            ground,
            gravity: Gravity::new(accel, 1000.0),
            spring: Spring::new(1.0, spring_k, spring_damping),
            springing: false,
        }
    }

    /// The ground level this fall lands on.
    #[must_use]
    pub fn ground(&self) -> f64 {
        self.ground
    }

    /// Whether the landing spring has taken over.
    #[must_use]
    pub fn landed(&self) -> bool {
        self.springing
    }

    fn hand_off(&mut self, position: f64, velocity: f64, now: f64) {
        self.springing = true;
        self.spring.snap(position, now);
        // The spring absorbs the fall's momentum and settles on the ground.
        self.spring.retarget(self.ground, velocity, now);
    }
}

impl Motion for Fall {
    fn set(&mut self, x: f64, v: f64, now: f64) {
        self.gravity.set(x, v, now);
        if x >= self.ground {
            self.hand_off(x, v, now);
        } else {
            self.springing = false;
        }
    }

    fn x(&mut self, now: f64) -> f64 {
        if self.springing {
            return self.spring.x(now);
        }
        let x = self.gravity.x(now);
        if x >= self.ground {
            let velocity = self.gravity.dx(now);
            self.hand_off(self.ground, velocity, now);
            return self.spring.x(now);
        }
        x
    }

    fn dx(&mut self, now: f64) -> f64 {
        if self.springing {
            self.spring.dx(now)
        } else {
            self.gravity.dx(now)
        }
    }

    fn done(&mut self, now: f64) -> bool {
        if self.springing {
            self.spring.done(now)
        } else {
            self.gravity.done(now)
        }
    }

    fn natural_end(&self) -> Option<f64> {
        Some(self.ground)
    }
}

impl Tunable for Fall {
    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec {
                key: "acceleration",
                label: "Acceleration",
                min: 1.0,
                max: 6000.0,
                step: 1.0,
            },
            ParamSpec {
                key: "spring-constant",
                label: "Spring Constant",
                min: 100.0,
                max: 1000.0,
                step: 1.0,
            },
            ParamSpec {
                key: "damping",
                label: "Damping",
                min: 1.0,
                max: 500.0,
                step: 1.0,
            },
        ];
        PARAMS
    }

    fn param(&self, key: &str) -> Option<f64> {
        match key {
            "acceleration" => Some(self.gravity.acceleration()),
            _ => self.spring.param(key),
        }
    }

    fn set_param(&mut self, key: &str, value: f64, now: f64) -> bool {
        match key {
            "acceleration" => {
                self.gravity.reconfigure(value, now);
                true
            }
            _ => self.spring.set_param(key, value, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_before_ground() {
        let mut fall = Fall::with_params(400.0, 5000.0, 180.0, 20.0);
        fall.set(0.0, 0.0, 0.0);
        assert!(!fall.landed());
        let x = fall.x(0.1); // 25 units in
        assert!(x > 0.0 && x < 400.0);
        assert!(!fall.landed());
    }

    #[test]
    fn hands_off_to_spring_at_ground() {
        let mut fall = Fall::with_params(400.0, 5000.0, 180.0, 20.0);
        fall.set(0.0, 0.0, 0.0);
        // Crossing happens at t = sqrt(2·400/5000) ≈ 0.4; sample past it.
        let x = fall.x(0.45);
        assert!(fall.landed());
        // The spring carries the fall's momentum through the ground.
        assert!(x >= 400.0 - 1.0);
        assert!(fall.dx(0.45).abs() > 0.0);
    }

    #[test]
    fn handoff_is_one_way() {
        let mut fall = Fall::with_params(400.0, 5000.0, 180.0, 20.0);
        fall.set(0.0, 0.0, 0.0);
        let _ = fall.x(0.5);
        assert!(fall.landed());
        // Even while the spring swings back above ground it stays a spring.
        let mut now = 0.5;
        for _ in 0..120 {
            now += 1.0 / 60.0;
            let _ = fall.x(now);
            assert!(fall.landed());
        }
    }

    #[test]
    fn settles_at_ground() {
        let mut fall = Fall::with_params(300.0, 5000.0, 180.0, 20.0);
        fall.set(0.0, 0.0, 0.0);
        let mut now = 0.0;
        let mut guard = 0;
        while !fall.done(now) {
            now += 1.0 / 60.0;
            let _ = fall.x(now);
            guard += 1;
            assert!(guard < 2000, "fall failed to settle");
        }
        assert!((fall.x(now) - 300.0).abs() < 0.01);
    }

    #[test]
    fn set_at_or_past_ground_springs_immediately() {
        let mut fall = Fall::with_params(100.0, 5000.0, 180.0, 20.0);
        fall.set(150.0, 0.0, 0.0);
        assert!(fall.landed());
        // Spring pulls back up toward the ground.
        let mut now = 0.0;
        let mut guard = 0;
        while !fall.done(now) {
            now += 1.0 / 60.0;
            guard += 1;
            assert!(guard < 2000);
        }
        assert!((fall.x(now) - 100.0).abs() < 0.01);
    }
}
