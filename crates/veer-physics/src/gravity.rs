#![forbid(unsafe_code)]

//! Constant-acceleration kinematics, with and without a bouncing floor.
//!
//! [`Gravity`] is Newton's second law integrated once:
//! `x(t) = x0 + v0·t + ½·a·t²`. It never settles on its own, so a
//! termination distance bounds it — past that the model reports done.
//!
//! [`GravityWithBounce`] puts a floor at 0 and reflects the velocity with a
//! restitution factor each time the trajectory penetrates it. Positions past
//! the floor read as 0. Sign convention follows the trajectory: positive
//! positions are beyond the floor, so a positive acceleration pulls the value
//! toward (and through) it.

use crate::motion::Motion;
use crate::tune::{ParamSpec, Tunable};

/// Unbounded constant acceleration.
#[derive(Debug, Clone)]
pub struct Gravity {
    acceleration: f64,
    terminate: f64,
    x0: f64,
    v0: f64,
    start_time: f64,
}

impl Gravity {
    /// Create a gravity model that reports done once |position| exceeds
    /// `terminate`.
    #[must_use]
    pub fn new(acceleration: f64, terminate: f64) -> Self {
        Self {
            acceleration,
            terminate,
            x0: 0.0,
            v0: 0.0,
            start_time: 0.0,
        }
    }

    /// Current acceleration.
    #[must_use]
    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    /// Change the acceleration without disturbing current motion.
    pub fn reconfigure(&mut self, acceleration: f64, now: f64) {
        let x = self.sample_x(now);
        let v = self.sample_dx(now);
        self.set(x, v, now);
        self.acceleration = acceleration;
    }

    fn sample_x(&self, now: f64) -> f64 {
        let dt = now - self.start_time;
        self.x0 + self.v0 * dt + 0.5 * self.acceleration * dt * dt
    }

    fn sample_dx(&self, now: f64) -> f64 {
        self.v0 + (now - self.start_time) * self.acceleration
    }
}

impl Motion for Gravity {
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
        self.sample_x(now).abs() > self.terminate
    }
}

impl Tunable for Gravity {
    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[ParamSpec {
            key: "acceleration",
            label: "Acceleration",
            min: -3000.0,
            max: 3000.0,
            step: 1.0,
        }];
        PARAMS
    }

    fn param(&self, key: &str) -> Option<f64> {
        (key == "acceleration").then_some(self.acceleration)
    }

    fn set_param(&mut self, key: &str, value: f64, now: f64) -> bool {
        if key == "acceleration" {
            self.reconfigure(value, now);
            true
        } else {
            false
        }
    }
}

/// Assumed display rate for the bounce rest heuristic.
const BOUNCE_FRAME_RATE: f64 = 60.0;

/// Gravity with a floor at 0 and partially elastic bounces.
#[derive(Debug, Clone)]
pub struct GravityWithBounce {
    gravity: Gravity,
    restitution: f64,
    rebounded_last: bool,
    rested: bool,
}

impl GravityWithBounce {
    /// Create a bouncing model; `restitution` scales the reflected speed.
    #[must_use]
    pub fn new(acceleration: f64, restitution: f64) -> Self {
        Self {
            gravity: Gravity::new(acceleration, 0.0),
            restitution,
            rebounded_last: false,
            rested: false,
        }
    }

    /// Restitution factor applied at each floor contact.
    #[must_use]
    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    /// Change acceleration and restitution mid-flight.
    pub fn reconfigure(&mut self, acceleration: f64, restitution: f64, now: f64) {
        self.gravity.reconfigure(acceleration, now);
        self.restitution = restitution;
    }
}

impl Motion for GravityWithBounce {
    fn set(&mut self, x: f64, v: f64, now: f64) {
        self.gravity.set(x, v, now);
        self.rebounded_last = false;
        self.rested = false;
    }

    /// Sample position, reflecting at the floor when the trajectory has
    /// penetrated it since the last sample.
    ///
    /// Rest detection is sampling-based: a reflected speed smaller than the
    /// speed gained over one frame of free fall cannot escape the floor
    /// before the next sample, so the model clamps to rest. Two consecutive
    /// floor contacts also read as rest, which guards against undersampled
    /// micro-bounces oscillating forever.
    fn x(&mut self, now: f64) -> f64 {
        if self.rested {
            return 0.0;
        }
        let x = self.gravity.x(now);
        if x > 0.0 {
            if self.rebounded_last {
                self.rested = true;
                return 0.0;
            }
            self.rebounded_last = true;
            let v = self.gravity.dx(now);
            let frame_gain = (self.gravity.acceleration() * 2.0).abs() / BOUNCE_FRAME_RATE;
            if (v * self.restitution).abs() > frame_gain {
                self.gravity.set(0.0, -v * self.restitution, now);
            } else {
                self.rested = true;
            }
            return 0.0;
        }
        self.rebounded_last = false;
        x
    }

    fn dx(&mut self, now: f64) -> f64 {
        if self.rested {
            return 0.0;
        }
        self.gravity.dx(now)
    }

    fn done(&mut self, now: f64) -> bool {
        if self.rested {
            return true;
        }
        let _ = self.x(now);
        self.rested
    }

    fn natural_end(&self) -> Option<f64> {
        Some(0.0)
    }
}

impl Tunable for GravityWithBounce {
    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec {
                key: "acceleration",
                label: "Acceleration",
                min: -3000.0,
                max: 3000.0,
                step: 1.0,
            },
            ParamSpec {
                key: "restitution",
                label: "Rebound",
                min: 0.0,
                max: 1.1,
                step: 0.1,
            },
        ];
        PARAMS
    }

    fn param(&self, key: &str) -> Option<f64> {
        match key {
            "acceleration" => Some(self.gravity.acceleration()),
            "restitution" => Some(self.restitution),
            _ => None,
        }
    }

    fn set_param(&mut self, key: &str, value: f64, now: f64) -> bool {
        match key {
            "acceleration" => self.gravity.reconfigure(value, now),
            "restitution" => self.restitution = value,
            _ => return false,
        }
        true
    }
}
