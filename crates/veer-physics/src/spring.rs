#![forbid(unsafe_code)]

//! Damped harmonic oscillator solved in closed form.
//!
//! Solves `m·x'' + c·x' + k·x = 0` around a movable equilibrium
//! ([`set_end`](Spring::set_end)) by branching on the discriminant
//! `c² − 4mk`:
//!
//! - zero → critically damped, `x(t) = (c1 + c2·t)·e^{r·t}`
//! - positive → overdamped, two real roots, no oscillation
//! - negative → underdamped, `x(t) = e^{r·t}(c1·cos(ω·t) + c2·sin(ω·t))`
//!
//! The symbolic solution is what keeps retargeting cheap and exact: a
//! [`set_end`](Spring::set_end) samples the outgoing solution at the current
//! instant and derives new coefficients from that position and velocity, so
//! the curve is C¹-continuous across the switch. There is no integrator and
//! therefore no step-size error to tune away.
//!
//! # Invariants
//!
//! 1. `x`/`dx` sampled immediately before and after `set_end` agree to
//!    within [`EPSILON`](crate::motion::EPSILON).
//! 2. `done()` holds exactly when both position and velocity are within
//!    [`EPSILON`](crate::motion::EPSILON) of rest at the equilibrium.
//! 3. A spring queried before any configuration reports the rest state.

use crate::motion::{EPSILON, Motion, almost_equal, almost_zero};
use crate::tune::{ParamSpec, Tunable};

/// Closed-form solution for displacement from the equilibrium.
///
/// `x(t)` is the displacement at `t` seconds after the solution was derived;
/// the spring adds the equilibrium back in when sampling.
#[derive(Debug, Clone, Copy)]
enum Solution {
    /// `(c1 + c2·t)·e^{r·t}` — discriminant exactly zero.
    Critical { c1: f64, c2: f64, r: f64 },
    /// `c1·e^{r1·t} + c2·e^{r2·t}` — two real roots.
    Overdamped { c1: f64, c2: f64, r1: f64, r2: f64 },
    /// `e^{r·t}(c1·cos(ω·t) + c2·sin(ω·t))` — complex roots.
    Underdamped { c1: f64, c2: f64, r: f64, w: f64 },
}

impl Solution {
    fn x(&self, t: f64) -> f64 {
        match *self {
            Self::Critical { c1, c2, r } => (c1 + c2 * t) * (r * t).exp(),
            Self::Overdamped { c1, c2, r1, r2 } => c1 * (r1 * t).exp() + c2 * (r2 * t).exp(),
            Self::Underdamped { c1, c2, r, w } => {
                (r * t).exp() * (c1 * (w * t).cos() + c2 * (w * t).sin())
            }
        }
    }

    fn dx(&self, t: f64) -> f64 {
        match *self {
            Self::Critical { c1, c2, r } => {
                let e = (r * t).exp();
                r * (c1 + c2 * t) * e + c2 * e
            }
            Self::Overdamped { c1, c2, r1, r2 } => {
                c1 * r1 * (r1 * t).exp() + c2 * r2 * (r2 * t).exp()
            }
            Self::Underdamped { c1, c2, r, w } => {
                let e = (r * t).exp();
                let cos = (w * t).cos();
                let sin = (w * t).sin();
                e * (c2 * w * cos - c1 * w * sin) + r * e * (c2 * sin + c1 * cos)
            }
        }
    }
}

/// A damped spring with a movable equilibrium.
#[derive(Debug, Clone)]
pub struct Spring {
    mass: f64,
    k: f64,
    damping: f64,
    end_position: f64,
    start_time: f64,
    solution: Option<Solution>,
}

impl Spring {
    /// Create a spring with the given mass, spring constant and damping.
    ///
    /// The spring starts settled at position 0 with no solution derived;
    /// seed it with [`snap`](Motion::snap) or [`set_end`](Spring::set_end).
    #[must_use]
    pub fn new(mass: f64, k: f64, damping: f64) -> Self {
        Self {
            mass,
            k,
            damping,
            end_position: 0.0,
            start_time: 0.0,
            solution: None,
        }
    }

    /// An underdamped spring with a visible settle wobble.
    #[must_use]
    pub fn underdamped() -> Self {
        Self::new(1.0, 200.0, 20.0)
    }

    /// A critically damped spring: fastest approach with no overshoot.
    #[must_use]
    pub fn critically_damped() -> Self {
        let k = 200.0;
        Self::new(1.0, k, 2.0 * k.sqrt())
    }

    /// Current spring constant.
    #[must_use]
    pub fn spring_constant(&self) -> f64 {
        self.k
    }

    /// Current damping coefficient.
    #[must_use]
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Current equilibrium position.
    #[must_use]
    pub fn end_position(&self) -> f64 {
        self.end_position
    }

    /// Derive the closed-form solution for an initial displacement from the
    /// equilibrium and an initial velocity.
    fn solve(&self, initial: f64, velocity: f64) -> Solution {
        let c = self.damping;
        let m = self.mass;
        let k = self.k;
        // Characteristic roots: (-c ± sqrt(c² − 4mk)) / 2m.
        let cmk = c * c - 4.0 * m * k;
        if cmk == 0.0 {
            let r = -c / (2.0 * m);
            Solution::Critical {
                c1: initial,
                c2: velocity - r * initial,
                r,
            }
        } else if cmk > 0.0 {
            let r1 = (-c - cmk.sqrt()) / (2.0 * m);
            let r2 = (-c + cmk.sqrt()) / (2.0 * m);
            let c2 = (velocity - r1 * initial) / (r2 - r1);
            Solution::Overdamped {
                c1: initial - c2,
                c2,
                r1,
                r2,
            }
        } else {
            let w = (4.0 * m * k - c * c).sqrt() / (2.0 * m);
            let r = -c / (2.0 * m);
            Solution::Underdamped {
                c1: initial,
                c2: (velocity - r * initial) / w,
                r,
                w,
            }
        }
    }

    fn sample_x(&self, now: f64) -> f64 {
        match &self.solution {
            Some(s) => self.end_position + s.x(now - self.start_time),
            None => 0.0,
        }
    }

    fn sample_dx(&self, now: f64) -> f64 {
        match &self.solution {
            Some(s) => s.dx(now - self.start_time),
            None => 0.0,
        }
    }

    /// Move the equilibrium to `x`, optionally injecting velocity `v`.
    ///
    /// The outgoing solution is sampled at `now` and the replacement solution
    /// starts from exactly that position and velocity. Passing a `v` within
    /// [`EPSILON`] of zero keeps the current velocity instead of whacking it.
    pub fn retarget(&mut self, x: f64, v: f64, now: f64) {
        let mut velocity = v;
        let mut position = self.end_position;
        if self.solution.is_some() {
            if almost_zero(velocity, EPSILON) {
                velocity = self.sample_dx(now);
            }
            position = self.sample_x(now);
            if almost_zero(velocity, EPSILON) {
                velocity = 0.0;
            }
            if almost_zero(position - self.end_position, EPSILON) {
                position = self.end_position;
            }
        }
        if self.solution.is_some()
            && almost_zero(position - x, EPSILON)
            && almost_zero(velocity, EPSILON)
        {
            return;
        }
        self.end_position = x;
        self.solution = Some(self.solve(position - x, velocity));
        self.start_time = now;
    }

    /// Change mass, spring constant and damping without disturbing motion.
    ///
    /// If the spring is still moving, the new coefficients are derived from
    /// the currently sampled position and velocity.
    pub fn reconfigure(&mut self, mass: f64, k: f64, damping: f64, now: f64) {
        let x = self.sample_x(now);
        let dx = self.sample_dx(now);
        self.mass = mass;
        self.k = k;
        self.damping = damping;
        if self.done_at(now) {
            return;
        }
        self.solution = Some(self.solve(x - self.end_position, dx));
        self.start_time = now;
    }

    fn done_at(&self, now: f64) -> bool {
        almost_equal(self.sample_x(now), self.end_position, EPSILON)
            && almost_zero(self.sample_dx(now), EPSILON)
    }
}

impl Motion for Spring {
    /// Keep the current equilibrium and restart from position `x`,
    /// velocity `v`.
    fn set(&mut self, x: f64, v: f64, now: f64) {
        self.solution = Some(self.solve(x - self.end_position, v));
        self.start_time = now;
    }

    fn x(&mut self, now: f64) -> f64 {
        self.sample_x(now)
    }

    fn dx(&mut self, now: f64) -> f64 {
        self.sample_dx(now)
    }

    fn done(&mut self, now: f64) -> bool {
        self.done_at(now)
    }

    fn snap(&mut self, x: f64, now: f64) {
        self.start_time = now;
        self.end_position = x;
        self.solution = Some(Solution::Critical {
            c1: 0.0,
            c2: 0.0,
            r: 0.0,
        });
    }

    fn set_end(&mut self, end: f64, v: f64, now: f64) {
        self.retarget(end, v, now);
    }

    fn natural_end(&self) -> Option<f64> {
        Some(self.end_position)
    }
}

impl Tunable for Spring {
    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
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
            "spring-constant" => Some(self.k),
            "damping" => Some(self.damping),
            _ => None,
        }
    }

    fn set_param(&mut self, key: &str, value: f64, now: f64) -> bool {
        match key {
            "spring-constant" => self.reconfigure(self.mass, value, self.damping, now),
            "damping" => self.reconfigure(self.mass, self.k, value, now),
            _ => return false,
        }
        true
    }
}
