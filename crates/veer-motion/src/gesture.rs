#![forbid(unsafe_code)]

//! Pointer normalization and release-velocity estimation.
//!
//! A [`PointerTracker`] turns a raw stream of single-point pointer events
//! into the start / move / end shape the motion context consumes, and
//! estimates the release velocity from a short rolling history of
//! timestamped displacements.
//!
//! # Velocity estimation
//!
//! On release, the tracker walks backward from the newest sample looking
//! for one 30–50 ms older. The velocity is the displacement between those
//! two samples over their time difference — recent enough to feel like "the
//! speed my finger had", old enough to smooth over event jitter. If no
//! sample falls in the window (a long hold, or too few events), the
//! velocity is zero: a stationary release must never fling.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Rolling history length, in samples.
const HISTORY: usize = 10;
/// Youngest sample age usable for velocity, in seconds (exclusive).
const WINDOW_MIN: f64 = 0.030;
/// Oldest sample age usable for velocity, in seconds (exclusive).
const WINDOW_MAX: f64 = 0.050;

/// A 2-D velocity in units per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

/// One history entry: time and displacement from the gesture start.
#[derive(Debug, Clone, Copy)]
struct HistorySample {
    t: f64,
    dx: f64,
    dy: f64,
}

/// Single-pointer gesture tracker.
#[derive(Debug, Default)]
pub struct PointerTracker {
    history: VecDeque<HistorySample>,
    active: bool,
}

impl PointerTracker {
    /// An inactive tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Begin a gesture at time `t` (seconds).
    pub fn begin(&mut self, t: f64) {
        self.history.clear();
        self.history.push_back(HistorySample {
            t,
            dx: 0.0,
            dy: 0.0,
        });
        self.active = true;
    }

    /// Record a move with displacement `(dx, dy)` from the gesture start.
    ///
    /// Ignored while no gesture is active (a stray move after a drop).
    pub fn track(&mut self, t: f64, dx: f64, dy: f64) {
        if !self.active {
            return;
        }
        self.history.push_back(HistorySample { t, dx, dy });
        while self.history.len() > HISTORY {
            self.history.pop_front();
        }
    }

    /// End the gesture and estimate the release velocity.
    #[must_use]
    pub fn finish(&mut self) -> Velocity {
        self.active = false;
        let velocity = self.estimate();
        self.history.clear();
        velocity
    }

    fn estimate(&self) -> Velocity {
        if self.history.len() <= 2 {
            return Velocity::default();
        }
        let newest = self.history[self.history.len() - 1];
        for sample in self.history.iter().rev().skip(1) {
            let dt = newest.t - sample.t;
            if dt > WINDOW_MIN && dt < WINDOW_MAX {
                return Velocity {
                    x: (newest.dx - sample.dx) / dt,
                    y: (newest.dy - sample.dy) / dt,
                };
            }
        }
        Velocity::default()
    }
}
