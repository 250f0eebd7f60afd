#![forbid(unsafe_code)]

//! Pull-based frame scheduling: the [`Timeline`] clock and [`FrameDriver`].
//!
//! Nothing in this crate talks to a host scheduler directly. The host owns a
//! [`Timeline`] and advances it once per frame with the elapsed wall time
//! (`timeline.advance(dt)` from a "next frame" callback in production; fixed
//! steps in tests). A [`FrameDriver`] samples one model per tick at the
//! current instant until the model reports done or the driver is cancelled.
//!
//! # Cancellation
//!
//! [`FrameDriver::cancel`] is idempotent and safe to call at any point,
//! including from code reacting to the sample a tick just produced.
//! A cancelled driver returns `None` from every subsequent [`tick`]
//! (checked before sampling), so a superseded model can never keep mutating
//! shared state.
//!
//! [`tick`]: FrameDriver::tick

use tracing::warn;

use crate::motion::Motion;

/// A monotonically advancing clock measured in seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timeline {
    now: f64,
}

impl Timeline {
    /// A timeline starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current instant in seconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Advance by `dt` seconds (negative deltas are ignored) and return the
    /// new instant.
    pub fn advance(&mut self, dt: f64) -> f64 {
        if !dt.is_finite() {
            warn!(dt, "ignoring non-finite frame delta");
            return self.now;
        }
        if dt > 0.0 {
            self.now += dt;
        }
        self.now
    }
}

/// One position/velocity observation of a driven model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Sampled position.
    pub x: f64,
    /// Sampled velocity.
    pub dx: f64,
    /// Whether this is the model's final sample.
    pub done: bool,
}

/// Drives a boxed model one sample per tick until it settles.
#[derive(Debug)]
pub struct FrameDriver {
    model: Box<dyn Motion>,
    cancelled: bool,
    finished: bool,
}

impl FrameDriver {
    /// Take ownership of a model and start driving it.
    #[must_use]
    pub fn new(model: Box<dyn Motion>) -> Self {
        Self {
            model,
            cancelled: false,
            finished: false,
        }
    }

    /// Sample the model at `now`.
    ///
    /// Returns `None` once the driver is cancelled or the model's final
    /// sample has already been delivered. The final sample itself is
    /// delivered with `done == true`.
    pub fn tick(&mut self, now: f64) -> Option<Sample> {
        if self.cancelled || self.finished {
            return None;
        }
        let x = self.model.x(now);
        let dx = self.model.dx(now);
        let done = self.model.done(now);
        if done {
            self.finished = true;
        }
        Some(Sample { x, dx, done })
    }

    /// Stop driving. Idempotent.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Whether further ticks will produce samples.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.cancelled && !self.finished
    }

    /// The driven model.
    #[must_use]
    pub fn model(&self) -> &dyn Motion {
        self.model.as_ref()
    }

    /// Mutable access to the driven model (retargeting mid-flight).
    pub fn model_mut(&mut self) -> &mut dyn Motion {
        self.model.as_mut()
    }

    /// Give the model back, consuming the driver.
    #[must_use]
    pub fn into_model(self) -> Box<dyn Motion> {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::friction::Friction;

    fn coasting() -> FrameDriver {
        let mut model = Friction::new(0.001);
        model.set(0.0, 500.0, 0.0);
        FrameDriver::new(Box::new(model))
    }

    #[test]
    fn timeline_advances_and_ignores_bad_deltas() {
        let mut tl = Timeline::new();
        assert_eq!(tl.advance(0.5), 0.5);
        assert_eq!(tl.advance(-1.0), 0.5);
        assert_eq!(tl.advance(f64::NAN), 0.5);
        assert_eq!(tl.now(), 0.5);
    }

    #[test]
    fn driver_runs_until_done() {
        let mut driver = coasting();
        let mut tl = Timeline::new();
        let mut last = None;
        let mut ticks = 0;
        while let Some(sample) = driver.tick(tl.advance(1.0 / 60.0)) {
            last = Some(sample);
            ticks += 1;
            assert!(ticks < 2000, "driver never finished");
        }
        let last = last.expect("at least one sample");
        assert!(last.done);
        assert!(last.dx.abs() < 1.0);
        assert!(!driver.is_active());
    }

    #[test]
    fn final_sample_is_delivered_once() {
        let mut driver = coasting();
        // Jump straight past the settle point.
        let sample = driver.tick(60.0).unwrap();
        assert!(sample.done);
        assert!(driver.tick(61.0).is_none());
    }

    #[test]
    fn cancel_is_idempotent_and_stops_samples() {
        let mut driver = coasting();
        assert!(driver.tick(0.1).is_some());
        driver.cancel();
        driver.cancel();
        assert!(driver.tick(0.2).is_none());
        assert!(!driver.is_active());
    }

    #[test]
    fn into_model_returns_residual_state() {
        let mut driver = coasting();
        let _ = driver.tick(0.5);
        let mut model = driver.into_model();
        assert!(model.dx(0.5).abs() > 0.0);
    }
}
