#![forbid(unsafe_code)]

//! Uniform live-tuning surface for physics models.
//!
//! Every model describes its adjustable parameters as [`ParamSpec`] rows and
//! accepts keyed reads/writes. A host can build sliders (or any other
//! control) from the specs without this crate knowing about UI toolkits.
//! Writes go through each model's `reconfigure` path, so tweaking a slider
//! mid-animation re-derives coefficients from the motion in progress rather
//! than restarting it.

use serde::{Deserialize, Serialize};

/// Description of one tunable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Stable identifier used with [`Tunable::param`] / [`Tunable::set_param`].
    pub key: &'static str,
    /// Human-readable label for a control row.
    pub label: &'static str,
    /// Smallest sensible value.
    pub min: f64,
    /// Largest sensible value.
    pub max: f64,
    /// Suggested control increment.
    pub step: f64,
}

/// A model whose parameters can be inspected and adjusted live.
pub trait Tunable {
    /// The parameters this model exposes.
    fn params(&self) -> &'static [ParamSpec];

    /// Read a parameter by key. `None` for unknown keys.
    fn param(&self, key: &str) -> Option<f64>;

    /// Write a parameter by key, re-deriving motion at instant `now`.
    /// Returns `false` (and leaves the model untouched) for unknown keys.
    fn set_param(&mut self, key: &str, value: f64, now: f64) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fall::Fall;
    use crate::friction::Friction;
    use crate::gravity::{Gravity, GravityWithBounce};
    use crate::spring::Spring;

    fn check_specs(model: &dyn Tunable) {
        for spec in model.params() {
            assert!(spec.min < spec.max, "{}: empty range", spec.key);
            assert!(spec.step > 0.0, "{}: bad step", spec.key);
            let value = model.param(spec.key);
            assert!(value.is_some(), "{}: spec without accessor", spec.key);
        }
    }

    #[test]
    fn every_model_describes_consistent_params() {
        check_specs(&Spring::underdamped());
        check_specs(&Friction::new(0.001));
        check_specs(&Gravity::new(1000.0, 500.0));
        check_specs(&GravityWithBounce::new(1000.0, 0.5));
        check_specs(&Fall::new(300.0));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut spring = Spring::underdamped();
        assert_eq!(spring.param("nope"), None);
        assert!(!spring.set_param("nope", 1.0, 0.0));
    }
}
