#![forbid(unsafe_code)]

//! Panes: rectangles positioned by the solver, committed economically.
//!
//! A [`Pane`] binds its four edges to solver variables (or fixed values)
//! and, once per update, resolves them into a [`Frame`] and hands it to a
//! [`RenderTarget`]. Commits are deduplicated against the previous frame —
//! re-laying-out a surface is the expensive operation in any real host, so
//! an unchanged rectangle must never reach it.
//!
//! Coordinates are rounded to a configurable device-pixel grid before the
//! comparison, which also keeps sub-physical-pixel spring tails from
//! causing an endless trickle of commits.

use std::fmt;

use serde::{Deserialize, Serialize};
use veer_solver::{ConstraintSystem, Variable};

/// A resolved rectangle. Width and height are clamped to be non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width, ≥ 0.
    pub width: f64,
    /// Height, ≥ 0.
    pub height: f64,
}

/// Consumer of resolved frames — a visual surface of some kind.
pub trait RenderTarget {
    /// Apply a frame. Only called when the frame differs from the last
    /// committed one.
    fn commit(&mut self, frame: Frame);
}

impl<F: FnMut(Frame)> RenderTarget for F {
    fn commit(&mut self, frame: Frame) {
        self(frame);
    }
}

/// One edge of a pane: a constant or a solver variable.
#[derive(Debug, Clone, Copy)]
pub enum Anchor {
    /// Fixed coordinate.
    Value(f64),
    /// Solver-positioned coordinate.
    Var(Variable),
}

impl Anchor {
    fn resolve(self, system: &ConstraintSystem) -> f64 {
        match self {
            Self::Value(v) => v,
            Self::Var(v) => system.value(v),
        }
    }
}

impl From<f64> for Anchor {
    fn from(v: f64) -> Self {
        Self::Value(v)
    }
}

impl From<Variable> for Anchor {
    fn from(v: Variable) -> Self {
        Self::Var(v)
    }
}

/// A solver-positioned rectangle bound to a render target.
pub struct Pane {
    left: Anchor,
    top: Anchor,
    right: Anchor,
    bottom: Anchor,
    scale: f64,
    last: Option<Frame>,
    target: Box<dyn RenderTarget>,
}

impl Pane {
    /// A pane over the given target with all edges fixed at 0.
    #[must_use]
    pub fn new(target: Box<dyn RenderTarget>) -> Self {
        Self {
            left: Anchor::Value(0.0),
            top: Anchor::Value(0.0),
            right: Anchor::Value(0.0),
            bottom: Anchor::Value(0.0),
            scale: 1.0,
            last: None,
            target,
        }
    }

    /// Bind the four edges.
    #[must_use]
    pub fn with_edges(
        mut self,
        left: impl Into<Anchor>,
        top: impl Into<Anchor>,
        right: impl Into<Anchor>,
        bottom: impl Into<Anchor>,
    ) -> Self {
        self.left = left.into();
        self.top = top.into();
        self.right = right.into();
        self.bottom = bottom.into();
        self
    }

    /// Round coordinates to a 1/`scale` grid (device pixel ratio).
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
        self
    }

    /// The most recently committed frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<Frame> {
        self.last
    }

    fn round(&self, v: f64) -> f64 {
        (v * self.scale).round() / self.scale
    }

    /// Resolve edges and commit if the frame changed.
    pub fn refresh(&mut self, system: &ConstraintSystem) {
        let left = self.left.resolve(system);
        let top = self.top.resolve(system);
        let right = self.right.resolve(system);
        let bottom = self.bottom.resolve(system);
        let frame = Frame {
            x: self.round(left),
            y: self.round(top),
            width: self.round((right - left).max(0.0)),
            height: self.round((bottom - top).max(0.0)),
        };
        if self.last == Some(frame) {
            return;
        }
        self.last = Some(frame);
        self.target.commit(frame);
    }
}

impl fmt::Debug for Pane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pane")
            .field("left", &self.left)
            .field("top", &self.top)
            .field("right", &self.right)
            .field("bottom", &self.bottom)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}
