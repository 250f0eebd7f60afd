#![forbid(unsafe_code)]

//! Named-variable wrapper over the `cassowary` simplex solver.
//!
//! The raw solver deals in anonymous variables and pushes value changes out
//! through `fetch_changes`. This wrapper gives variables names, keeps a cache
//! of the latest solved values (drained after every mutating call, so every
//! operation "implicitly re-solves" from the caller's point of view), and
//! adds two facilities the raw solver lacks:
//!
//! - **Stays** — a variable holds its last rest value at a configurable
//!   strength. The underlying solver has no stay concept, so each stay is an
//!   equality constraint that is re-pinned to the variable's current value
//!   whenever the edit batch closes.
//! - **A single-slot edit batch** — at most one set of edit variables is
//!   open at a time ([`open_edit`](ConstraintSystem::open_edit) /
//!   [`suggest`](ConstraintSystem::suggest) /
//!   [`close_edit`](ConstraintSystem::close_edit)).
//!   [`MultiEditSession`](crate::session::MultiEditSession) multiplexes this
//!   slot; almost nothing else should call it directly.
//!
//! # Sensitivity
//!
//! [`sensitivity`](ConstraintSystem::sensitivity) reports how strongly an
//! observed variable responds to an edited one under the current basis —
//! the coefficient that ties a gesture to the value it is indirectly moving.
//! The raw solver keeps its tableau private, so the coefficient is recovered
//! by probing: suggest `base + 1`, read the observed delta, suggest `base`
//! back. The system is linear, which makes the probe exact, and restoring
//! the suggestion returns the solver to the identical solution.

use rustc_hash::FxHashMap;
use std::fmt;
use tracing::warn;

use cassowary::strength as raw_strength;
use cassowary::{Expression, RelationalOperator, Solver, Term};

use crate::error::SolverError;

/// Constraint strength, ordered `Required > Strong > Medium > Weak`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    /// Softest preference.
    Weak,
    /// Default layout strength.
    Medium,
    /// Gesture edits.
    Strong,
    /// Must hold; two conflicting required constraints are a scene bug.
    Required,
}

impl Strength {
    fn value(self) -> f64 {
        match self {
            Self::Weak => raw_strength::WEAK,
            Self::Medium => raw_strength::MEDIUM,
            Self::Strong => raw_strength::STRONG,
            Self::Required => raw_strength::REQUIRED,
        }
    }

    /// Strength value scaled by a weight. Required ignores the weight.
    fn weighted(self, weight: f64) -> f64 {
        match self {
            Self::Weak => raw_strength::create(0.0, 0.0, 1.0, weight),
            Self::Medium => raw_strength::create(0.0, 1.0, 0.0, weight),
            Self::Strong => raw_strength::create(1.0, 0.0, 0.0, weight),
            Self::Required => raw_strength::REQUIRED,
        }
    }
}

/// A named scalar participating in the constraint system.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable {
    pub(crate) raw: cassowary::Variable,
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable({:?})", self.raw)
    }
}

/// Handle to a constraint added through [`ConstraintSystem::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintId(u64);

/// Relation between the two sides of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rel {
    /// `lhs <= rhs`
    Le,
    /// `lhs == rhs`
    Eq,
    /// `lhs >= rhs`
    Ge,
}

impl Rel {
    fn raw(self) -> RelationalOperator {
        match self {
            Self::Le => RelationalOperator::LessOrEqual,
            Self::Eq => RelationalOperator::Equal,
            Self::Ge => RelationalOperator::GreaterOrEqual,
        }
    }
}

/// A linear combination of variables plus a constant.
///
/// Built with small combinators so scene code reads close to the math:
/// `LinExpr::var(bottom).minus_var(top)` is `bottom - top`.
#[derive(Debug, Clone, Default)]
pub struct LinExpr {
    terms: Vec<(Variable, f64)>,
    constant: f64,
}

impl LinExpr {
    /// The expression `v`.
    #[must_use]
    pub fn var(v: Variable) -> Self {
        Self {
            terms: vec![(v, 1.0)],
            constant: 0.0,
        }
    }

    /// The expression `coefficient · v`.
    #[must_use]
    pub fn term(v: Variable, coefficient: f64) -> Self {
        Self {
            terms: vec![(v, coefficient)],
            constant: 0.0,
        }
    }

    /// The constant expression `c`.
    #[must_use]
    pub fn constant(c: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: c,
        }
    }

    /// Add `v` to the expression.
    #[must_use]
    pub fn plus_var(mut self, v: Variable) -> Self {
        self.terms.push((v, 1.0));
        self
    }

    /// Subtract `v` from the expression.
    #[must_use]
    pub fn minus_var(mut self, v: Variable) -> Self {
        self.terms.push((v, -1.0));
        self
    }

    /// Add `coefficient · v` to the expression.
    #[must_use]
    pub fn plus_term(mut self, v: Variable, coefficient: f64) -> Self {
        self.terms.push((v, coefficient));
        self
    }

    /// Add a constant to the expression.
    #[must_use]
    pub fn plus(mut self, c: f64) -> Self {
        self.constant += c;
        self
    }

    /// Lower into the raw solver's expression form, negated if asked —
    /// constraints are expressed as `lhs - rhs (rel) 0`.
    fn lower(&self, sign: f64, into: &mut Vec<Term>) -> f64 {
        for &(v, coefficient) in &self.terms {
            into.push(Term {
                variable: v.raw,
                coefficient: coefficient * sign,
            });
        }
        self.constant * sign
    }
}

impl From<Variable> for LinExpr {
    fn from(v: Variable) -> Self {
        Self::var(v)
    }
}

impl From<f64> for LinExpr {
    fn from(c: f64) -> Self {
        Self::constant(c)
    }
}

/// A stay: an equality re-pinned to the variable's latest rest value.
struct Stay {
    strength: Strength,
    pinned_value: f64,
    constraint: cassowary::Constraint,
}

/// One variable of the open edit batch.
struct EditVar {
    variable: Variable,
    suggested: Option<f64>,
}

/// Named variables, constraints, stays and the single edit slot.
pub struct ConstraintSystem {
    solver: Solver,
    names: FxHashMap<cassowary::Variable, String>,
    values: FxHashMap<cassowary::Variable, f64>,
    constraints: FxHashMap<u64, cassowary::Constraint>,
    next_constraint: u64,
    stays: FxHashMap<cassowary::Variable, Stay>,
    edit: Option<Vec<EditVar>>,
}

impl Default for ConstraintSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintSystem {
    /// An empty system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            names: FxHashMap::default(),
            values: FxHashMap::default(),
            constraints: FxHashMap::default(),
            next_constraint: 0,
            stays: FxHashMap::default(),
            edit: None,
        }
    }

    /// Create a named variable. Variables start at 0 and persist for the
    /// life of the system.
    pub fn variable(&mut self, name: impl Into<String>) -> Variable {
        let raw = cassowary::Variable::new();
        self.names.insert(raw, name.into());
        Variable { raw }
    }

    /// The name a variable was created with.
    #[must_use]
    pub fn name(&self, v: Variable) -> &str {
        self.names.get(&v.raw).map_or("<unnamed>", String::as_str)
    }

    /// Latest solved value of a variable.
    #[must_use]
    pub fn value(&self, v: Variable) -> f64 {
        self.values.get(&v.raw).copied().unwrap_or(0.0)
    }

    /// Add the constraint `lhs (rel) rhs` at the given strength.
    pub fn add(
        &mut self,
        lhs: impl Into<LinExpr>,
        rel: Rel,
        rhs: impl Into<LinExpr>,
        strength: Strength,
    ) -> Result<ConstraintId, SolverError> {
        self.add_raw(lhs.into(), rel, rhs.into(), strength.value())
    }

    /// Like [`add`](Self::add), with a weight differentiating constraints of
    /// equal strength.
    pub fn add_weighted(
        &mut self,
        lhs: impl Into<LinExpr>,
        rel: Rel,
        rhs: impl Into<LinExpr>,
        strength: Strength,
        weight: f64,
    ) -> Result<ConstraintId, SolverError> {
        self.add_raw(lhs.into(), rel, rhs.into(), strength.weighted(weight))
    }

    fn add_raw(
        &mut self,
        lhs: LinExpr,
        rel: Rel,
        rhs: LinExpr,
        strength: f64,
    ) -> Result<ConstraintId, SolverError> {
        let mut terms = Vec::with_capacity(lhs.terms.len() + rhs.terms.len());
        let mut constant = lhs.lower(1.0, &mut terms);
        constant += rhs.lower(-1.0, &mut terms);
        let constraint = cassowary::Constraint::new(
            Expression { terms, constant },
            rel.raw(),
            strength,
        );
        self.solver.add_constraint(constraint.clone())?;
        self.resolve();
        let id = ConstraintId(self.next_constraint);
        self.next_constraint += 1;
        self.constraints.insert(id.0, constraint);
        Ok(id)
    }

    /// Remove a previously added constraint.
    pub fn remove(&mut self, id: ConstraintId) -> Result<(), SolverError> {
        let constraint = self
            .constraints
            .remove(&id.0)
            .ok_or(SolverError::UnknownConstraint)?;
        self.solver.remove_constraint(&constraint)?;
        self.resolve();
        Ok(())
    }

    /// Hold `v` at its current value with the given strength.
    ///
    /// The pin follows the variable: whenever an edit batch closes, every
    /// stay is re-pinned to the value its variable ended up at. Adding a
    /// stay to a variable that already has one replaces it.
    pub fn add_stay(&mut self, v: Variable, strength: Strength) -> Result<(), SolverError> {
        if let Some(previous) = self.stays.remove(&v.raw) {
            if let Err(err) = self.solver.remove_constraint(&previous.constraint) {
                warn!(variable = self.name(v), ?err, "failed to drop replaced stay");
            }
        }
        let pinned_value = self.value(v);
        let constraint = Self::stay_constraint(v, pinned_value, strength);
        self.solver.add_constraint(constraint.clone())?;
        self.resolve();
        self.stays.insert(
            v.raw,
            Stay {
                strength,
                pinned_value,
                constraint,
            },
        );
        Ok(())
    }

    fn stay_constraint(v: Variable, value: f64, strength: Strength) -> cassowary::Constraint {
        cassowary::Constraint::new(
            Expression {
                terms: vec![Term {
                    variable: v.raw,
                    coefficient: 1.0,
                }],
                constant: -value,
            },
            RelationalOperator::Equal,
            strength.value(),
        )
    }

    /// Re-pin every stay whose variable has drifted from its pinned value.
    fn refresh_stays(&mut self) {
        let stale: Vec<(cassowary::Variable, f64)> = self
            .stays
            .iter()
            .filter_map(|(raw, stay)| {
                let current = self.values.get(raw).copied().unwrap_or(0.0);
                (current != stay.pinned_value).then_some((*raw, current))
            })
            .collect();
        for (raw, value) in stale {
            let Some(stay) = self.stays.get_mut(&raw) else {
                continue;
            };
            if let Err(err) = self.solver.remove_constraint(&stay.constraint) {
                warn!(variable = ?raw, ?err, "failed to unpin stay");
                continue;
            }
            let constraint = Self::stay_constraint(Variable { raw }, value, stay.strength);
            stay.pinned_value = value;
            stay.constraint = constraint.clone();
            if let Err(err) = self.solver.add_constraint(constraint) {
                warn!(variable = ?raw, ?err, "failed to re-pin stay");
            }
        }
        self.resolve();
    }

    /// Whether the edit slot is occupied.
    #[must_use]
    pub fn edit_open(&self) -> bool {
        self.edit.is_some()
    }

    /// Whether `v` belongs to the open edit batch.
    #[must_use]
    pub fn is_edited(&self, v: Variable) -> bool {
        self.edit
            .as_ref()
            .is_some_and(|batch| batch.iter().any(|e| e.variable == v))
    }

    /// Open the single edit batch over the given variables.
    ///
    /// Only one batch may be open; opening over an existing batch closes it
    /// first (with a warning — the multiplexing session should have done
    /// that). Required strength is not editable and is clamped to strong.
    pub fn open_edit(&mut self, vars: &[(Variable, Strength)]) {
        if self.edit.is_some() {
            warn!("edit batch already open; closing it");
            self.close_edit();
        }
        let mut batch = Vec::with_capacity(vars.len());
        for &(variable, strength) in vars {
            let strength = if strength == Strength::Required {
                warn!(
                    variable = self.name(variable),
                    "edits cannot be required; clamping to strong"
                );
                Strength::Strong
            } else {
                strength
            };
            match self.solver.add_edit_variable(variable.raw, strength.value()) {
                Ok(()) => batch.push(EditVar {
                    variable,
                    suggested: None,
                }),
                Err(err) => warn!(
                    variable = self.name(variable),
                    error = %SolverError::from(err),
                    "could not open edit"
                ),
            }
        }
        self.edit = Some(batch);
        self.resolve();
    }

    /// Suggest a value for an edited variable, re-solving incrementally.
    pub fn suggest(&mut self, v: Variable, value: f64) {
        let Some(batch) = self.edit.as_mut() else {
            warn!(
                variable = self.name(v),
                "cannot suggest a value with no open edit"
            );
            return;
        };
        let Some(record) = batch.iter_mut().find(|e| e.variable == v) else {
            warn!(
                variable = self.name(v),
                "cannot suggest a value for a variable that is not edited"
            );
            return;
        };
        record.suggested = Some(value);
        if let Err(err) = self.solver.suggest_value(v.raw, value) {
            warn!(variable = self.name(v), ?err, "suggestion rejected");
        }
        self.resolve();
    }

    /// Close the edit batch, re-pinning stays to the values the edit left
    /// behind.
    pub fn close_edit(&mut self) {
        let Some(batch) = self.edit.take() else {
            warn!("no edit batch to close");
            return;
        };
        self.refresh_stays();
        for record in batch {
            if let Err(err) = self.solver.remove_edit_variable(record.variable.raw) {
                warn!(
                    variable = self.name(record.variable),
                    ?err,
                    "failed to remove edit variable"
                );
            }
        }
        self.resolve();
    }

    /// Sensitivity of `observed` to `edited` under the current basis.
    ///
    /// 0 when `edited` has no open edit — a variable nobody is editing
    /// cannot be the cause of anything.
    pub fn sensitivity(&mut self, edited: Variable, observed: Variable) -> f64 {
        const PROBE: f64 = 1.0;
        let suggested = match self.edit.as_ref() {
            Some(batch) => match batch.iter().find(|e| e.variable == edited) {
                Some(record) => record.suggested,
                None => return 0.0,
            },
            None => return 0.0,
        };
        let base = suggested.unwrap_or_else(|| self.value(edited));
        let before = self.value(observed);
        if self.solver.suggest_value(edited.raw, base + PROBE).is_err() {
            return 0.0;
        }
        self.resolve();
        let after = self.value(observed);
        if let Err(err) = self.solver.suggest_value(edited.raw, base) {
            warn!(variable = self.name(edited), ?err, "probe restore failed");
        }
        self.resolve();
        (after - before) / PROBE
    }

    /// Drain the solver's pending value changes into the cache.
    pub fn resolve(&mut self) {
        for &(raw, value) in self.solver.fetch_changes() {
            self.values.insert(raw, value);
        }
    }
}

impl fmt::Debug for ConstraintSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintSystem")
            .field("variables", &self.names.len())
            .field("constraints", &self.constraints.len())
            .field("stays", &self.stays.len())
            .field("edit_open", &self.edit.is_some())
            .finish()
    }
}
