#![forbid(unsafe_code)]

//! Solver error type.

use std::error::Error;
use std::fmt;

use cassowary::{AddConstraintError, AddEditVariableError, RemoveConstraintError};

/// Errors surfaced when authoring a constraint scene.
///
/// These are configuration errors: a conflicting pair of required
/// constraints means the scene itself is wrong and should be fixed where it
/// is built. Runtime protocol slips (suggesting without an open edit,
/// ending an edit twice) are deliberately *not* errors — they are logged and
/// ignored so a dropped or reordered gesture event can never wedge the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// A required-strength constraint conflicts with another required
    /// constraint.
    Unsatisfiable,
    /// The exact constraint was already added.
    DuplicateConstraint,
    /// The constraint handle does not name a live constraint.
    UnknownConstraint,
    /// The underlying solver reported an internal fault.
    Internal(&'static str),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsatisfiable => write!(f, "required constraints are unsatisfiable"),
            Self::DuplicateConstraint => write!(f, "constraint was already added"),
            Self::UnknownConstraint => write!(f, "no such constraint"),
            Self::Internal(msg) => write!(f, "internal solver error: {msg}"),
        }
    }
}

impl Error for SolverError {}

impl From<AddConstraintError> for SolverError {
    fn from(err: AddConstraintError) -> Self {
        match err {
            AddConstraintError::DuplicateConstraint => Self::DuplicateConstraint,
            AddConstraintError::UnsatisfiableConstraint => Self::Unsatisfiable,
            AddConstraintError::InternalSolverError(msg) => Self::Internal(msg),
        }
    }
}

impl From<RemoveConstraintError> for SolverError {
    fn from(err: RemoveConstraintError) -> Self {
        match err {
            RemoveConstraintError::UnknownConstraint => Self::UnknownConstraint,
            RemoveConstraintError::InternalSolverError(msg) => Self::Internal(msg),
        }
    }
}

impl From<AddEditVariableError> for SolverError {
    fn from(err: AddEditVariableError) -> Self {
        match err {
            AddEditVariableError::DuplicateEditVariable => {
                Self::Internal("edit variable added twice")
            }
            AddEditVariableError::BadRequiredStrength => {
                Self::Internal("edit variables cannot be required")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            SolverError::Unsatisfiable.to_string(),
            "required constraints are unsatisfiable"
        );
        assert_eq!(
            SolverError::Internal("objective unbounded").to_string(),
            "internal solver error: objective unbounded"
        );
    }

    #[test]
    fn add_constraint_errors_map_across() {
        assert_eq!(
            SolverError::from(AddConstraintError::UnsatisfiableConstraint),
            SolverError::Unsatisfiable
        );
        assert_eq!(
            SolverError::from(AddConstraintError::DuplicateConstraint),
            SolverError::DuplicateConstraint
        );
    }
}
