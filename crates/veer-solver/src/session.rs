#![forbid(unsafe_code)]

//! Multiplexing of the solver's single edit slot.
//!
//! The underlying solver supports one open edit batch at a time, but a scene
//! has many independent gesture handlers, each wanting a long-lived edit on
//! its own variable. [`MultiEditSession`] bridges the two: it records every
//! caller's edit (variable, strength, last suggested value) and, whenever
//! the *set* of edited variables changes, closes the batch and reopens it
//! naming every tracked variable, replaying all recorded suggestions.
//!
//! The visible guarantee: concurrent edits on distinct variables never
//! invalidate one another's suggested values. The cost is a full batch
//! rebuild on every join/leave — ordinary moves stay incremental.

use tracing::{debug, warn};

use crate::system::{ConstraintSystem, Strength, Variable};

/// One tracked edit.
#[derive(Debug, Clone, Copy)]
pub struct EditRecord {
    /// The edited variable.
    pub variable: Variable,
    /// Strength the edit was opened at.
    pub strength: Strength,
    /// Most recent suggestion, replayed across batch rebuilds.
    pub last_suggested: Option<f64>,
}

/// Shared front door to the constraint system's edit slot.
#[derive(Debug)]
pub struct MultiEditSession {
    system: ConstraintSystem,
    records: Vec<EditRecord>,
}

impl MultiEditSession {
    /// Wrap a constraint system.
    #[must_use]
    pub fn new(system: ConstraintSystem) -> Self {
        Self {
            system,
            records: Vec::new(),
        }
    }

    /// The wrapped system.
    #[must_use]
    pub fn system(&self) -> &ConstraintSystem {
        &self.system
    }

    /// Mutable access to the wrapped system (scene authoring, sensitivity).
    pub fn system_mut(&mut self) -> &mut ConstraintSystem {
        &mut self.system
    }

    /// Unwrap, discarding edit bookkeeping.
    #[must_use]
    pub fn into_system(self) -> ConstraintSystem {
        self.system
    }

    /// Whether `v` currently holds an edit.
    #[must_use]
    pub fn is_editing(&self, v: Variable) -> bool {
        self.records.iter().any(|r| r.variable == v)
    }

    /// Start editing `v` at `strength`. Beginning an edit on a variable
    /// already being edited is a no-op.
    pub fn begin_edit(&mut self, v: Variable, strength: Strength) {
        if self.is_editing(v) {
            debug!(variable = self.system.name(v), "edit already open");
            return;
        }
        self.records.push(EditRecord {
            variable: v,
            strength,
            last_suggested: None,
        });
        self.reedit();
    }

    /// Stop editing `v`, replaying the remaining edits.
    pub fn end_edit(&mut self, v: Variable) {
        let Some(idx) = self.records.iter().position(|r| r.variable == v) else {
            warn!(
                variable = self.system.name(v),
                "cannot end an edit on a variable that is not being edited"
            );
            return;
        };
        self.records.remove(idx);
        self.reedit();
    }

    /// Suggest a value for an edited variable.
    pub fn suggest_value(&mut self, v: Variable, value: f64) {
        let Some(record) = self.records.iter_mut().find(|r| r.variable == v) else {
            warn!(
                variable = self.system.name(v),
                "cannot suggest a value for a variable that is not being edited"
            );
            return;
        };
        record.last_suggested = Some(value);
        self.system.suggest(v, value);
    }

    /// Tear down and rebuild the solver's edit batch from the records.
    fn reedit(&mut self) {
        if self.system.edit_open() {
            self.system.close_edit();
        }
        if self.records.is_empty() {
            return;
        }
        debug!(edits = self.records.len(), "rebuilding edit batch");
        let vars: Vec<(Variable, Strength)> = self
            .records
            .iter()
            .map(|r| (r.variable, r.strength))
            .collect();
        self.system.open_edit(&vars);
        for record in &self.records {
            if let Some(value) = record.last_suggested {
                self.system.suggest(record.variable, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::Rel;

    fn session_with_vars() -> (MultiEditSession, Variable, Variable) {
        let mut sys = ConstraintSystem::new();
        let a = sys.variable("a");
        let b = sys.variable("b");
        sys.add(a, Rel::Eq, 0.0, Strength::Weak).unwrap();
        sys.add(b, Rel::Eq, 0.0, Strength::Weak).unwrap();
        let session = MultiEditSession::new(sys);
        (session, a, b)
    }

    #[test]
    fn begin_edit_is_idempotent() {
        let (mut session, a, _) = session_with_vars();
        session.begin_edit(a, Strength::Strong);
        session.suggest_value(a, 11.0);
        session.begin_edit(a, Strength::Strong);
        // The replayable suggestion survives the duplicate begin.
        assert_eq!(session.system().value(a), 11.0);
        assert!(session.is_editing(a));
    }

    #[test]
    fn suggestions_survive_concurrent_join_and_leave() {
        let (mut session, a, b) = session_with_vars();
        session.begin_edit(a, Strength::Strong);
        session.suggest_value(a, 50.0);

        // Another caller joins on an unrelated variable...
        session.begin_edit(b, Strength::Strong);
        session.suggest_value(b, -20.0);
        assert_eq!(session.system().value(a), 50.0);
        assert_eq!(session.system().value(b), -20.0);

        // ...and leaves again.
        session.end_edit(b);
        assert_eq!(session.system().value(a), 50.0);
        assert!(!session.is_editing(b));
    }

    #[test]
    fn end_edit_on_unedited_variable_is_ignored() {
        let (mut session, a, _) = session_with_vars();
        session.end_edit(a); // warns, no-op
        assert!(!session.is_editing(a));
    }

    #[test]
    fn suggest_on_unedited_variable_is_ignored() {
        let (mut session, a, _) = session_with_vars();
        session.suggest_value(a, 99.0);
        assert_eq!(session.system().value(a), 0.0);
    }

    #[test]
    fn ending_last_edit_frees_the_slot() {
        let (mut session, a, _) = session_with_vars();
        session.begin_edit(a, Strength::Strong);
        session.suggest_value(a, 5.0);
        session.end_edit(a);
        assert!(!session.system().edit_open());
    }
}
