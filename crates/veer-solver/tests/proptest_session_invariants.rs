//! Property tests for edit-session multiplexing.

use proptest::prelude::*;
use veer_solver::{ConstraintSystem, MultiEditSession, Rel, Strength};

/// A scripted session action over a small pool of variables.
#[derive(Debug, Clone)]
enum Action {
    Begin(usize),
    Suggest(usize, f64),
    End(usize),
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0usize..4).prop_map(Action::Begin),
        ((0usize..4), -500.0f64..500.0).prop_map(|(i, v)| Action::Suggest(i, v)),
        (0usize..4).prop_map(Action::End),
    ]
}

proptest! {
    /// However edits join and leave, every variable with an open edit holds
    /// its most recent suggestion, and every variable without one is
    /// untouched by the churn.
    #[test]
    fn suggestions_always_survive_membership_churn(actions in prop::collection::vec(action(), 1..40)) {
        let mut sys = ConstraintSystem::new();
        let vars: Vec<_> = (0..4).map(|i| sys.variable(format!("v{i}"))).collect();
        for &v in &vars {
            sys.add(v, Rel::Eq, 0.0, Strength::Weak).unwrap();
        }
        let mut session = MultiEditSession::new(sys);

        let mut expected: [Option<f64>; 4] = [None; 4];
        let mut editing: [bool; 4] = [false; 4];

        for act in actions {
            match act {
                Action::Begin(i) => {
                    session.begin_edit(vars[i], Strength::Strong);
                    editing[i] = true;
                }
                Action::Suggest(i, v) => {
                    session.suggest_value(vars[i], v);
                    if editing[i] {
                        expected[i] = Some(v);
                    }
                }
                Action::End(i) => {
                    session.end_edit(vars[i]);
                    editing[i] = false;
                    expected[i] = None;
                }
            }
            for i in 0..4 {
                if editing[i] {
                    if let Some(v) = expected[i] {
                        let got = session.system().value(vars[i]);
                        prop_assert!(
                            (got - v).abs() < 1e-9,
                            "v{i}: expected {v}, got {got}"
                        );
                    }
                }
            }
        }
    }
}
