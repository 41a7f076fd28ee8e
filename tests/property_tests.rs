//! Property-based coverage of the codec round-trip law and the rename
//! transformation's structural-preservation law, over a small generated
//! family of grounded tasks.

use machetli_core::task::{rename, read_task, write_task, Effect, GroundedTask, Operator, Variable};
use quickcheck::{quickcheck, Gen, Arbitrary};

/// A grounded task built deterministically from a handful of bounded
/// parameters, so `quickcheck` can shrink failures to a small case.
#[derive(Debug, Clone)]
struct SmallTask(GroundedTask);

impl Arbitrary for SmallTask {
    fn arbitrary(g: &mut Gen) -> Self {
        let num_vars = 1 + (usize::arbitrary(g) % 3);
        let domain_size = 2 + (usize::arbitrary(g) % 2);

        let variables: Vec<Variable> = (0..num_vars)
            .map(|_| Variable {
                axiom_layer: -1,
                value_names: (0..domain_size).map(|i| format!("val{i}")).collect(),
            })
            .collect();

        let init: Vec<i32> = (0..num_vars).map(|_| (usize::arbitrary(g) % domain_size) as i32).collect();

        let goal_var = usize::arbitrary(g) % num_vars;
        let goal_val = (usize::arbitrary(g) % domain_size) as i32;

        let num_ops = 1 + (usize::arbitrary(g) % 3);
        let operators: Vec<Operator> = (0..num_ops)
            .map(|i| {
                let var = usize::arbitrary(g) % num_vars;
                let post = (usize::arbitrary(g) % domain_size) as i32;
                Operator {
                    name: format!("(op{i})"),
                    prevail: vec![],
                    effects: vec![Effect {
                        var,
                        pre: -1,
                        post,
                        condition: vec![],
                    }],
                    cost: (usize::arbitrary(g) % 5) as i32,
                }
            })
            .collect();

        let task = GroundedTask::new(
            variables,
            vec![],
            init,
            vec![(goal_var, goal_val)],
            operators,
            vec![],
            bool::arbitrary(g),
        )
        .expect("generated task satisfies all structural invariants by construction");

        SmallTask(task)
    }
}

quickcheck! {
    fn codec_round_trip_is_identity(task: SmallTask) -> bool {
        let written = write_task(&task.0).unwrap();
        let reparsed = read_task(&written).unwrap();
        reparsed == task.0
    }

    fn codec_write_is_deterministic(task: SmallTask) -> bool {
        write_task(&task.0).unwrap() == write_task(&task.0).unwrap()
    }

    fn rename_preserves_structure(task: SmallTask) -> bool {
        let renamed = match rename(&task.0) {
            Ok(r) => r,
            Err(_) => return true, // alphabet overflow is out of scope for this small family
        };
        let original = &task.0;

        renamed.variables.len() == original.variables.len()
            && renamed
                .variables
                .iter()
                .zip(&original.variables)
                .all(|(a, b)| a.domain_size() == b.domain_size() && a.axiom_layer == b.axiom_layer)
            && renamed.operators.len() == original.operators.len()
            && renamed
                .operators
                .iter()
                .zip(&original.operators)
                .all(|(a, b)| a.effects == b.effects && a.prevail == b.prevail && a.cost == b.cost)
            && renamed.goal == original.goal
            && renamed.mutex_groups == original.mutex_groups
            && renamed.axioms == original.axioms
            && renamed.use_action_costs == original.use_action_costs
    }
}

#[test]
fn rename_only_touches_names() {
    fn check(task: SmallTask) {
        let renamed = rename(&task.0).unwrap();
        for variable in &renamed.variables {
            for name in &variable.value_names {
                assert_eq!(name.len(), 2, "expected a single letter plus a digit, got {name}");
            }
        }
        for operator in &renamed.operators {
            assert!(operator.name.starts_with('(') && operator.name.ends_with(')'));
        }
    }

    let mut gen = Gen::new(8);
    for _ in 0..20 {
        check(SmallTask::arbitrary(&mut gen));
    }
}
