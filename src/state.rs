//! The state envelope: a candidate is either a grounded task or a lifted
//! (PDDL domain + problem) task. Lifted parsing itself is out of scope here
//! (it lives with an external collaborator); this crate only needs to carry
//! lifted task text opaquely between the driver and the evaluator shim.

use serde::{Deserialize, Serialize};

use crate::task::GroundedTask;

/// The text of a PDDL domain and problem pair, carried opaquely. Nothing in
/// this crate parses or interprets the contents; `domain_filename` records
/// the filename for the evaluator shim's domain-discovery step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiftedTask {
    pub domain_filename: String,
    pub domain_text: String,
    pub problem_text: String,
}

/// A candidate planning-task state: either representation may be minimized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateEnvelope {
    Grounded(GroundedTask),
    Lifted(LiftedTask),
}

impl StateEnvelope {
    pub fn as_grounded(&self) -> Option<&GroundedTask> {
        match self {
            StateEnvelope::Grounded(task) => Some(task),
            StateEnvelope::Lifted(_) => None,
        }
    }

    pub fn as_lifted(&self) -> Option<&LiftedTask> {
        match self {
            StateEnvelope::Grounded(_) => None,
            StateEnvelope::Lifted(task) => Some(task),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Effect, Operator, Variable};

    fn grounded_task() -> GroundedTask {
        GroundedTask::new(
            vec![Variable {
                axiom_layer: -1,
                value_names: vec!["a".into(), "b".into()],
            }],
            vec![],
            vec![0],
            vec![(0, 1)],
            vec![Operator {
                name: "(op)".into(),
                prevail: vec![],
                effects: vec![Effect {
                    var: 0,
                    pre: 0,
                    post: 1,
                    condition: vec![],
                }],
                cost: 1,
            }],
            vec![],
            false,
        )
        .unwrap()
    }

    #[test]
    fn grounded_variant_round_trips_accessors() {
        let envelope = StateEnvelope::Grounded(grounded_task());
        assert!(envelope.as_grounded().is_some());
        assert!(envelope.as_lifted().is_none());
    }

    #[test]
    fn lifted_variant_round_trips_accessors() {
        let envelope = StateEnvelope::Lifted(LiftedTask {
            domain_filename: "domain.pddl".into(),
            domain_text: "(define (domain d))".into(),
            problem_text: "(define (problem p))".into(),
        });
        assert!(envelope.as_lifted().is_some());
        assert!(envelope.as_grounded().is_none());
    }
}
