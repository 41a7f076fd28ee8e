//! In-memory representation of a grounded (SAS⁺) planning task, with the
//! structural invariants from the data model enforced at construction time.
//!
//! Variable names are intentionally absent from [`Variable`]: the format
//! carries one, but it is read-and-discarded by every known consumer (it is
//! a pure comment), so the model does not retain it. The codec regenerates
//! a canonical `var{index}` name on write — see [`crate::task::codec`].

use serde::{Deserialize, Serialize};

use crate::errors::{MachetliError, Result};

/// A single finite-domain variable: a domain size, an optional axiom layer,
/// and a value name per domain value (index 0..domain_size).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// -1 means "not derived".
    pub axiom_layer: i32,
    pub value_names: Vec<String>,
}

impl Variable {
    pub fn domain_size(&self) -> usize {
        self.value_names.len()
    }

    pub fn is_derived(&self) -> bool {
        self.axiom_layer >= 0
    }
}

/// A set of (variable, value) facts that are pairwise mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutexGroup {
    pub facts: Vec<(usize, i32)>,
}

/// A conditional effect: `pre == -1` means "any" (no precondition on `var`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub var: usize,
    pub pre: i32,
    pub post: i32,
    pub condition: Vec<(usize, i32)>,
}

/// A grounded operator: prevail conditions that must hold and aren't
/// changed, a list of effects, and a non-negative cost.
///
/// `name` is stored **with** its surrounding parentheses, matching the
/// reader, which wraps the raw line in parens on the way in; the writer
/// strips them back off on the way out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub name: String,
    pub prevail: Vec<(usize, i32)>,
    pub effects: Vec<Effect>,
    pub cost: i32,
}

/// An axiom: a body of (var, val) conditions and a head effect that toggles
/// a binary derived variable (`new_value = 1 - old_value`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axiom {
    pub body: Vec<(usize, i32)>,
    /// (variable, new value)
    pub head: (usize, i32),
}

/// The grounded planning task (T).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundedTask {
    pub variables: Vec<Variable>,
    pub mutex_groups: Vec<MutexGroup>,
    pub init: Vec<i32>,
    pub goal: Vec<(usize, i32)>,
    pub operators: Vec<Operator>,
    pub axioms: Vec<Axiom>,
    pub use_action_costs: bool,
}

impl GroundedTask {
    /// Construct a task from its parts, running full invariant validation.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        variables: Vec<Variable>,
        mutex_groups: Vec<MutexGroup>,
        init: Vec<i32>,
        goal: Vec<(usize, i32)>,
        operators: Vec<Operator>,
        axioms: Vec<Axiom>,
        use_action_costs: bool,
    ) -> Result<Self> {
        let task = GroundedTask {
            variables,
            mutex_groups,
            init,
            goal,
            operators,
            axioms,
            use_action_costs,
        };
        task.validate()?;
        Ok(task)
    }

    fn legal_var(&self, var: usize) -> Result<&Variable> {
        self.variables
            .get(var)
            .ok_or_else(|| MachetliError::ValidationError(format!("variable index {var} out of range")))
    }

    fn legal_fact(&self, var: usize, val: i32) -> Result<()> {
        let variable = self.legal_var(var)?;
        if val < 0 || val as usize >= variable.domain_size() {
            return Err(MachetliError::ValidationError(format!(
                "value {val} out of range for variable {var} (domain size {})",
                variable.domain_size()
            )));
        }
        Ok(())
    }

    /// Validate all structural invariants from the data model.
    pub fn validate(&self) -> Result<()> {
        if self.init.len() != self.variables.len() {
            return Err(MachetliError::ValidationError(format!(
                "init has {} values but there are {} variables",
                self.init.len(),
                self.variables.len()
            )));
        }
        for (var, &val) in self.init.iter().enumerate() {
            self.legal_fact(var, val)?;
        }

        if self.goal.is_empty() {
            return Err(MachetliError::ValidationError(
                "goal must be non-empty".to_string(),
            ));
        }
        for &(var, val) in &self.goal {
            self.legal_fact(var, val)?;
        }

        for group in &self.mutex_groups {
            for &(var, val) in &group.facts {
                self.legal_fact(var, val)?;
            }
        }

        for op in &self.operators {
            for &(var, val) in &op.prevail {
                self.legal_fact(var, val)?;
            }
            for effect in &op.effects {
                let variable = self.legal_var(effect.var)?;
                if effect.pre != -1
                    && (effect.pre < 0 || effect.pre as usize >= variable.domain_size())
                {
                    return Err(MachetliError::ValidationError(format!(
                        "effect precondition {} out of range for variable {} (domain size {})",
                        effect.pre,
                        effect.var,
                        variable.domain_size()
                    )));
                }
                if effect.post < 0 || effect.post as usize >= variable.domain_size() {
                    return Err(MachetliError::ValidationError(format!(
                        "effect postcondition {} out of range for variable {} (domain size {})",
                        effect.post,
                        effect.var,
                        variable.domain_size()
                    )));
                }
                for &(cvar, cval) in &effect.condition {
                    self.legal_fact(cvar, cval)?;
                }
            }
            if op.cost < 0 {
                return Err(MachetliError::ValidationError(format!(
                    "operator `{}` has negative cost {}",
                    op.name, op.cost
                )));
            }
        }

        for axiom in &self.axioms {
            for &(var, val) in &axiom.body {
                self.legal_fact(var, val)?;
            }
            let (head_var, head_val) = axiom.head;
            let variable = self.legal_var(head_var)?;
            if !variable.is_derived() || variable.domain_size() != 2 {
                return Err(MachetliError::ValidationError(format!(
                    "axiom head references variable {head_var}, which must be derived with domain size 2"
                )));
            }
            if head_val != 0 && head_val != 1 {
                return Err(MachetliError::ValidationError(format!(
                    "axiom head new value must be 0 or 1, found {head_val}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_task() -> GroundedTask {
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
            true,
        )
        .unwrap()
    }

    #[test]
    fn construct_valid_task_succeeds() {
        let task = minimal_task();
        assert_eq!(task.variables.len(), 1);
        assert_eq!(task.init, vec![0]);
    }

    #[test]
    fn empty_goal_is_rejected() {
        let err = GroundedTask::new(
            vec![Variable {
                axiom_layer: -1,
                value_names: vec!["a".into(), "b".into()],
            }],
            vec![],
            vec![0],
            vec![],
            vec![],
            vec![],
            false,
        )
        .unwrap_err();
        assert!(matches!(err, MachetliError::ValidationError(_)));
    }

    #[test]
    fn init_length_mismatch_is_rejected() {
        let err = GroundedTask::new(
            vec![Variable {
                axiom_layer: -1,
                value_names: vec!["a".into(), "b".into()],
            }],
            vec![],
            vec![0, 0],
            vec![(0, 1)],
            vec![],
            vec![],
            false,
        )
        .unwrap_err();
        assert!(matches!(err, MachetliError::ValidationError(_)));
    }

    #[test]
    fn out_of_range_fact_is_rejected() {
        let err = GroundedTask::new(
            vec![Variable {
                axiom_layer: -1,
                value_names: vec!["a".into(), "b".into()],
            }],
            vec![],
            vec![0],
            vec![(0, 5)],
            vec![],
            vec![],
            false,
        )
        .unwrap_err();
        assert!(matches!(err, MachetliError::ValidationError(_)));
    }

    #[test]
    fn axiom_head_on_non_derived_variable_is_rejected() {
        let err = GroundedTask::new(
            vec![Variable {
                axiom_layer: -1,
                value_names: vec!["a".into(), "b".into()],
            }],
            vec![],
            vec![0],
            vec![(0, 1)],
            vec![],
            vec![Axiom {
                body: vec![],
                head: (0, 1),
            }],
            false,
        )
        .unwrap_err();
        assert!(matches!(err, MachetliError::ValidationError(_)));
    }

    #[test]
    fn axiom_head_on_wrong_domain_size_is_rejected() {
        let err = GroundedTask::new(
            vec![Variable {
                axiom_layer: 0,
                value_names: vec!["a".into(), "b".into(), "c".into()],
            }],
            vec![],
            vec![0],
            vec![(0, 1)],
            vec![],
            vec![Axiom {
                body: vec![],
                head: (0, 1),
            }],
            false,
        )
        .unwrap_err();
        assert!(matches!(err, MachetliError::ValidationError(_)));
    }

    #[test]
    fn deep_copy_is_independent() {
        let task = minimal_task();
        let mut copy = task.clone();
        copy.init[0] = 1;
        assert_eq!(task.init[0], 0);
        assert_eq!(copy.init[0], 1);
    }
}
