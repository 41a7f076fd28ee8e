//! Line-oriented reader/writer for the grounded-task format (§6).
//!
//! The reader is strictly single-pass: it consumes lines through `next()`
//! only and never looks ahead, matching the reference reader's use of a
//! plain line generator. Every delimiter mismatch or malformed integer
//! produces a [`MachetliError::ParseError`] carrying the 1-indexed line
//! number, what was expected, and what was actually found; the reader never
//! panics or attempts resynchronization.

use std::fmt::Write as _;
use std::io::Write;

use crate::errors::{MachetliError, Result};
use crate::task::model::{Axiom, Effect, GroundedTask, MutexGroup, Operator, Variable};

/// A single-pass, line-numbered cursor over the input text.
struct Lines<'a> {
    inner: std::str::Lines<'a>,
    line_no: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Lines {
            inner: text.lines(),
            line_no: 0,
        }
    }

    fn next_line(&mut self, expected: &str) -> Result<&'a str> {
        self.line_no += 1;
        self.inner.next().ok_or_else(|| MachetliError::ParseError {
            line: self.line_no,
            expected: expected.to_string(),
            found: "<end of input>".to_string(),
        })
    }

    fn expect_line(&mut self, literal: &str) -> Result<()> {
        let line = self.next_line(literal)?;
        if line != literal {
            return Err(MachetliError::ParseError {
                line: self.line_no,
                expected: literal.to_string(),
                found: line.to_string(),
            });
        }
        Ok(())
    }

    fn next_int(&mut self, expected: &str) -> Result<i64> {
        let line = self.next_line(expected)?;
        line.trim().parse::<i64>().map_err(|_| MachetliError::ParseError {
            line: self.line_no,
            expected: expected.to_string(),
            found: line.to_string(),
        })
    }

    fn next_usize(&mut self, expected: &str) -> Result<usize> {
        let value = self.next_int(expected)?;
        usize::try_from(value).map_err(|_| MachetliError::ParseError {
            line: self.line_no,
            expected: expected.to_string(),
            found: value.to_string(),
        })
    }

    fn next_ints(&mut self, expected: &str) -> Result<Vec<i64>> {
        let line = self.next_line(expected)?;
        line.split_whitespace()
            .map(|tok| {
                tok.parse::<i64>().map_err(|_| MachetliError::ParseError {
                    line: self.line_no,
                    expected: expected.to_string(),
                    found: line.to_string(),
                })
            })
            .collect()
    }

    fn next_pair(&mut self, expected: &str) -> Result<(usize, i32)> {
        let ints = self.next_ints(expected)?;
        if ints.len() != 2 {
            return Err(MachetliError::ParseError {
                line: self.line_no,
                expected: expected.to_string(),
                found: format!("{} tokens", ints.len()),
            });
        }
        Ok((ints[0] as usize, ints[1] as i32))
    }
}

/// Parse the grounded-task text format into a validated [`GroundedTask`].
pub fn read_task(text: &str) -> Result<GroundedTask> {
    let mut lines = Lines::new(text);

    lines.expect_line("begin_metric")?;
    let metric_raw = lines.next_int("metric flag (0 or 1)")?;
    let use_action_costs = metric_raw != 0;
    lines.expect_line("end_metric")?;

    let num_vars = lines.next_usize("number of variables")?;
    let variables = read_variables(&mut lines, num_vars)?;

    let num_mutexes = lines.next_usize("number of mutex groups")?;
    let mutex_groups = read_mutex_groups(&mut lines, num_mutexes)?;

    let init = read_init(&mut lines, num_vars)?;
    let goal = read_goal(&mut lines)?;

    let num_operators = lines.next_usize("number of operators")?;
    let operators = read_operators(&mut lines, num_operators)?;

    let num_axioms = lines.next_usize("number of axioms")?;
    let axioms = read_axioms(&mut lines, num_axioms)?;

    GroundedTask::new(
        variables,
        mutex_groups,
        init,
        goal,
        operators,
        axioms,
        use_action_costs,
    )
}

fn read_variables(lines: &mut Lines, num_vars: usize) -> Result<Vec<Variable>> {
    let mut variables = Vec::with_capacity(num_vars);
    for _ in 0..num_vars {
        lines.expect_line("begin_variable")?;
        lines.next_line("variable name")?; // discarded: pure comment in the format
        let axiom_layer = lines.next_int("axiom layer")? as i32;
        let domain_size = lines.next_usize("domain size")?;
        let mut value_names = Vec::with_capacity(domain_size);
        for _ in 0..domain_size {
            value_names.push(lines.next_line("value name")?.to_string());
        }
        lines.expect_line("end_variable")?;
        variables.push(Variable {
            axiom_layer,
            value_names,
        });
    }
    Ok(variables)
}

fn read_mutex_groups(lines: &mut Lines, num_mutexes: usize) -> Result<Vec<MutexGroup>> {
    let mut groups = Vec::with_capacity(num_mutexes);
    for _ in 0..num_mutexes {
        lines.expect_line("begin_mutex_group")?;
        let num_facts = lines.next_usize("number of facts")?;
        let mut facts = Vec::with_capacity(num_facts);
        for _ in 0..num_facts {
            facts.push(lines.next_pair("variable value")?);
        }
        lines.expect_line("end_mutex_group")?;
        groups.push(MutexGroup { facts });
    }
    Ok(groups)
}

fn read_init(lines: &mut Lines, num_vars: usize) -> Result<Vec<i32>> {
    lines.expect_line("begin_state")?;
    let mut init = Vec::with_capacity(num_vars);
    for _ in 0..num_vars {
        init.push(lines.next_int("initial value")? as i32);
    }
    lines.expect_line("end_state")?;
    Ok(init)
}

fn read_goal(lines: &mut Lines) -> Result<Vec<(usize, i32)>> {
    lines.expect_line("begin_goal")?;
    let num_pairs = lines.next_usize("number of goal pairs")?;
    let mut pairs = Vec::with_capacity(num_pairs);
    for _ in 0..num_pairs {
        pairs.push(lines.next_pair("variable value")?);
    }
    lines.expect_line("end_goal")?;
    Ok(pairs)
}

fn read_operators(lines: &mut Lines, num_operators: usize) -> Result<Vec<Operator>> {
    let mut operators = Vec::with_capacity(num_operators);
    for _ in 0..num_operators {
        lines.expect_line("begin_operator")?;
        let name = format!("({})", lines.next_line("operator name")?);
        let num_prevail = lines.next_usize("number of prevail conditions")?;
        let mut prevail = Vec::with_capacity(num_prevail);
        for _ in 0..num_prevail {
            prevail.push(lines.next_pair("variable value")?);
        }
        let num_effects = lines.next_usize("number of effects")?;
        let mut effects = Vec::with_capacity(num_effects);
        for _ in 0..num_effects {
            let ints = lines.next_ints("effect")?;
            if ints.len() < 4 {
                return Err(MachetliError::ParseError {
                    line: lines.line_no,
                    expected: "effect line".to_string(),
                    found: format!("{} tokens", ints.len()),
                });
            }
            let num_cond = ints[0] as usize;
            let expected_len = 1 + 2 * num_cond + 3;
            if ints.len() != expected_len {
                return Err(MachetliError::ParseError {
                    line: lines.line_no,
                    expected: format!("{expected_len} tokens"),
                    found: format!("{} tokens", ints.len()),
                });
            }
            let mut condition = Vec::with_capacity(num_cond);
            for c in 0..num_cond {
                let var = ints[1 + 2 * c] as usize;
                let val = ints[2 + 2 * c] as i32;
                condition.push((var, val));
            }
            let tail = &ints[1 + 2 * num_cond..];
            effects.push(Effect {
                var: tail[0] as usize,
                pre: tail[1] as i32,
                post: tail[2] as i32,
                condition,
            });
        }
        let cost = lines.next_int("operator cost")? as i32;
        lines.expect_line("end_operator")?;
        operators.push(Operator {
            name,
            prevail,
            effects,
            cost,
        });
    }
    Ok(operators)
}

fn read_axioms(lines: &mut Lines, num_axioms: usize) -> Result<Vec<Axiom>> {
    let mut axioms = Vec::with_capacity(num_axioms);
    for _ in 0..num_axioms {
        lines.expect_line("begin_rule")?;
        let length_body = lines.next_usize("axiom body length")?;
        let mut body = Vec::with_capacity(length_body);
        for _ in 0..length_body {
            body.push(lines.next_pair("variable value")?);
        }
        let ints = lines.next_ints("axiom effect")?;
        if ints.len() != 3 {
            return Err(MachetliError::ParseError {
                line: lines.line_no,
                expected: "3 tokens (var old_val new_val)".to_string(),
                found: format!("{} tokens", ints.len()),
            });
        }
        let (var, old_val, new_val) = (ints[0] as usize, ints[1], ints[2]);
        if 1 - new_val != old_val {
            return Err(MachetliError::ParseError {
                line: lines.line_no,
                expected: format!("old value {}", 1 - new_val),
                found: old_val.to_string(),
            });
        }
        lines.expect_line("end_rule")?;
        axioms.push(Axiom {
            body,
            head: (var, new_val as i32),
        });
    }
    Ok(axioms)
}

/// Serialize a [`GroundedTask`] to the grounded-task text format.
///
/// Deterministic given `task`: the same task always produces the same bytes.
pub fn write_task(task: &GroundedTask) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "begin_metric").unwrap();
    writeln!(out, "{}", if task.use_action_costs { 1 } else { 0 }).unwrap();
    writeln!(out, "end_metric").unwrap();

    writeln!(out, "{}", task.variables.len()).unwrap();
    for (i, variable) in task.variables.iter().enumerate() {
        writeln!(out, "begin_variable").unwrap();
        writeln!(out, "var{i}").unwrap();
        writeln!(out, "{}", variable.axiom_layer).unwrap();
        writeln!(out, "{}", variable.domain_size()).unwrap();
        for value_name in &variable.value_names {
            writeln!(out, "{value_name}").unwrap();
        }
        writeln!(out, "end_variable").unwrap();
    }

    writeln!(out, "{}", task.mutex_groups.len()).unwrap();
    for group in &task.mutex_groups {
        writeln!(out, "begin_mutex_group").unwrap();
        writeln!(out, "{}", group.facts.len()).unwrap();
        for &(var, val) in &group.facts {
            writeln!(out, "{var} {val}").unwrap();
        }
        writeln!(out, "end_mutex_group").unwrap();
    }

    writeln!(out, "begin_state").unwrap();
    for &val in &task.init {
        writeln!(out, "{val}").unwrap();
    }
    writeln!(out, "end_state").unwrap();

    writeln!(out, "begin_goal").unwrap();
    writeln!(out, "{}", task.goal.len()).unwrap();
    for &(var, val) in &task.goal {
        writeln!(out, "{var} {val}").unwrap();
    }
    writeln!(out, "end_goal").unwrap();

    writeln!(out, "{}", task.operators.len()).unwrap();
    for op in &task.operators {
        writeln!(out, "begin_operator").unwrap();
        let inner_name = op
            .name
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(&op.name);
        writeln!(out, "{inner_name}").unwrap();
        writeln!(out, "{}", op.prevail.len()).unwrap();
        for &(var, val) in &op.prevail {
            writeln!(out, "{var} {val}").unwrap();
        }
        writeln!(out, "{}", op.effects.len()).unwrap();
        for effect in &op.effects {
            let mut line = String::new();
            write!(line, "{}", effect.condition.len()).unwrap();
            for &(cvar, cval) in &effect.condition {
                write!(line, " {cvar} {cval}").unwrap();
            }
            write!(line, " {} {} {}", effect.var, effect.pre, effect.post).unwrap();
            writeln!(out, "{line}").unwrap();
        }
        writeln!(out, "{}", op.cost).unwrap();
        writeln!(out, "end_operator").unwrap();
    }

    writeln!(out, "{}", task.axioms.len()).unwrap();
    for axiom in &task.axioms {
        writeln!(out, "begin_rule").unwrap();
        writeln!(out, "{}", axiom.body.len()).unwrap();
        for &(var, val) in &axiom.body {
            writeln!(out, "{var} {val}").unwrap();
        }
        let (var, new_val) = axiom.head;
        writeln!(out, "{var} {} {new_val}", 1 - new_val).unwrap();
        writeln!(out, "end_rule").unwrap();
    }

    Ok(out)
}

/// Write a task directly to any [`Write`] sink (e.g. a temp file), avoiding
/// an intermediate `String` allocation for large tasks.
pub fn write_task_to<W: Write>(task: &GroundedTask, sink: &mut W) -> Result<()> {
    let text = write_task(task)?;
    sink.write_all(text.as_bytes())?;
    Ok(())
}
