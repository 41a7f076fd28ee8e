//! The rename transformation: replaces every variable value name and every
//! operator name with an opaque, positionally-derived label, so a minimized
//! task can be shared without leaking whatever identifiers the original
//! generator produced.
//!
//! Value names become `"<LETTER><var_index>"`, cycling the uppercase
//! alphabet by variable index (`A0`, `B0`, ... `Z0`, `A1`, ...); operator
//! names become `"(<letter>)"`, cycling the lowercase alphabet by operator
//! index. Both cycles wrap at 26 entries; a task needing a 27th distinct
//! letter is rejected with [`MachetliError::TooLarge`] rather than silently
//! colliding two names.

use crate::errors::{MachetliError, Result};
use crate::task::model::GroundedTask;

const ALPHABET_LEN: usize = 26;

fn letter(index: usize, field: &str) -> Result<char> {
    if index >= ALPHABET_LEN {
        return Err(MachetliError::TooLarge {
            field: field.to_string(),
            index,
        });
    }
    Ok((b'a' + index as u8) as char)
}

/// Return a copy of `task` with every value name and operator name replaced
/// by an opaque positional label. Structure (variable/operator/effect
/// counts, facts, preconditions) is untouched; only the human-readable
/// labels change.
pub fn rename(task: &GroundedTask) -> Result<GroundedTask> {
    let mut renamed = task.clone();

    for (var_index, variable) in renamed.variables.iter_mut().enumerate() {
        for (value_index, value_name) in variable.value_names.iter_mut().enumerate() {
            let upper = letter(value_index, "value_names")?.to_ascii_uppercase();
            *value_name = format!("{upper}{var_index}");
        }
    }

    for (op_index, operator) in renamed.operators.iter_mut().enumerate() {
        let lower = letter(op_index, "operators")?;
        operator.name = format!("({lower})");
    }

    Ok(renamed)
}
