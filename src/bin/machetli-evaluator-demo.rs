//! A minimal evaluator binary: the behavior under test is "the grounded
//! task has at least one operator". Exercises the shim end to end against
//! real execution environments — see `tests/end_to_end.rs`.

use machetli_core::shim::{self, Evaluator, ShimInput, TaskArtifact};
use machetli_core::task;

struct HasOperator;

impl Evaluator for HasOperator {
    fn evaluate(&self, artifact: &TaskArtifact) -> machetli_core::errors::Result<bool> {
        match artifact {
            TaskArtifact::Grounded(path) => {
                let text = std::fs::read_to_string(path)?;
                let grounded_task = task::read_task(&text)?;
                Ok(!grounded_task.operators.is_empty())
            }
            TaskArtifact::Lifted { .. } => Ok(false),
        }
    }
}

fn main() {
    machetli_core::config::init_tracing(machetli_core::config::LogLevel::Warning);

    let path = std::env::args()
        .nth(1)
        .expect("usage: machetli-evaluator-demo <state-blob-path>");
    let code = shim::run(ShimInput::StateBlob(path.into()), &HasOperator);
    std::process::exit(code);
}
