//! The evaluator runtime shim: the library half of the subprocess entry
//! point the driver spawns once per candidate. A thin binary (outside this
//! crate's scope, per the CLI-argument-parsing non-goal) wires `std::env::args()`
//! and a concrete [`Evaluator`] to [`run`].

use std::io::Write as _;
use std::path::{Path, PathBuf};

use tracing::error;

use crate::blob;
use crate::driver::subprocess::RunDir;
use crate::errors::{MachetliError, Result};
use crate::state::StateEnvelope;
use crate::task::{self, GroundedTask};

pub const EXIT_IMPROVING: i32 = 30;
pub const EXIT_NOT_IMPROVING: i32 = 31;
pub const EXIT_CRITICAL: i32 = 32;

/// What the shim was actually handed on the command line.
pub enum ShimInput {
    /// A serialized, version-tagged state blob.
    StateBlob(PathBuf),
    /// A raw grounded-task file.
    GroundedFile(PathBuf),
    /// A raw lifted problem file, with an optional explicit domain file. If
    /// `domain` is `None`, the shim searches for one next to `problem`.
    LiftedFiles {
        domain: Option<PathBuf>,
        problem: PathBuf,
    },
}

/// A resolved, on-disk task artifact ready to hand to the user predicate.
pub enum TaskArtifact {
    Grounded(PathBuf),
    Lifted { domain: PathBuf, problem: PathBuf },
}

/// A user-supplied predicate: does this task exhibit the behavior under
/// investigation?
pub trait Evaluator {
    fn evaluate(&self, artifact: &TaskArtifact) -> Result<bool>;
}

impl<F> Evaluator for F
where
    F: Fn(&TaskArtifact) -> Result<bool>,
{
    fn evaluate(&self, artifact: &TaskArtifact) -> Result<bool> {
        self(artifact)
    }
}

/// Run the shim end to end: resolve `input` to on-disk artifacts, call
/// `evaluator`, and return the process exit code to use. Never panics on
/// malformed input; every failure path maps to [`EXIT_CRITICAL`].
pub fn run<E: Evaluator>(input: ShimInput, evaluator: &E) -> i32 {
    match run_inner(input, evaluator) {
        Ok(true) => EXIT_IMPROVING,
        Ok(false) => EXIT_NOT_IMPROVING,
        Err(e) => {
            error!(error = %e, "evaluator shim failed");
            EXIT_CRITICAL
        }
    }
}

fn run_inner<E: Evaluator>(input: ShimInput, evaluator: &E) -> Result<bool> {
    match input {
        ShimInput::StateBlob(path) => {
            let bytes = std::fs::read(&path)?;
            let state = blob::decode(&bytes)?;
            let run_dir = RunDir::new()?;
            let artifact = materialize(&state, &run_dir)?;
            evaluator.evaluate(&artifact)
        }
        ShimInput::GroundedFile(path) => evaluator.evaluate(&TaskArtifact::Grounded(path)),
        ShimInput::LiftedFiles { domain, problem } => {
            let domain = match domain {
                Some(domain) => domain,
                None => find_domain_file(&problem).ok_or_else(|| {
                    MachetliError::CriticalError(format!(
                        "no domain file found for lifted problem {}",
                        problem.display()
                    ))
                })?,
            };
            evaluator.evaluate(&TaskArtifact::Lifted { domain, problem })
        }
    }
}

fn materialize(state: &StateEnvelope, run_dir: &RunDir) -> Result<TaskArtifact> {
    match state {
        StateEnvelope::Grounded(grounded_task) => {
            let path = run_dir.path().join("task.sas");
            write_grounded_file(grounded_task, &path)?;
            Ok(TaskArtifact::Grounded(path))
        }
        StateEnvelope::Lifted(lifted_task) => {
            let domain_path = run_dir.path().join(&lifted_task.domain_filename);
            let problem_path = run_dir.path().join("problem.pddl");
            std::fs::write(&domain_path, &lifted_task.domain_text)?;
            std::fs::write(&problem_path, &lifted_task.problem_text)?;
            Ok(TaskArtifact::Lifted {
                domain: domain_path,
                problem: problem_path,
            })
        }
    }
}

fn write_grounded_file(grounded_task: &GroundedTask, path: &Path) -> Result<()> {
    let text = task::write_task(grounded_task)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// The fixed domain-discovery order for a lifted problem file `dir/base.ext`.
fn find_domain_file(problem: &Path) -> Option<PathBuf> {
    let dir = problem.parent().unwrap_or_else(|| Path::new("."));
    let stem = problem.file_stem()?.to_str()?;
    let ext = problem
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let first3: String = stem.chars().take(3).collect();

    let candidates = [
        dir.join("domain.pddl"),
        dir.join(format!("{stem}-domain{ext}")),
        dir.join(format!("{first3}-domain.pddl")),
        dir.join(format!("domain_{stem}{ext}")),
        dir.join(format!("domain-{stem}{ext}")),
    ];

    candidates.into_iter().find(|candidate| candidate.exists())
}
