//! The evaluator driver: submits batches of candidates to an execution
//! environment, folds completion events into per-candidate status, and
//! applies a determinism policy to produce one verdict per batch.

pub mod environment;
pub mod local;
pub mod parallel;
pub mod policy;
pub mod status;
pub mod subprocess;

pub use environment::{CompletionEvent, EvaluationRequest, ExecutionEnvironment};
pub use local::LocalEnvironment;
pub use parallel::ParallelEnvironment;
pub use policy::{BatchVerdict, DeterminismPolicy};
pub use status::CandidateStatus;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::EnvironmentConfig;
use crate::errors::Result;
use crate::successor::Successor;

/// Everything the search engine needs out of a settled batch: the verdict
/// plus enough per-candidate bookkeeping to build the "no improving
/// successor" message when nothing was accepted.
#[derive(Debug)]
pub struct BatchOutcome {
    pub verdict: BatchVerdict,
    pub statuses: Vec<CandidateStatus>,
    pub run_dirs: Vec<PathBuf>,
    pub error_msgs: Vec<Option<String>>,
}

/// Ties an [`ExecutionEnvironment`] to a [`DeterminismPolicy`] and the path
/// of the evaluator subprocess to invoke.
pub struct EvaluatorDriver {
    environment: Box<dyn ExecutionEnvironment>,
    policy: DeterminismPolicy,
    evaluator_path: PathBuf,
    wall_clock_limit: Option<Duration>,
}

impl EvaluatorDriver {
    pub fn new(
        environment: Box<dyn ExecutionEnvironment>,
        config: &EnvironmentConfig,
        evaluator_path: impl Into<PathBuf>,
    ) -> Self {
        let policy = if config.deterministic {
            DeterminismPolicy::Sequential
        } else {
            DeterminismPolicy::Eager
        };
        EvaluatorDriver {
            environment,
            policy,
            evaluator_path: evaluator_path.into(),
            wall_clock_limit: config.wall_clock_limit,
        }
    }

    /// The environment's concurrency cap; callers should not hand this
    /// driver more than this many successors per batch.
    pub fn batch_size(&self) -> usize {
        self.environment.batch_size()
    }

    /// Submit one batch of successors and block until it settles.
    pub fn evaluate_batch(&self, successors: &[Successor]) -> Result<BatchOutcome> {
        let len = successors.len();
        let mut statuses: Vec<Option<CandidateStatus>> = vec![None; len];
        let mut run_dirs: Vec<PathBuf> = vec![PathBuf::new(); len];
        let mut error_msgs: Vec<Option<String>> = vec![None; len];
        let mut first_present: Option<usize> = None;

        let requests: Vec<EvaluationRequest> = successors
            .iter()
            .enumerate()
            .map(|(id, s)| EvaluationRequest {
                successor_id: id,
                state: s.state.clone(),
            })
            .collect();

        let policy = self.policy;
        {
            let mut on_completed = |event: &CompletionEvent| -> Vec<usize> {
                statuses[event.successor_id] = Some(event.status);
                run_dirs[event.successor_id] = event.run_dir.clone();
                error_msgs[event.successor_id] = event.error_msg.clone();
                if event.status.is_present() && first_present.is_none() {
                    first_present = Some(event.successor_id);
                }
                let known = |id: usize| statuses[id];
                policy.ids_to_cancel(event.successor_id, event.status, len, &known)
            };

            self.environment.run(
                &self.evaluator_path,
                &requests,
                self.wall_clock_limit,
                &mut on_completed,
            )?;
        }

        let final_statuses: Vec<CandidateStatus> = statuses
            .into_iter()
            .map(|s| s.expect("every submitted request reaches a terminal status"))
            .collect();
        let verdict = policy.resolve(&final_statuses, first_present);

        Ok(BatchOutcome {
            verdict,
            statuses: final_statuses,
            run_dirs,
            error_msgs,
        })
    }

    pub fn evaluator_path(&self) -> &Path {
        &self.evaluator_path
    }

    pub fn deterministic(&self) -> bool {
        matches!(self.policy, DeterminismPolicy::Sequential)
    }
}
