//! The strictly sequential execution environment: one evaluator subprocess
//! at a time, in submission order, no worker threads at all.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tracing::debug;

use crate::driver::environment::{CompletionEvent, EvaluationRequest, ExecutionEnvironment};
use crate::driver::status::CandidateStatus;
use crate::driver::subprocess::{run_candidate, RunDir};
use crate::errors::Result;

/// Runs one child process at a time. Stands in for "a local environment
/// runs candidates one at a time in order" (§5).
#[derive(Debug, Default)]
pub struct LocalEnvironment;

impl LocalEnvironment {
    pub fn new() -> Self {
        LocalEnvironment
    }
}

impl ExecutionEnvironment for LocalEnvironment {
    fn batch_size(&self) -> usize {
        1
    }

    fn run(
        &self,
        evaluator_path: &Path,
        batch: &[EvaluationRequest],
        wall_clock_limit: Option<Duration>,
        on_completed: &mut dyn FnMut(&CompletionEvent) -> Vec<usize>,
    ) -> Result<()> {
        let mut canceled: HashSet<usize> = HashSet::new();
        let never_cancel = AtomicBool::new(false);

        for request in batch {
            let event = if canceled.contains(&request.successor_id) {
                debug!(successor_id = request.successor_id, "skipping canceled candidate");
                CompletionEvent {
                    successor_id: request.successor_id,
                    status: CandidateStatus::Canceled,
                    run_dir: std::env::temp_dir(),
                    error_msg: None,
                }
            } else {
                let run_dir = RunDir::new()?;
                let (status, error_msg) = run_candidate(
                    evaluator_path,
                    &request.state,
                    &run_dir,
                    wall_clock_limit,
                    &never_cancel,
                )?;
                CompletionEvent {
                    successor_id: request.successor_id,
                    status,
                    run_dir: run_dir.path().to_path_buf(),
                    error_msg,
                }
            };

            let more_cancellations = on_completed(&event);
            canceled.extend(more_cancellations);
        }

        Ok(())
    }
}
