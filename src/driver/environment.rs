//! The execution environment abstraction: something that can run a batch of
//! evaluator subprocesses and report completion events, without the driver
//! caring whether that happens one at a time or in a thread pool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::driver::status::CandidateStatus;
use crate::errors::Result;
use crate::state::StateEnvelope;

/// One candidate submitted as part of a batch.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub successor_id: usize,
    pub state: StateEnvelope,
}

/// A single candidate's terminal outcome, as reported by the environment.
#[derive(Debug, Clone)]
pub struct CompletionEvent {
    pub successor_id: usize,
    pub status: CandidateStatus,
    pub run_dir: PathBuf,
    pub error_msg: Option<String>,
}

/// Dispatches evaluator subprocesses for a batch and reports completions.
///
/// `run` blocks the calling thread until every request in `batch` has
/// reached a terminal status (including any that were canceled via
/// `on_completed`'s return value); the only suspension point inside an
/// implementation should be "await the next completion event".
pub trait ExecutionEnvironment: Send + Sync {
    /// The environment's own concurrency cap; the driver never submits more
    /// than this many requests in one batch.
    fn batch_size(&self) -> usize;

    /// Run one batch to completion.
    ///
    /// `on_completed` is invoked once per completion event (in the order the
    /// environment observes them, not necessarily `successor_id` order) and
    /// returns the set of `successor_id`s the environment should now cancel.
    /// Cancellation is best-effort and idempotent; a canceled request that
    /// later produces its own event is reported as `CandidateStatus::Canceled`.
    fn run(
        &self,
        evaluator_path: &Path,
        batch: &[EvaluationRequest],
        wall_clock_limit: Option<Duration>,
        on_completed: &mut dyn FnMut(&CompletionEvent) -> Vec<usize>,
    ) -> Result<()>;
}
