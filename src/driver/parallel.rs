//! A thread-pool-backed execution environment standing in for "a clustered
//! environment may run up to B in parallel", without an actual cluster
//! submission back-end.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use threadpool::ThreadPool;

use crate::driver::environment::{CompletionEvent, EvaluationRequest, ExecutionEnvironment};
use crate::driver::status::CandidateStatus;
use crate::driver::subprocess::{run_candidate, RunDir};
use crate::errors::{MachetliError, Result};

/// Runs up to `pool_size` evaluator subprocesses concurrently via a
/// `threadpool::ThreadPool`. `pool_size` is fixed at construction to
/// `min(batch_size, num_cpus::get())`, per the concurrency model.
pub struct ParallelEnvironment {
    pool_size: usize,
}

impl ParallelEnvironment {
    pub fn new(batch_size: usize) -> Self {
        let pool_size = batch_size.min(num_cpus::get()).max(1);
        ParallelEnvironment { pool_size }
    }
}

impl ExecutionEnvironment for ParallelEnvironment {
    fn batch_size(&self) -> usize {
        self.pool_size
    }

    fn run(
        &self,
        evaluator_path: &Path,
        batch: &[EvaluationRequest],
        wall_clock_limit: Option<Duration>,
        on_completed: &mut dyn FnMut(&CompletionEvent) -> Vec<usize>,
    ) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let pool = ThreadPool::new(self.pool_size);
        let (tx, rx) = mpsc::channel::<CompletionEvent>();
        let cancel_flags: Arc<DashMap<usize, Arc<AtomicBool>>> = Arc::new(DashMap::new());
        for request in batch {
            cancel_flags.insert(request.successor_id, Arc::new(AtomicBool::new(false)));
        }

        for request in batch.iter().cloned() {
            let tx = tx.clone();
            let evaluator_path = evaluator_path.to_path_buf();
            let cancel_flags = Arc::clone(&cancel_flags);
            pool.execute(move || {
                let cancel_flag = cancel_flags
                    .get(&request.successor_id)
                    .expect("registered before dispatch")
                    .clone();
                let event = run_one(&evaluator_path, &request, wall_clock_limit, &cancel_flag);
                let _ = tx.send(event);
            });
        }
        drop(tx);

        let mut remaining = batch.len();
        while remaining > 0 {
            let event = rx
                .recv()
                .map_err(|e| MachetliError::PollingError(e.to_string()))?;
            remaining -= 1;
            let to_cancel = on_completed(&event);
            for id in to_cancel {
                if let Some(flag) = cancel_flags.get(&id) {
                    flag.store(true, Ordering::Release);
                }
            }
        }

        Ok(())
    }
}

fn run_one(
    evaluator_path: &Path,
    request: &EvaluationRequest,
    wall_clock_limit: Option<Duration>,
    cancel_flag: &AtomicBool,
) -> CompletionEvent {
    if cancel_flag.load(Ordering::Acquire) {
        return CompletionEvent {
            successor_id: request.successor_id,
            status: CandidateStatus::Canceled,
            run_dir: std::env::temp_dir(),
            error_msg: None,
        };
    }

    let run_dir = match RunDir::new() {
        Ok(dir) => dir,
        Err(e) => {
            return CompletionEvent {
                successor_id: request.successor_id,
                status: CandidateStatus::Critical,
                run_dir: std::env::temp_dir(),
                error_msg: Some(format!("failed to create run directory: {e}")),
            }
        }
    };

    match run_candidate(evaluator_path, &request.state, &run_dir, wall_clock_limit, cancel_flag) {
        Ok((status, error_msg)) => CompletionEvent {
            successor_id: request.successor_id,
            status,
            run_dir: run_dir.path().to_path_buf(),
            error_msg,
        },
        Err(e) => CompletionEvent {
            successor_id: request.successor_id,
            status: CandidateStatus::Critical,
            run_dir: run_dir.path().to_path_buf(),
            error_msg: Some(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_size_is_capped_by_cpu_count() {
        let env = ParallelEnvironment::new(10_000);
        assert!(env.batch_size() <= num_cpus::get());
        assert!(env.batch_size() >= 1);
    }

    #[test]
    fn pool_size_shrinks_to_requested_batch_when_smaller() {
        let env = ParallelEnvironment::new(1);
        assert_eq!(env.batch_size(), 1);
    }
}
