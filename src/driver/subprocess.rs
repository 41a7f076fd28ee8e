//! Shared subprocess plumbing used by both execution environments: writing a
//! candidate's state blob to a scoped run directory, spawning the evaluator,
//! waiting for it (with an optional wall-clock budget), and mapping its exit
//! status to a [`CandidateStatus`].

use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::blob;
use crate::driver::status::CandidateStatus;
use crate::errors::Result;
use crate::state::StateEnvelope;

const IMPROVING_CODE: i32 = 30;
const NOT_IMPROVING_CODE: i32 = 31;
const CRITICAL_CODE: i32 = 32;
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// RAII guard for a candidate's scratch directory: the directory and
/// everything inside it is unlinked when the guard drops, on every exit
/// path except the process itself being killed by the OS.
pub struct RunDir {
    dir: tempfile::TempDir,
}

impl RunDir {
    /// Create a fresh scratch directory, named with a v4 UUID so concurrent
    /// candidates in `ParallelEnvironment` never collide on disk.
    pub fn new() -> Result<Self> {
        let prefix = format!("machetli-{}-", uuid::Uuid::new_v4());
        let dir = tempfile::Builder::new().prefix(&prefix).tempdir()?;
        Ok(RunDir { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_file(&self) -> PathBuf {
        self.dir.path().join("state.blob")
    }
}

fn map_exit_status(exit_code: Option<i32>, signal: Option<i32>) -> CandidateStatus {
    if let Some(sig) = signal {
        warn!(signal = sig, "evaluator terminated by signal");
        return CandidateStatus::Critical;
    }
    match exit_code {
        Some(IMPROVING_CODE) => CandidateStatus::BehaviorPresent,
        Some(NOT_IMPROVING_CODE) => CandidateStatus::BehaviorNotPresent,
        Some(CRITICAL_CODE) => CandidateStatus::Critical,
        other => {
            warn!(exit_code = ?other, "evaluator exited with unrecognized code");
            CandidateStatus::Critical
        }
    }
}

/// Spawn the evaluator against `state`, wait for it to exit (or for
/// `wall_clock_limit`/`cancel_flag` to fire first), and return the resulting
/// status plus an optional explanatory message.
///
/// `cancel_flag` is polled alongside the wall-clock budget so an in-flight
/// evaluation can be aborted from another thread; killing is best-effort.
pub fn run_candidate(
    evaluator_path: &Path,
    state: &StateEnvelope,
    run_dir: &RunDir,
    wall_clock_limit: Option<Duration>,
    cancel_flag: &AtomicBool,
) -> Result<(CandidateStatus, Option<String>)> {
    let state_file = run_dir.state_file();
    let bytes = blob::encode(state)?;
    std::fs::write(&state_file, bytes)?;

    let mut command = Command::new(evaluator_path);
    command.arg(&state_file);
    command.process_group(0);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            return Ok((
                CandidateStatus::Critical,
                Some(format!("failed to spawn evaluator: {e}")),
            ))
        }
    };

    wait_with_budget(&mut child, wall_clock_limit, cancel_flag)
}

fn wait_with_budget(
    child: &mut Child,
    wall_clock_limit: Option<Duration>,
    cancel_flag: &AtomicBool,
) -> Result<(CandidateStatus, Option<String>)> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((
                map_exit_status(status.code(), status.signal()),
                None,
            ));
        }

        if cancel_flag.load(Ordering::Acquire) {
            kill_best_effort(child);
            let _ = child.wait();
            return Ok((CandidateStatus::Canceled, None));
        }

        if let Some(limit) = wall_clock_limit {
            if started.elapsed() >= limit {
                kill_best_effort(child);
                let _ = child.wait();
                return Ok((
                    CandidateStatus::OutOfResources,
                    Some(format!("exceeded wall-clock limit of {limit:?}")),
                ));
            }
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Kill a child's process group first (covers evaluators that fork further
/// children), falling back to killing just the child if that fails.
pub fn kill_best_effort(child: &mut Child) {
    let pid = child.id() as i32;
    // SAFETY: `kill` with a valid pid and no side effects beyond signal
    // delivery; failure (already-exited process) is ignored, matching the
    // best-effort cancellation contract.
    unsafe {
        libc::kill(-pid, libc::SIGTERM);
    }
    if child.kill().is_err() {
        unsafe {
            libc::kill(-pid, libc::SIGKILL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_exit_codes() {
        assert_eq!(map_exit_status(Some(30), None), CandidateStatus::BehaviorPresent);
        assert_eq!(map_exit_status(Some(31), None), CandidateStatus::BehaviorNotPresent);
        assert_eq!(map_exit_status(Some(32), None), CandidateStatus::Critical);
    }

    #[test]
    fn maps_unrecognized_code_and_signal_to_critical() {
        assert_eq!(map_exit_status(Some(1), None), CandidateStatus::Critical);
        assert_eq!(map_exit_status(None, Some(9)), CandidateStatus::Critical);
    }

    #[test]
    fn run_dir_is_removed_on_drop() {
        let path;
        {
            let run_dir = RunDir::new().unwrap();
            path = run_dir.path().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
