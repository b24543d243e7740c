//! Fixed-capacity pool of external detection processes.
//!
//! Jobs are keyed by the video path they were launched against; the pool
//! owns each child handle exclusively. Completion is observed by polling:
//! `reap` try-waits every tracked child once per cycle and never blocks.
//!
//! Failure handling is retry-by-rescan: a failed job leaves no result file
//! behind, so the scanner resubmits the same path on a later cycle. There is
//! no backoff and no retry counter.

use crate::detect::{build_detect_command, render_detect_command, DetectError};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::time::Instant;
use thiserror::Error;

/// Error type for job pool operations
#[derive(Debug, Error)]
pub enum PoolError {
    /// The detect command template could not be turned into a command
    #[error(transparent)]
    Detect(#[from] DetectError),
}

/// Terminal result of a reaped job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Detector exited 0.
    Success,
    /// Detector exited nonzero.
    Failed {
        /// Exit code reported by the process.
        code: i32,
    },
    /// Detector was killed by a signal before exiting.
    Terminated,
}

impl JobOutcome {
    /// Whether the detector completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success)
    }
}

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A detector process was spawned and registered.
    Spawned,
    /// Dry-run mode: the command was logged, nothing was spawned.
    DryRun,
    /// The pool is full; the path is picked up on a later cycle.
    AtCapacity,
    /// A job for this exact path is already running.
    AlreadyRunning,
    /// The detector failed to start. Logged as a job failure with no pool
    /// entry; the path is retried by rescan like any other failure.
    SpawnFailed,
}

/// One in-flight detection process.
#[derive(Debug)]
struct RunningJob {
    child: Child,
    started: Instant,
}

/// Path-keyed pool of running detection processes.
#[derive(Debug)]
pub struct JobPool {
    max_runners: usize,
    dry_run: bool,
    jobs: HashMap<PathBuf, RunningJob>,
}

impl JobPool {
    /// Create a pool with the given concurrency ceiling.
    pub fn new(max_runners: u32, dry_run: bool) -> Self {
        Self {
            max_runners: max_runners as usize,
            dry_run,
            jobs: HashMap::new(),
        }
    }

    /// Number of jobs currently tracked.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no jobs are tracked.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Whether the concurrency ceiling is reached.
    pub fn at_capacity(&self) -> bool {
        self.jobs.len() >= self.max_runners
    }

    /// Whether a job is already tracked for this exact path.
    pub fn contains(&self, path: &Path) -> bool {
        self.jobs.contains_key(path)
    }

    /// Submits a new detection job for `path`.
    ///
    /// Capacity and per-path uniqueness are re-checked on every call, since
    /// submissions earlier in the same cycle consume capacity. In dry-run
    /// mode the rendered command is logged and nothing is registered.
    pub fn submit(&mut self, path: &Path, template: &str) -> Result<SubmitOutcome, PoolError> {
        if self.at_capacity() {
            return Ok(SubmitOutcome::AtCapacity);
        }

        if self.jobs.contains_key(path) {
            return Ok(SubmitOutcome::AlreadyRunning);
        }

        if self.dry_run {
            info!("Would run: {}", render_detect_command(template, path));
            return Ok(SubmitOutcome::DryRun);
        }

        let mut cmd = build_detect_command(template, path)?;

        match cmd.spawn() {
            Ok(child) => {
                info!(
                    "Started detection for {} (pid {})",
                    path.display(),
                    child.id()
                );
                self.jobs.insert(
                    path.to_path_buf(),
                    RunningJob {
                        child,
                        started: Instant::now(),
                    },
                );
                Ok(SubmitOutcome::Spawned)
            }
            Err(e) => {
                error!("Failed to start detection for {}: {}", path.display(), e);
                Ok(SubmitOutcome::SpawnFailed)
            }
        }
    }

    /// Polls every tracked job once and removes the finished ones.
    ///
    /// Never blocks: still-running children are left untouched. Safe to call
    /// every cycle before new submissions.
    pub fn reap(&mut self) -> Vec<(PathBuf, JobOutcome)> {
        let mut finished = Vec::new();

        for (path, job) in &mut self.jobs {
            match job.child.try_wait() {
                Ok(Some(status)) => {
                    let outcome = match status.code() {
                        Some(0) => JobOutcome::Success,
                        Some(code) => JobOutcome::Failed { code },
                        None => JobOutcome::Terminated,
                    };
                    finished.push((path.clone(), outcome));
                }
                Ok(None) => {
                    debug!(
                        "Detection still running for {} ({}s elapsed)",
                        path.display(),
                        job.started.elapsed().as_secs()
                    );
                }
                Err(e) => {
                    warn!("Failed to poll detection for {}: {}", path.display(), e);
                }
            }
        }

        for (path, outcome) in &finished {
            match outcome {
                JobOutcome::Success => info!("Finished {}", path.display()),
                JobOutcome::Failed { code } => {
                    info!("Failed {} (exit code {})", path.display(), code)
                }
                JobOutcome::Terminated => {
                    warn!("Detection for {} was killed by a signal", path.display())
                }
            }
            self.jobs.remove(path);
        }

        finished
    }

    /// Forwards a termination signal to every tracked process.
    ///
    /// Does not wait for exits, and does not signal descendants the detector
    /// may have spawned itself — a documented limitation. Callers are
    /// expected to exit shortly afterwards, leaving final cleanup to the OS.
    pub fn terminate_all(&mut self) {
        for (path, job) in &mut self.jobs {
            info!("Terminating detection for {}", path.display());
            if let Err(e) = terminate_child(&mut job.child) {
                warn!(
                    "Failed to terminate detection for {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }
}

/// Sends SIGTERM to the child so the detector can exit cleanly.
#[cfg(unix)]
fn terminate_child(child: &mut Child) -> std::io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM)
        .map_err(|e| std::io::Error::other(e.to_string()))
}

#[cfg(not(unix))]
fn terminate_child(child: &mut Child) -> std::io::Result<()> {
    child.kill()
}
