//! Daemon driver: the perpetual scan loop and shutdown handling.
//!
//! Each cycle reaps finished jobs, then visits every configured directory in
//! order: read the listing once, reconcile orphaned side-cars, check the
//! activity gate, submit jobs for eligible videos. Concurrency comes from
//! the spawned detector processes alone; the loop itself never blocks on a
//! job, only on the inter-cycle sleep.

use crate::gate::{check_activity, ActivityResult};
use crate::pool::JobPool;
use crate::reconcile;
use crate::scan::{self, FileEntry};
use crate::startup::{run_startup_checks, StartupError};
use comskipd_config::Config;
use log::{debug, info, warn};
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;

/// Error type for daemon operations
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Startup check failed
    #[error("Startup check failed: {0}")]
    Startup(#[from] StartupError),
}

/// Runtime flags for a daemon instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Log intended actions; never spawn a job or delete a file.
    pub dry_run: bool,
    /// Foreground debugging: jobs still run, but orphan deletions are
    /// reported instead of performed.
    pub debug: bool,
}

/// Whether a cycle ran to completion or stopped early at pool capacity.
///
/// Reaching capacity ends the whole cycle: remaining files in the current
/// directory AND all later directories wait for the next pass. Directories
/// visited earlier have already been reconciled. This mirrors the original
/// daemon's behavior and is intentionally not "fixed" to re-scan after
/// capacity frees mid-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleFlow {
    Continue,
    AtCapacity,
}

/// Daemon state: configuration plus the job pool it drives.
pub struct Daemon {
    config: Config,
    pool: JobPool,
    opts: RunOptions,
}

impl Daemon {
    /// Initialize the daemon: run startup checks, then build the job pool.
    pub fn new(config: Config, opts: RunOptions) -> Result<Self, DaemonError> {
        run_startup_checks(&config)?;
        Ok(Self::new_unchecked(config, opts))
    }

    /// Build a daemon without running startup checks.
    ///
    /// Useful for testing with configurations pointing at fixtures.
    pub fn new_unchecked(config: Config, opts: RunOptions) -> Self {
        let pool = JobPool::new(config.jobs.max_runners, opts.dry_run);
        Self { config, pool, opts }
    }

    /// Number of jobs currently in flight.
    pub fn running_jobs(&self) -> usize {
        self.pool.len()
    }

    /// Run the scan loop until a termination signal arrives.
    ///
    /// On termination the signal is forwarded to every running job and the
    /// loop returns without waiting for them; the OS inherits the children.
    pub async fn run(&mut self) -> Result<(), DaemonError> {
        info!(
            "Watching {} directories (max {} runners, {}s cycle{})",
            self.config.scan.dirs.len(),
            self.config.jobs.max_runners,
            self.config.scan.sleep_secs,
            if self.opts.dry_run { ", dry run" } else { "" }
        );

        loop {
            self.run_cycle();

            tokio::select! {
                _ = tokio::time::sleep(self.config.sleep_time()) => {}
                _ = shutdown_signal() => {
                    info!(
                        "Termination requested, signalling {} running jobs",
                        self.pool.len()
                    );
                    self.pool.terminate_all();
                    return Ok(());
                }
            }
        }
    }

    /// One full pass: reap finished jobs, then visit each directory.
    pub fn run_cycle(&mut self) {
        self.pool.reap();

        let now = SystemTime::now();
        let dirs = self.config.scan.dirs.clone();

        for dir in &dirs {
            if self.process_directory(dir, now) == CycleFlow::AtCapacity {
                debug!("Job pool full; deferring remaining directories to the next cycle");
                break;
            }
        }
    }

    /// Reconcile, gate and submit for a single directory.
    fn process_directory(&mut self, dir: &Path, now: SystemTime) -> CycleFlow {
        let listing = match scan::read_listing(dir) {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Cannot read {}: {}", dir.display(), e);
                return CycleFlow::Continue;
            }
        };

        // Debug mode previews deletions too; only dry-run also holds jobs.
        reconcile::reconcile(
            &listing,
            &self.config.scan.video_extensions,
            &self.config.cleanup.delete_suffixes,
            self.config.cleanup.delete_orphans,
            self.opts.dry_run || self.opts.debug,
        );

        let activity = check_activity(
            &listing,
            &self.config.scan.video_extensions,
            now,
            self.config.idle_delay(),
            self.config.scan.run_while_recording,
        );
        if let ActivityResult::Busy { .. } = activity {
            debug!(
                "{} looks like an active recording target; holding submissions",
                dir.display()
            );
            return CycleFlow::Continue;
        }

        self.submit_eligible(&listing)
    }

    /// Submission pass over one listing, in listing order.
    fn submit_eligible(&mut self, listing: &[FileEntry]) -> CycleFlow {
        let extensions = &self.config.scan.video_extensions;

        for entry in listing {
            if !scan::is_video_file(&entry.file_name, extensions) {
                continue;
            }
            if entry.size_bytes == 0 {
                continue;
            }
            if scan::has_result_marker(&entry.path) {
                debug!("Already done: {}", entry.path.display());
                continue;
            }
            if self.pool.at_capacity() {
                return CycleFlow::AtCapacity;
            }
            if self.pool.contains(&entry.path) {
                continue;
            }

            if let Err(e) = self
                .pool
                .submit(&entry.path, &self.config.jobs.detect_command)
            {
                warn!("Cannot submit {}: {}", entry.path.display(), e);
            }
        }

        CycleFlow::Continue
    }
}

/// Resolves when the process receives a termination request.
///
/// SIGTERM or ctrl-c on unix, ctrl-c elsewhere. The signal only completes
/// this future; the scan loop itself performs the job terminations, so the
/// pool is never touched from two contexts at once.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("ctrl-c handler installation should not fail");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation should not fail")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
