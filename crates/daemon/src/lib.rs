//! comskipd
//!
//! Background daemon that watches recording directories, launches a bounded
//! pool of external commercial-detection processes against new video files,
//! and reconciles orphaned side-car files.

pub mod daemon;
pub mod detect;
pub mod gate;
pub mod logging;
pub mod pool;
pub mod reconcile;
pub mod scan;
pub mod startup;

pub use comskipd_config as config;
pub use comskipd_config::Config;
pub use daemon::{Daemon, DaemonError, RunOptions};
pub use detect::{build_detect_command, render_detect_command, split_template, DetectError};
pub use gate::{check_activity, newest_video_mtime, ActivityResult};
pub use pool::{JobOutcome, JobPool, PoolError, SubmitOutcome};
pub use reconcile::{
    find_orphans, match_deletable_suffix, reconcile, ReconcileStats, SuffixMatch,
};
pub use scan::{
    has_result_marker, is_video_file, read_listing, result_marker_path, video_basename,
    FileEntry, RESULT_EXTENSION,
};
pub use startup::{
    check_job_settings, check_scan_dirs, run_startup_checks, StartupError,
};
