//! Startup checks module for comskipd
//!
//! Preflight validation run once before the scan loop starts:
//! - Every configured scan directory must exist and be listable
//! - The job pool must allow at least one runner
//! - The detect command template must split into a runnable argv

use crate::detect::{self, DetectError};
use comskipd_config::Config;
use std::fs;
use thiserror::Error;

/// Error types for startup checks
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("No scan directories configured")]
    NoScanDirs,

    #[error("No video extensions configured")]
    NoVideoExtensions,

    #[error("Scan directory not usable: {0}")]
    ScanDirUnusable(String),

    #[error("max_runners must be at least 1")]
    NoRunners,

    #[error("Detect command not usable: {0}")]
    DetectCommand(#[from] DetectError),
}

/// Verify every configured scan directory exists and can be listed.
///
/// An unusable directory is a configuration error, not a transient
/// condition, so it aborts startup rather than being skipped.
pub fn check_scan_dirs(cfg: &Config) -> Result<(), StartupError> {
    if cfg.scan.dirs.is_empty() {
        return Err(StartupError::NoScanDirs);
    }

    for dir in &cfg.scan.dirs {
        if !dir.is_dir() {
            return Err(StartupError::ScanDirUnusable(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        fs::read_dir(dir).map_err(|e| {
            StartupError::ScanDirUnusable(format!("{}: {}", dir.display(), e))
        })?;
    }

    Ok(())
}

/// Verify the job-pool settings are usable.
pub fn check_job_settings(cfg: &Config) -> Result<(), StartupError> {
    if cfg.jobs.max_runners == 0 {
        return Err(StartupError::NoRunners);
    }

    detect::split_template(&cfg.jobs.detect_command)?;

    Ok(())
}

/// Run all startup checks in order: scan dirs, extensions, job settings.
pub fn run_startup_checks(cfg: &Config) -> Result<(), StartupError> {
    check_scan_dirs(cfg)?;

    if cfg.scan.video_extensions.is_empty() {
        return Err(StartupError::NoVideoExtensions);
    }

    check_job_settings(cfg)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use comskipd_config::Config;
    use tempfile::TempDir;

    fn config_with_dir(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.scan.dirs = vec![dir.path().to_path_buf()];
        config
    }

    #[test]
    fn test_checks_pass_for_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with_dir(&temp_dir);

        assert!(run_startup_checks(&config).is_ok());
    }

    #[test]
    fn test_missing_scan_dir_fails() {
        let mut config = Config::default();
        config.scan.dirs = vec!["/nonexistent/path/that/does/not/exist".into()];

        assert!(matches!(
            run_startup_checks(&config),
            Err(StartupError::ScanDirUnusable(_))
        ));
    }

    #[test]
    fn test_empty_scan_dirs_fails() {
        let mut config = Config::default();
        config.scan.dirs = vec![];

        assert!(matches!(
            run_startup_checks(&config),
            Err(StartupError::NoScanDirs)
        ));
    }

    #[test]
    fn test_empty_extensions_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_with_dir(&temp_dir);
        config.scan.video_extensions = vec![];

        assert!(matches!(
            run_startup_checks(&config),
            Err(StartupError::NoVideoExtensions)
        ));
    }

    #[test]
    fn test_zero_runners_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_with_dir(&temp_dir);
        config.jobs.max_runners = 0;

        assert!(matches!(
            run_startup_checks(&config),
            Err(StartupError::NoRunners)
        ));
    }

    #[test]
    fn test_empty_detect_command_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_with_dir(&temp_dir);
        config.jobs.detect_command = String::new();

        assert!(matches!(
            run_startup_checks(&config),
            Err(StartupError::DetectCommand(_))
        ));
    }

    #[test]
    fn test_scan_dir_pointing_at_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("not-a-dir");
        std::fs::write(&file_path, b"").unwrap();

        let mut config = Config::default();
        config.scan.dirs = vec![file_path];

        assert!(matches!(
            run_startup_checks(&config),
            Err(StartupError::ScanDirUnusable(_))
        ));
    }
}
