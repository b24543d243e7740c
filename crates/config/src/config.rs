//! Core configuration structures and loading logic

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file
    Io(std::io::Error),
    /// TOML parsing error
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Scanning-related configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    /// Directories scanned for video files each cycle
    #[serde(default = "default_scan_dirs")]
    pub dirs: Vec<PathBuf>,
    /// Recognized video file extensions, without the leading dot
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
    /// Seconds to sleep between scan cycles
    #[serde(default = "default_sleep_secs")]
    pub sleep_secs: u64,
    /// Minutes a directory's newest video must be untouched before jobs run
    #[serde(default = "default_idle_delay_mins")]
    pub idle_delay_mins: u64,
    /// Submit jobs even while a recording appears to be in progress
    #[serde(default)]
    pub run_while_recording: bool,
}

fn default_scan_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("/var/lib/recordings")]
}

fn default_video_extensions() -> Vec<String> {
    vec!["mpg".to_string(), "mpeg".to_string(), "ts".to_string()]
}

fn default_sleep_secs() -> u64 {
    60
}

fn default_idle_delay_mins() -> u64 {
    10
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            dirs: default_scan_dirs(),
            video_extensions: default_video_extensions(),
            sleep_secs: default_sleep_secs(),
            idle_delay_mins: default_idle_delay_mins(),
            run_while_recording: false,
        }
    }
}

/// Job-pool configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobsConfig {
    /// Maximum number of concurrent detection processes
    #[serde(default = "default_max_runners")]
    pub max_runners: u32,
    /// Command template the detector is launched with; the video path is
    /// appended as the final argument
    #[serde(default = "default_detect_command")]
    pub detect_command: String,
}

fn default_max_runners() -> u32 {
    2
}

fn default_detect_command() -> String {
    "comskip --quiet".to_string()
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_runners: default_max_runners(),
            detect_command: default_detect_command(),
        }
    }
}

/// Orphan-cleanup configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanupConfig {
    /// Delete side-car files whose video is gone (false = report only)
    #[serde(default = "default_delete_orphans")]
    pub delete_orphans: bool,
    /// Side-car suffixes eligible for orphan deletion, without the leading dot
    #[serde(default = "default_delete_suffixes")]
    pub delete_suffixes: Vec<String>,
}

fn default_delete_orphans() -> bool {
    true
}

fn default_delete_suffixes() -> Vec<String> {
    vec![
        "edl".to_string(),
        "log".to_string(),
        "logo.txt".to_string(),
        "txt".to_string(),
    ]
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            delete_orphans: default_delete_orphans(),
            delete_suffixes: default_delete_suffixes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Directory the log file lives in
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Log file name within `dir`
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/comskipd")
}

fn default_log_file() -> String {
    "comskipd.log".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Parses the config file and handles missing optional fields with defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Overrides the following values if environment variables are set:
    /// - COMSKIPD_SCAN_DIRS -> scan.dirs (PATH-style separated list)
    /// - COMSKIPD_SLEEP_SECS -> scan.sleep_secs
    /// - COMSKIPD_IDLE_DELAY_MINS -> scan.idle_delay_mins
    /// - COMSKIPD_RUN_WHILE_RECORDING -> scan.run_while_recording
    /// - COMSKIPD_MAX_RUNNERS -> jobs.max_runners
    /// - COMSKIPD_DETECT_COMMAND -> jobs.detect_command
    /// - COMSKIPD_DELETE_ORPHANS -> cleanup.delete_orphans
    pub fn apply_env_overrides(&mut self) {
        // COMSKIPD_SCAN_DIRS
        if let Ok(val) = env::var("COMSKIPD_SCAN_DIRS") {
            let dirs: Vec<PathBuf> = env::split_paths(&val).collect();
            if !dirs.is_empty() {
                self.scan.dirs = dirs;
            }
        }

        // COMSKIPD_SLEEP_SECS
        if let Ok(val) = env::var("COMSKIPD_SLEEP_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                self.scan.sleep_secs = secs;
            }
        }

        // COMSKIPD_IDLE_DELAY_MINS
        if let Ok(val) = env::var("COMSKIPD_IDLE_DELAY_MINS") {
            if let Ok(mins) = val.parse::<u64>() {
                self.scan.idle_delay_mins = mins;
            }
        }

        // COMSKIPD_RUN_WHILE_RECORDING
        if let Ok(val) = env::var("COMSKIPD_RUN_WHILE_RECORDING") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.scan.run_while_recording = true,
                "false" | "0" | "no" => self.scan.run_while_recording = false,
                _ => {} // Invalid value, keep existing
            }
        }

        // COMSKIPD_MAX_RUNNERS
        if let Ok(val) = env::var("COMSKIPD_MAX_RUNNERS") {
            if let Ok(runners) = val.parse::<u32>() {
                self.jobs.max_runners = runners;
            }
        }

        // COMSKIPD_DETECT_COMMAND
        if let Ok(val) = env::var("COMSKIPD_DETECT_COMMAND") {
            if !val.is_empty() {
                self.jobs.detect_command = val;
            }
        }

        // COMSKIPD_DELETE_ORPHANS
        if let Ok(val) = env::var("COMSKIPD_DELETE_ORPHANS") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.cleanup.delete_orphans = true,
                "false" | "0" | "no" => self.cleanup.delete_orphans = false,
                _ => {}
            }
        }
    }

    /// Load configuration from file and apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Pause between scan cycles
    pub fn sleep_time(&self) -> Duration {
        Duration::from_secs(self.scan.sleep_secs)
    }

    /// Minimum quiet window before a directory counts as idle
    pub fn idle_delay(&self) -> Duration {
        Duration::from_secs(self.scan.idle_delay_mins * 60)
    }

    /// Full path of the configured log file
    pub fn log_path(&self) -> PathBuf {
        self.log.dir.join(&self.log.file)
    }
}
