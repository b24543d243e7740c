//! CLI entry point for comskipd
//!
//! Parses command line arguments, sets up logging, optionally detaches into
//! the background, and starts the scan loop.

use clap::Parser;
use comskipd::{logging, Config, Daemon, RunOptions};
use log::LevelFilter;
use std::path::PathBuf;
use std::process::ExitCode;

/// comskipd - commercial detection daemon for recorded video
#[derive(Parser, Debug)]
#[command(name = "comskipd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "/etc/comskipd.toml")]
    config: PathBuf,

    /// Run in the foreground and log to stdout at debug level
    #[arg(short, long)]
    debug: bool,

    /// Suppress logging entirely
    #[arg(short, long)]
    quiet: bool,

    /// Log intended actions without spawning jobs, deleting files, or
    /// writing the log file; implies foreground console output
    #[arg(short = 'n', long)]
    dry_run: bool,
}

impl Args {
    /// Foreground modes never detach and never log to the file.
    fn foreground(&self) -> bool {
        self.debug || self.dry_run
    }
}

fn init_logging(args: &Args, config: &Config) -> Result<(), logging::LoggingError> {
    if args.quiet {
        logging::init_quiet();
        return Ok(());
    }

    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    if args.foreground() {
        logging::init_console(level)
    } else {
        logging::init_file(&config.log_path(), level)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", args.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&args, &config) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let opts = RunOptions {
        dry_run: args.dry_run,
        debug: args.debug,
    };

    // Startup checks run before detaching so configuration errors reach the
    // invoking terminal.
    let mut daemon = match Daemon::new(config, opts) {
        Ok(daemon) => daemon,
        Err(e) => {
            eprintln!("Failed to initialize daemon: {}", e);
            return ExitCode::FAILURE;
        }
    };

    #[cfg(unix)]
    if !args.foreground() {
        if let Err(e) = daemonize::Daemonize::new().start() {
            eprintln!("Failed to daemonize: {}", e);
            return ExitCode::FAILURE;
        }
    }

    // The runtime is built only after the fork: worker threads do not
    // survive daemonization.
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(daemon.run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Daemon error: {}", e);
            ExitCode::FAILURE
        }
    }
}
